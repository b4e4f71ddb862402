//! Recoverable validation failures.
//!
//! Every rule the wizard enforces on player input reports a [`RuleViolation`]
//! attached to a field path. Paths are dotted snake_case names that mirror the
//! serialized [`CharacterDocument`](crate::document::CharacterDocument), so a
//! frontend can put each message next to the field that caused it.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::attributes::Attribute;
use crate::catalog::{Craft, FoundationChange, Resistance, Skill, Spell, Talent};
use crate::origin::Origin;
use crate::specialization::Specialization;

/// Path used for violations that belong to the step as a whole.
pub const GLOBAL_PATH: &str = "_global";

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("is required")]
    Missing,

    #[error("must not be empty")]
    Empty,

    #[error("expected {expected}")]
    InvalidType { expected: &'static str },

    #[error("'{value}' is not a valid {kind}")]
    UnknownOption { kind: &'static str, value: String },

    #[error("{value} is outside the allowed range {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },

    #[error("{value} cannot be bought with points (allowed 8 to 15)")]
    InvalidPointBuyValue { value: u8 },

    #[error("point total is {total}, expected exactly {budget}")]
    PointBudgetMismatch { total: i32, budget: i32 },

    #[error("values must be a permutation of 15, 14, 13, 12, 10, 8")]
    NotFixedArray,

    #[error("roll the attributes before assigning rolled values")]
    NoRollToAssign,

    #[error("values must be a permutation of the last roll {rolled:?}")]
    NotRolledValues { rolled: [u8; 6] },

    #[error("{0} was already chosen as the first bonus attribute")]
    DuplicateBonusAttribute(Attribute),

    #[error("{attribute} cannot receive a bonus from this origin")]
    BonusAttributeNotAllowed { attribute: Attribute },

    #[error("this origin does not grant a bonus here")]
    UnexpectedBonusAttribute,

    #[error("{talent} is not available to the {origin} origin")]
    TalentNotAvailable { talent: Talent, origin: Origin },

    #[error("the {origin} origin does not grant a natural talent")]
    TalentNotGranted { origin: Origin },

    #[error("origin is already set to {chosen}; restart to choose another")]
    OriginLocked { chosen: Origin },

    #[error("details are for '{found}' but the selection is '{expected}'")]
    TagMismatch { expected: String, found: String },

    #[error("expected '{expected}' for this selection")]
    DerivedValueMismatch { expected: String },

    #[error("the {origin} origin only allows the {required} specialization")]
    SpecializationRequired {
        origin: Origin,
        required: Specialization,
    },

    #[error("{0} cannot be the key attribute of this specialization")]
    KeyAttributeNotAllowed(Attribute),

    #[error("{0} is not a resistance option of this specialization")]
    ResistanceNotAllowed(Resistance),

    #[error("{0} is not a combat skill option of this specialization")]
    CombatSkillNotAllowed(Skill),

    #[error("{0} was already chosen as a craft")]
    DuplicateCraft(Craft),

    #[error("exactly {expected} foundation changes are required, got {got}")]
    FoundationChangeCount { expected: usize, got: usize },

    #[error("{0} was chosen twice")]
    DuplicateFoundationChange(FoundationChange),

    #[error("exactly {expected} free skills are required, got {got}")]
    FreeSkillCount { expected: usize, got: usize },

    #[error("{0} was chosen more than once")]
    DuplicateFreeSkill(Skill),

    #[error("{0} is already granted by this specialization")]
    FreeSkillExcluded(Skill),

    #[error("{0} cannot be chosen as a free skill")]
    SkillNotSelectable(Skill),

    #[error("exactly two of weapon 1, weapon 2 and shield are required, got {got}")]
    EquipmentItemCount { got: usize },

    #[error("this specialization has no shield proficiency")]
    ShieldNotProficient,

    #[error("at most {cap} spells may be chosen, got {got}")]
    SpellLimitExceeded { cap: usize, got: usize },

    #[error("exactly {expected} spells are required, got {got}")]
    SpellCountMismatch { expected: usize, got: usize },

    #[error("{0} was chosen more than once")]
    DuplicateSpell(Spell),

    #[error("{attribute} is {value}; it must be at most {max} to be increased")]
    IncrementCeiling {
        attribute: Attribute,
        value: u8,
        max: u8,
    },

    #[error("requires the Attribute Increment talent")]
    IncrementNotGranted,

    #[error("not available for this origin")]
    NotAvailableForOrigin,

    #[error("exactly {expected} entries are required, got {got}")]
    EntryCount { expected: usize, got: usize },

    #[error("'{0}' was entered more than once")]
    DuplicateEntry(String),
}

/// Violations grouped by field path.
///
/// Ordered so that rendering and test assertions are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<RuleViolation>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a set holding one violation.
    pub fn single(path: impl Into<String>, violation: RuleViolation) -> Self {
        let mut errors = Self::new();
        errors.add(path, violation);
        errors
    }

    /// Record a violation. The same violation is never stored twice for a path.
    pub fn add(&mut self, path: impl Into<String>, violation: RuleViolation) {
        let entry = self.fields.entry(path.into()).or_default();
        if !entry.contains(&violation) {
            entry.push(violation);
        }
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (path, violations) in other.fields {
            for violation in violations {
                self.add(path.clone(), violation);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of distinct field paths with at least one violation.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, path: &str) -> &[RuleViolation] {
        self.fields.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleViolation])> {
        self.fields
            .iter()
            .map(|(path, violations)| (path.as_str(), violations.as_slice()))
    }

    /// Rendered messages per path, the shape a form layer displays.
    pub fn messages(&self) -> BTreeMap<String, Vec<String>> {
        self.fields
            .iter()
            .map(|(path, violations)| {
                (
                    path.clone(),
                    violations.iter().map(ToString::to_string).collect(),
                )
            })
            .collect()
    }

    /// The same errors with every path nested under `prefix`.
    pub fn prefixed(self, prefix: &str) -> FieldErrors {
        FieldErrors {
            fields: self
                .fields
                .into_iter()
                .map(|(path, violations)| (format!("{prefix}.{path}"), violations))
                .collect(),
        }
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, violations) in &self.fields {
            for violation in violations {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{path}: {violation}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_deduplicates() {
        let mut errors = FieldErrors::new();
        errors.add("spells", RuleViolation::Missing);
        errors.add("spells", RuleViolation::Missing);
        errors.add("spells", RuleViolation::Empty);

        assert_eq!(errors.get("spells").len(), 2);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_merge_and_messages() {
        let mut errors = FieldErrors::single("player_name", RuleViolation::Empty);
        errors.merge(FieldErrors::single(
            "bonus_attr_2",
            RuleViolation::DuplicateBonusAttribute(Attribute::Strength),
        ));

        let messages = errors.messages();
        assert_eq!(messages["player_name"], vec!["must not be empty"]);
        assert_eq!(
            messages["bonus_attr_2"],
            vec!["Strength was already chosen as the first bonus attribute"]
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_display_is_ordered_by_path() {
        let mut errors = FieldErrors::new();
        errors.add("z_field", RuleViolation::Missing);
        errors.add("a_field", RuleViolation::Empty);
        assert_eq!(
            errors.to_string(),
            "a_field: must not be empty; z_field: is required"
        );
    }

    #[test]
    fn test_prefixed() {
        let errors = FieldErrors::single("craft_2", RuleViolation::Missing)
            .prefixed("specialization_details");
        assert!(errors.contains("specialization_details.craft_2"));
        assert!(!errors.contains("craft_2"));
    }

    #[test]
    fn test_empty_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
        assert!(FieldErrors::new().get("anything").is_empty());
    }
}
