//! Specializations and their detail shapes.
//!
//! A [`Specialization`] fixes the key attribute options, resistance options,
//! proficiencies, automatically granted skills and the number of free skills.
//! The checks on [`SpecializationDetails`] run in a fixed order so error output
//! is deterministic:
//!
//! 1. pairwise distinctness of craft and foundation-change picks
//! 2. key attribute, resistance and combat skill membership
//! 3. free skills: arity, then uniqueness, then exclusion

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::catalog::{catalog_enum, Craft, FoundationChange, Resistance, Skill, WeaponProficiency};
use crate::resources::{EnergyRule, ResourceRule};
use crate::validation::{FieldErrors, RuleViolation};

/// Number of foundation changes a technique specialist makes.
pub const FOUNDATION_CHANGE_COUNT: usize = 2;

catalog_enum! {
    /// Combat or support role chosen after the origin.
    pub enum Specialization ("specialization") {
        Fighter => "fighter",
        Controller => "controller",
        CombatSpecialist => "combat-specialist",
        TechniqueSpecialist => "technique-specialist",
        Support => "support",
        Restricted => "restricted",
    }
}

/// Creation rules attached to a specialization.
pub struct SpecializationRules {
    pub key_attributes: &'static [Attribute],
    /// Empty when the specialization trains no resistance.
    pub resistances: &'static [Resistance],
    /// Empty when no combat skill is picked.
    pub combat_skills: &'static [Skill],
    pub free_skill_count: usize,
    pub granted_skills: &'static [Skill],
    pub proficiencies: &'static [WeaponProficiency],
    pub resources: ResourceRule,
}

const ALL_ATTRIBUTES: &[Attribute] = &[
    Attribute::Strength,
    Attribute::Dexterity,
    Attribute::Constitution,
    Attribute::Intelligence,
    Attribute::Wisdom,
    Attribute::Presence,
];

const PHYSICAL_RESISTANCES: &[Resistance] = &[Resistance::Fortitude, Resistance::Reflexes];
const MENTAL_RESISTANCES: &[Resistance] = &[Resistance::Cunning, Resistance::Will];
const COMBAT_SKILLS: &[Skill] = &[Skill::Athletics, Skill::Acrobatics];

impl Specialization {
    pub fn title(&self) -> &'static str {
        match self {
            Specialization::Fighter => "Fighter",
            Specialization::Controller => "Controller",
            Specialization::CombatSpecialist => "Combat Specialist",
            Specialization::TechniqueSpecialist => "Technique Specialist",
            Specialization::Support => "Support",
            Specialization::Restricted => "Restricted",
        }
    }

    pub fn rules(&self) -> SpecializationRules {
        match self {
            Specialization::Fighter => SpecializationRules {
                key_attributes: &[Attribute::Strength, Attribute::Dexterity],
                resistances: PHYSICAL_RESISTANCES,
                combat_skills: COMBAT_SKILLS,
                free_skill_count: 3,
                granted_skills: &[],
                proficiencies: &[
                    WeaponProficiency::Simple,
                    WeaponProficiency::Martial,
                    WeaponProficiency::Shield,
                ],
                resources: ResourceRule {
                    base_hit_points: 12,
                    energy: EnergyRule::Flat(4),
                    stamina: None,
                },
            },
            Specialization::Controller => SpecializationRules {
                key_attributes: &[Attribute::Intelligence, Attribute::Wisdom],
                resistances: MENTAL_RESISTANCES,
                combat_skills: &[],
                free_skill_count: 2,
                granted_skills: &[],
                proficiencies: &[WeaponProficiency::Simple, WeaponProficiency::Ranged],
                resources: ResourceRule {
                    base_hit_points: 10,
                    energy: EnergyRule::KeyAttribute { base: 5 },
                    stamina: None,
                },
            },
            Specialization::CombatSpecialist => SpecializationRules {
                key_attributes: &[Attribute::Strength, Attribute::Dexterity, Attribute::Wisdom],
                resistances: PHYSICAL_RESISTANCES,
                combat_skills: COMBAT_SKILLS,
                free_skill_count: 3,
                granted_skills: &[],
                proficiencies: &[
                    WeaponProficiency::Simple,
                    WeaponProficiency::Martial,
                    WeaponProficiency::Shield,
                ],
                resources: ResourceRule {
                    base_hit_points: 12,
                    energy: EnergyRule::Flat(4),
                    stamina: None,
                },
            },
            Specialization::TechniqueSpecialist => SpecializationRules {
                key_attributes: &[Attribute::Intelligence, Attribute::Wisdom],
                resistances: MENTAL_RESISTANCES,
                combat_skills: &[],
                free_skill_count: 2,
                granted_skills: &[Skill::Sorcery, Skill::Occultism],
                proficiencies: &[WeaponProficiency::Simple, WeaponProficiency::Ranged],
                resources: ResourceRule {
                    base_hit_points: 10,
                    energy: EnergyRule::KeyAttribute { base: 6 },
                    stamina: None,
                },
            },
            Specialization::Support => SpecializationRules {
                key_attributes: &[Attribute::Presence, Attribute::Wisdom],
                resistances: MENTAL_RESISTANCES,
                combat_skills: &[],
                free_skill_count: 2,
                granted_skills: &[Skill::Medicine, Skill::Perception],
                proficiencies: &[WeaponProficiency::Simple],
                resources: ResourceRule {
                    base_hit_points: 10,
                    energy: EnergyRule::KeyAttribute { base: 5 },
                    stamina: None,
                },
            },
            Specialization::Restricted => SpecializationRules {
                key_attributes: ALL_ATTRIBUTES,
                resistances: &[],
                combat_skills: &[],
                free_skill_count: 4,
                granted_skills: &[],
                proficiencies: &[
                    WeaponProficiency::Simple,
                    WeaponProficiency::Martial,
                    WeaponProficiency::Ranged,
                    WeaponProficiency::Shield,
                ],
                resources: ResourceRule {
                    base_hit_points: 16,
                    energy: EnergyRule::None,
                    stamina: Some(4),
                },
            },
        }
    }

    pub fn has_shield_proficiency(&self) -> bool {
        self.rules()
            .proficiencies
            .contains(&WeaponProficiency::Shield)
    }
}

// ============================================================================
// Specialization Details
// ============================================================================

/// Per-specialization detail fields, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SpecializationDetails {
    Fighter {
        key_attribute: Attribute,
        resistance: Resistance,
        combat_skill: Skill,
        free_skills: Vec<Skill>,
    },
    Controller {
        key_attribute: Attribute,
        resistance: Resistance,
        craft: Craft,
        free_skills: Vec<Skill>,
    },
    CombatSpecialist {
        key_attribute: Attribute,
        resistance: Resistance,
        combat_skill: Skill,
        craft_1: Craft,
        craft_2: Craft,
        free_skills: Vec<Skill>,
    },
    TechniqueSpecialist {
        key_attribute: Attribute,
        resistance: Resistance,
        foundation_changes: Vec<FoundationChange>,
        craft: Craft,
        free_skills: Vec<Skill>,
    },
    Support {
        key_attribute: Attribute,
        resistance: Resistance,
        craft: Craft,
        free_skills: Vec<Skill>,
    },
    Restricted {
        key_attribute: Attribute,
        free_skills: Vec<Skill>,
    },
}

impl SpecializationDetails {
    pub fn specialization(&self) -> Specialization {
        match self {
            SpecializationDetails::Fighter { .. } => Specialization::Fighter,
            SpecializationDetails::Controller { .. } => Specialization::Controller,
            SpecializationDetails::CombatSpecialist { .. } => Specialization::CombatSpecialist,
            SpecializationDetails::TechniqueSpecialist { .. } => {
                Specialization::TechniqueSpecialist
            }
            SpecializationDetails::Support { .. } => Specialization::Support,
            SpecializationDetails::Restricted { .. } => Specialization::Restricted,
        }
    }

    pub fn key_attribute(&self) -> Attribute {
        match self {
            SpecializationDetails::Fighter { key_attribute, .. }
            | SpecializationDetails::Controller { key_attribute, .. }
            | SpecializationDetails::CombatSpecialist { key_attribute, .. }
            | SpecializationDetails::TechniqueSpecialist { key_attribute, .. }
            | SpecializationDetails::Support { key_attribute, .. }
            | SpecializationDetails::Restricted { key_attribute, .. } => *key_attribute,
        }
    }

    pub fn resistance(&self) -> Option<Resistance> {
        match self {
            SpecializationDetails::Fighter { resistance, .. }
            | SpecializationDetails::Controller { resistance, .. }
            | SpecializationDetails::CombatSpecialist { resistance, .. }
            | SpecializationDetails::TechniqueSpecialist { resistance, .. }
            | SpecializationDetails::Support { resistance, .. } => Some(*resistance),
            SpecializationDetails::Restricted { .. } => None,
        }
    }

    pub fn combat_skill(&self) -> Option<Skill> {
        match self {
            SpecializationDetails::Fighter { combat_skill, .. }
            | SpecializationDetails::CombatSpecialist { combat_skill, .. } => Some(*combat_skill),
            _ => None,
        }
    }

    pub fn crafts(&self) -> Vec<Craft> {
        match self {
            SpecializationDetails::Controller { craft, .. }
            | SpecializationDetails::TechniqueSpecialist { craft, .. }
            | SpecializationDetails::Support { craft, .. } => vec![*craft],
            SpecializationDetails::CombatSpecialist {
                craft_1, craft_2, ..
            } => vec![*craft_1, *craft_2],
            _ => Vec::new(),
        }
    }

    pub fn foundation_changes(&self) -> &[FoundationChange] {
        match self {
            SpecializationDetails::TechniqueSpecialist {
                foundation_changes, ..
            } => foundation_changes,
            _ => &[],
        }
    }

    pub fn free_skills(&self) -> &[Skill] {
        match self {
            SpecializationDetails::Fighter { free_skills, .. }
            | SpecializationDetails::Controller { free_skills, .. }
            | SpecializationDetails::CombatSpecialist { free_skills, .. }
            | SpecializationDetails::TechniqueSpecialist { free_skills, .. }
            | SpecializationDetails::Support { free_skills, .. }
            | SpecializationDetails::Restricted { free_skills, .. } => free_skills,
        }
    }

    /// Every skill the character is trained in: granted, combat, craft and free.
    pub fn trained_skills(&self) -> BTreeSet<Skill> {
        let rules = self.specialization().rules();
        let mut skills: BTreeSet<Skill> = rules.granted_skills.iter().copied().collect();
        skills.extend(self.combat_skill());
        if !self.crafts().is_empty() {
            skills.insert(Skill::Craft);
        }
        skills.extend(self.free_skills().iter().copied());
        skills
    }

    /// Run every check in order. Paths are relative to the details object.
    ///
    /// Pairwise distinctness failures stop the remaining checks.
    pub fn check(&self) -> FieldErrors {
        let pairwise = self.check_pairwise();
        if !pairwise.is_empty() {
            return pairwise;
        }

        let mut errors = self.check_choices();
        if let Err(violations) = self.check_free_skills() {
            for violation in violations {
                errors.add("free_skills", violation);
            }
        }
        errors
    }

    /// Craft and foundation-change picks that must differ from each other.
    pub fn check_pairwise(&self) -> FieldErrors {
        match self {
            SpecializationDetails::CombatSpecialist {
                craft_1, craft_2, ..
            } => distinct_crafts(*craft_1, *craft_2),
            SpecializationDetails::TechniqueSpecialist {
                foundation_changes, ..
            } => distinct_foundation_changes(foundation_changes),
            _ => FieldErrors::new(),
        }
    }

    /// Membership of the key attribute, resistance and combat skill.
    pub fn check_choices(&self) -> FieldErrors {
        let rules = self.specialization().rules();
        let mut errors = FieldErrors::new();

        let key_attribute = self.key_attribute();
        if !rules.key_attributes.contains(&key_attribute) {
            errors.add(
                "key_attribute",
                RuleViolation::KeyAttributeNotAllowed(key_attribute),
            );
        }
        if let Some(resistance) = self.resistance() {
            if !rules.resistances.contains(&resistance) {
                errors.add("resistance", RuleViolation::ResistanceNotAllowed(resistance));
            }
        }
        if let Some(skill) = self.combat_skill() {
            if !rules.combat_skills.contains(&skill) {
                errors.add("combat_skill", RuleViolation::CombatSkillNotAllowed(skill));
            }
        }
        errors
    }

    /// The three free-skill layers. Returns the violations of the first
    /// failing layer only.
    pub fn check_free_skills(&self) -> Result<(), Vec<RuleViolation>> {
        let rules = self.specialization().rules();
        let picks = self.free_skills();

        if picks.len() != rules.free_skill_count {
            return Err(vec![RuleViolation::FreeSkillCount {
                expected: rules.free_skill_count,
                got: picks.len(),
            }]);
        }

        let repeated = duplicates(picks);
        if !repeated.is_empty() {
            return Err(repeated
                .into_iter()
                .map(RuleViolation::DuplicateFreeSkill)
                .collect());
        }

        let excluded = self.excluded_skills();
        let violations: Vec<RuleViolation> = picks
            .iter()
            .filter_map(|skill| {
                if excluded.contains(skill) {
                    Some(RuleViolation::FreeSkillExcluded(*skill))
                } else if !skill.is_freely_selectable() {
                    Some(RuleViolation::SkillNotSelectable(*skill))
                } else {
                    None
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Skills a free pick may not repeat.
    pub fn excluded_skills(&self) -> BTreeSet<Skill> {
        let rules = self.specialization().rules();
        let mut excluded: BTreeSet<Skill> = rules.granted_skills.iter().copied().collect();
        excluded.extend(self.combat_skill());
        if !self.crafts().is_empty() {
            excluded.insert(Skill::Craft);
        }
        excluded
    }
}

/// The two craft picks of a combat specialist. A repeat is reported on
/// `craft_2`.
pub fn distinct_crafts(first: Craft, second: Craft) -> FieldErrors {
    if first == second {
        FieldErrors::single("craft_2", RuleViolation::DuplicateCraft(second))
    } else {
        FieldErrors::new()
    }
}

/// Exactly [`FOUNDATION_CHANGE_COUNT`] foundation changes, all different.
pub fn distinct_foundation_changes(changes: &[FoundationChange]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if changes.len() != FOUNDATION_CHANGE_COUNT {
        errors.add(
            "foundation_changes",
            RuleViolation::FoundationChangeCount {
                expected: FOUNDATION_CHANGE_COUNT,
                got: changes.len(),
            },
        );
        return errors;
    }
    for duplicate in duplicates(changes) {
        errors.add(
            "foundation_changes",
            RuleViolation::DuplicateFoundationChange(duplicate),
        );
    }
    errors
}

/// Values that appear more than once, each reported once, in first-seen order.
fn duplicates<T: Copy + Ord>(values: &[T]) -> Vec<T> {
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    let mut repeated = Vec::new();
    for value in values {
        if !seen.insert(*value) && reported.insert(*value) {
            repeated.push(*value);
        }
    }
    repeated
}
