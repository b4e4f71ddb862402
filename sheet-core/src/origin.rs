//! Origins and their detail shapes.
//!
//! An [`Origin`] is picked once per character and decides which
//! [`OriginDetails`] variant is legal, how bonus attributes are granted, which
//! first-level talents may be taken and whether the character casts spells.

use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::catalog::{catalog_enum, Talent};
use crate::lineage::{self, Clan, CurseGrade, PrimaryCore};
use crate::validation::{FieldErrors, RuleViolation};

/// Spells a casting origin may learn before talents.
pub const BASE_SPELL_ALLOWANCE: usize = 2;

catalog_enum! {
    /// Source of a character's power.
    pub enum Origin ("origin") {
        Innate => "innate",
        Inherited => "inherited",
        NoTechnique => "no-technique",
        Derived => "derived",
        CursedWomb => "cursed-womb",
        MutantBody => "mutant-body",
        Restricted => "restricted",
    }
}

/// How an origin raises attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusRule {
    /// Fixed increments, nothing to pick.
    Fixed(&'static [(Attribute, u8)]),
    /// One pick from a short list.
    Single {
        choices: &'static [Attribute],
        amount: u8,
    },
    /// Two distinct picks with their own amounts.
    Pair { first: u8, second: u8 },
}

impl BonusRule {
    /// Number of attributes the player has to pick.
    pub fn picks(&self) -> usize {
        match self {
            BonusRule::Fixed(_) => 0,
            BonusRule::Single { .. } => 1,
            BonusRule::Pair { .. } => 2,
        }
    }

    /// Increments granted for the given picks. Missing picks grant nothing.
    pub fn increments(
        &self,
        first: Option<Attribute>,
        second: Option<Attribute>,
    ) -> Vec<(Attribute, u8)> {
        match *self {
            BonusRule::Fixed(fixed) => fixed.to_vec(),
            BonusRule::Single { amount, .. } => first.map(|a| (a, amount)).into_iter().collect(),
            BonusRule::Pair {
                first: first_amount,
                second: second_amount,
            } => first
                .map(|a| (a, first_amount))
                .into_iter()
                .chain(second.map(|a| (a, second_amount)))
                .collect(),
        }
    }
}

/// Creation rules attached to an origin.
pub struct OriginRules {
    pub bonus: BonusRule,
    /// First-level talents on offer. Empty when the origin grants none.
    pub talents: &'static [Talent],
    pub casts_spells: bool,
}

impl Origin {
    pub fn title(&self) -> &'static str {
        match self {
            Origin::Innate => "Innate",
            Origin::Inherited => "Inherited",
            Origin::NoTechnique => "No Technique",
            Origin::Derived => "Derived",
            Origin::CursedWomb => "Cursed Womb",
            Origin::MutantBody => "Mutant Body",
            Origin::Restricted => "Restricted",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Origin::Innate => "Born with a cursed technique of your own",
            Origin::Inherited => "Heir to a clan technique passed down by blood",
            Origin::NoTechnique => "No technique at all; relies on training and vows",
            Origin::Derived => "Adapted a technique that belonged to someone else",
            Origin::CursedWomb => "Half curse, born from a cursed womb",
            Origin::MutantBody => "An artificial body animated by cursed cores",
            Origin::Restricted => "Traded cursed energy for a superhuman body",
        }
    }

    pub fn rules(&self) -> OriginRules {
        match self {
            Origin::Innate => OriginRules {
                bonus: BonusRule::Pair {
                    first: 2,
                    second: 1,
                },
                talents: &[
                    Talent::AttributeIncrement,
                    Talent::TechniqueAffinity,
                    Talent::EmergencyVow,
                    Talent::SeizeOpportunity,
                    Talent::UnbreakableSoul,
                    Talent::PhysicalResilience,
                    Talent::ConstantLeaper,
                ],
                casts_spells: true,
            },
            Origin::Inherited => OriginRules {
                bonus: BonusRule::Pair {
                    first: 1,
                    second: 1,
                },
                talents: &[
                    Talent::AttributeIncrement,
                    Talent::TechniqueAffinity,
                    Talent::EmergencyVow,
                    Talent::SeizeOpportunity,
                    Talent::UnbreakableSoul,
                    Talent::PhysicalResilience,
                    Talent::CursedArtisan,
                ],
                casts_spells: true,
            },
            Origin::NoTechnique => OriginRules {
                bonus: BonusRule::Pair {
                    first: 1,
                    second: 1,
                },
                talents: &[
                    Talent::AttributeIncrement,
                    Talent::BrawlAdept,
                    Talent::MedicineAdept,
                    Talent::UnbreakableSoul,
                    Talent::PhysicalResilience,
                    Talent::ConstantLeaper,
                ],
                casts_spells: false,
            },
            Origin::Derived => OriginRules {
                bonus: BonusRule::Single {
                    choices: &[Attribute::Intelligence, Attribute::Wisdom],
                    amount: 2,
                },
                talents: &[],
                casts_spells: false,
            },
            Origin::CursedWomb => OriginRules {
                bonus: BonusRule::Fixed(&[(Attribute::Constitution, 2)]),
                talents: &[],
                casts_spells: true,
            },
            Origin::MutantBody => OriginRules {
                bonus: BonusRule::Pair {
                    first: 1,
                    second: 1,
                },
                talents: &[],
                casts_spells: true,
            },
            Origin::Restricted => OriginRules {
                bonus: BonusRule::Fixed(&[
                    (Attribute::Strength, 1),
                    (Attribute::Dexterity, 1),
                    (Attribute::Constitution, 1),
                ]),
                talents: &[],
                casts_spells: false,
            },
        }
    }
}

// ============================================================================
// Origin Details
// ============================================================================

/// Per-origin detail fields, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OriginDetails {
    Innate {
        trademark_spell: String,
        technique_name: String,
    },
    Inherited {
        clan: Clan,
        clan_spell: String,
    },
    NoTechnique {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vow: Option<String>,
    },
    Derived {
        source_technique: String,
        adaptation: String,
    },
    CursedWomb {
        curse_name: String,
        curse_grade: CurseGrade,
        innate_technique: String,
    },
    MutantBody {
        primary_core: PrimaryCore,
        core_name: String,
        core_focus: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        object_name: Option<String>,
    },
    Restricted,
}

impl OriginDetails {
    pub fn inherited(clan: Clan) -> Self {
        OriginDetails::Inherited {
            clan,
            clan_spell: lineage::clan_spell(clan).to_string(),
        }
    }

    pub fn cursed_womb(curse_name: impl Into<String>, curse_grade: CurseGrade) -> Self {
        OriginDetails::CursedWomb {
            curse_name: curse_name.into(),
            curse_grade,
            innate_technique: lineage::curse_technique(curse_grade).to_string(),
        }
    }

    pub fn mutant_body(
        primary_core: PrimaryCore,
        core_name: impl Into<String>,
        object_name: Option<String>,
    ) -> Self {
        OriginDetails::MutantBody {
            primary_core,
            core_name: core_name.into(),
            core_focus: lineage::core_focus(primary_core).to_string(),
            object_name,
        }
    }

    /// The origin this shape belongs to.
    pub fn origin(&self) -> Origin {
        match self {
            OriginDetails::Innate { .. } => Origin::Innate,
            OriginDetails::Inherited { .. } => Origin::Inherited,
            OriginDetails::NoTechnique { .. } => Origin::NoTechnique,
            OriginDetails::Derived { .. } => Origin::Derived,
            OriginDetails::CursedWomb { .. } => Origin::CursedWomb,
            OriginDetails::MutantBody { .. } => Origin::MutantBody,
            OriginDetails::Restricted => Origin::Restricted,
        }
    }

    /// Field-level checks: required text present and derived values matching
    /// the lineage table. Paths are relative to the details object.
    pub fn check(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let mut require = |field: &str, value: &str| {
            if value.trim().is_empty() {
                errors.add(field, RuleViolation::Empty);
            }
        };

        match self {
            OriginDetails::Innate {
                trademark_spell,
                technique_name,
            } => {
                require("trademark_spell", trademark_spell);
                require("technique_name", technique_name);
            }
            OriginDetails::Derived {
                source_technique,
                adaptation,
            } => {
                require("source_technique", source_technique);
                require("adaptation", adaptation);
            }
            OriginDetails::CursedWomb { curse_name, .. } => require("curse_name", curse_name),
            OriginDetails::MutantBody {
                core_name,
                object_name,
                ..
            } => {
                require("core_name", core_name);
                if let Some(object_name) = object_name {
                    require("object_name", object_name);
                }
            }
            OriginDetails::NoTechnique { vow: Some(vow) } => require("vow", vow),
            OriginDetails::Inherited { .. }
            | OriginDetails::NoTechnique { vow: None }
            | OriginDetails::Restricted => {}
        }

        let mut derived = |field: &str, stored: &str, expected: &str| {
            if stored != expected {
                errors.add(
                    field,
                    RuleViolation::DerivedValueMismatch {
                        expected: expected.to_string(),
                    },
                );
            }
        };

        match self {
            OriginDetails::Inherited { clan, clan_spell } => {
                derived("clan_spell", clan_spell, lineage::clan_spell(*clan))
            }
            OriginDetails::CursedWomb {
                curse_grade,
                innate_technique,
                ..
            } => derived(
                "innate_technique",
                innate_technique,
                lineage::curse_technique(*curse_grade),
            ),
            OriginDetails::MutantBody {
                primary_core,
                core_focus,
                ..
            } => derived("core_focus", core_focus, lineage::core_focus(*primary_core)),
            _ => {}
        }

        errors
    }
}

// ============================================================================
// Bonus Attributes and Talents
// ============================================================================

/// Field path of the first bonus attribute.
pub const BONUS_1_PATH: &str = "bonus_attr_1";
/// Field path of the second bonus attribute.
pub const BONUS_2_PATH: &str = "bonus_attr_2";
/// Field path of the first-level natural talent.
pub const TALENT_PATH: &str = "natural_talent";

/// Check bonus picks against the origin's rule.
///
/// Duplicates are reported on the second pick.
pub fn check_bonus_picks(
    origin: Origin,
    first: Option<Attribute>,
    second: Option<Attribute>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match origin.rules().bonus {
        BonusRule::Fixed(_) => {
            if first.is_some() {
                errors.add(BONUS_1_PATH, RuleViolation::UnexpectedBonusAttribute);
            }
            if second.is_some() {
                errors.add(BONUS_2_PATH, RuleViolation::UnexpectedBonusAttribute);
            }
        }
        BonusRule::Single { choices, .. } => {
            match first {
                None => errors.add(BONUS_1_PATH, RuleViolation::Missing),
                Some(attribute) if !choices.contains(&attribute) => errors.add(
                    BONUS_1_PATH,
                    RuleViolation::BonusAttributeNotAllowed { attribute },
                ),
                Some(_) => {}
            }
            if second.is_some() {
                errors.add(BONUS_2_PATH, RuleViolation::UnexpectedBonusAttribute);
            }
        }
        BonusRule::Pair { .. } => match (first, second) {
            (Some(a), Some(b)) if a == b => {
                errors.add(BONUS_2_PATH, RuleViolation::DuplicateBonusAttribute(b))
            }
            (first, second) => {
                if first.is_none() {
                    errors.add(BONUS_1_PATH, RuleViolation::Missing);
                }
                if second.is_none() {
                    errors.add(BONUS_2_PATH, RuleViolation::Missing);
                }
            }
        },
    }

    errors
}

/// Check the first-level talent against the origin's offer.
pub fn check_talent(origin: Origin, talent: Option<Talent>) -> FieldErrors {
    let offered = origin.rules().talents;
    match talent {
        None if offered.is_empty() => FieldErrors::new(),
        None => FieldErrors::single(TALENT_PATH, RuleViolation::Missing),
        Some(_) if offered.is_empty() => {
            FieldErrors::single(TALENT_PATH, RuleViolation::TalentNotGranted { origin })
        }
        Some(talent) if !offered.contains(&talent) => FieldErrors::single(
            TALENT_PATH,
            RuleViolation::TalentNotAvailable { talent, origin },
        ),
        Some(_) => FieldErrors::new(),
    }
}
