//! The six-attribute vector and the generation methods that produce it.
//!
//! Three generation methods exist:
//! - **Fixed**: the values 15, 14, 13, 12, 10 and 8 in any order
//! - **Rolled**: each value is 4d6 drop lowest (see [`crate::dice`])
//! - **Point buy**: values from 8 to 15 bought from a budget of 17 points

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{catalog_enum, normalize_label, UnknownOption};
use crate::validation::RuleViolation;

/// Values of the fixed array.
pub const FIXED_ARRAY: [u8; 6] = [15, 14, 13, 12, 10, 8];

/// Points available under point buy.
pub const POINT_BUY_BUDGET: i32 = 17;

/// Lowest value any attribute can hold.
pub const ATTRIBUTE_FLOOR: u8 = 3;

/// Hard ceiling for an attribute after every bonus is applied.
pub const ATTRIBUTE_CEILING: u8 = 30;

/// Highest value a single 4d6-drop-lowest roll can produce.
pub const ROLLED_CEILING: u8 = 18;

/// Points added by the Attribute Increment talent.
pub const INCREMENT_AMOUNT: u8 = 2;

/// Highest base value that can still take the increment.
pub const INCREMENT_MAX_BASE: u8 = 28;

// ============================================================================
// Attributes
// ============================================================================

/// The six attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    #[serde(rename = "str")]
    Strength,
    #[serde(rename = "dex")]
    Dexterity,
    #[serde(rename = "con")]
    Constitution,
    #[serde(rename = "int")]
    Intelligence,
    #[serde(rename = "wis")]
    Wisdom,
    #[serde(rename = "pre")]
    Presence,
}

impl Attribute {
    /// Serialized code, also used in field paths (`attributes.str`).
    pub fn code(&self) -> &'static str {
        match self {
            Attribute::Strength => "str",
            Attribute::Dexterity => "dex",
            Attribute::Constitution => "con",
            Attribute::Intelligence => "int",
            Attribute::Wisdom => "wis",
            Attribute::Presence => "pre",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Attribute::Strength => "STR",
            Attribute::Dexterity => "DEX",
            Attribute::Constitution => "CON",
            Attribute::Intelligence => "INT",
            Attribute::Wisdom => "WIS",
            Attribute::Presence => "PRE",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Strength => "Strength",
            Attribute::Dexterity => "Dexterity",
            Attribute::Constitution => "Constitution",
            Attribute::Intelligence => "Intelligence",
            Attribute::Wisdom => "Wisdom",
            Attribute::Presence => "Presence",
        }
    }

    pub fn all() -> [Attribute; 6] {
        [
            Attribute::Strength,
            Attribute::Dexterity,
            Attribute::Constitution,
            Attribute::Intelligence,
            Attribute::Wisdom,
            Attribute::Presence,
        ]
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Attribute {
    type Err = UnknownOption;

    /// Accepts the code (`str`) or the full name (`Strength`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Attribute::all()
            .into_iter()
            .find(|a| a.code() == wanted || normalize_label(a.name()) == wanted)
            .ok_or_else(|| UnknownOption {
                kind: "attribute",
                value: s.to_string(),
            })
    }
}

/// Attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeVector {
    #[serde(rename = "str")]
    pub strength: u8,
    #[serde(rename = "dex")]
    pub dexterity: u8,
    #[serde(rename = "con")]
    pub constitution: u8,
    #[serde(rename = "int")]
    pub intelligence: u8,
    #[serde(rename = "wis")]
    pub wisdom: u8,
    #[serde(rename = "pre")]
    pub presence: u8,
}

impl AttributeVector {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, pre: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            presence: pre,
        }
    }

    /// Every attribute at the same value.
    pub fn uniform(value: u8) -> Self {
        Self::new(value, value, value, value, value, value)
    }

    /// The fixed array assigned in attribute order.
    pub fn fixed_array() -> Self {
        Self::from_ordered(FIXED_ARRAY)
    }

    /// Build from values given in attribute order (str, dex, con, int, wis, pre).
    pub fn from_ordered(values: [u8; 6]) -> Self {
        let [str, dex, con, int, wis, pre] = values;
        Self::new(str, dex, con, int, wis, pre)
    }

    pub fn get(&self, attribute: Attribute) -> u8 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Presence => self.presence,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: u8) {
        match attribute {
            Attribute::Strength => self.strength = value,
            Attribute::Dexterity => self.dexterity = value,
            Attribute::Constitution => self.constitution = value,
            Attribute::Intelligence => self.intelligence = value,
            Attribute::Wisdom => self.wisdom = value,
            Attribute::Presence => self.presence = value,
        }
    }

    /// Add to an attribute without passing [`ATTRIBUTE_CEILING`].
    pub fn raise(&mut self, attribute: Attribute, amount: u8) {
        let raised = self
            .get(attribute)
            .saturating_add(amount)
            .min(ATTRIBUTE_CEILING);
        self.set(attribute, raised);
    }

    pub fn modifier(&self, attribute: Attribute) -> i8 {
        modifier_for(self.get(attribute))
    }

    pub fn values(&self) -> [u8; 6] {
        Attribute::all().map(|a| self.get(a))
    }
}

/// Modifier for a raw value: floor((value - 10) / 2).
pub fn modifier_for(value: u8) -> i8 {
    (value as i16 - 10).div_euclid(2) as i8
}

// ============================================================================
// Generation Methods
// ============================================================================

catalog_enum! {
    /// How the base attribute values were produced.
    pub enum GenerationMethod ("generation method") {
        Fixed => "fixed",
        Rolled => "rolled",
        PointBuy => "point-buy",
    }
}

impl GenerationMethod {
    pub fn description(&self) -> &'static str {
        match self {
            GenerationMethod::Fixed => "Assign 15, 14, 13, 12, 10, 8 in any order",
            GenerationMethod::Rolled => "Roll 4d6 and drop the lowest, six times",
            GenerationMethod::PointBuy => "Spend exactly 17 points on values from 8 to 15",
        }
    }

    /// Highest base value this method can produce.
    pub fn ceiling(&self) -> u8 {
        match self {
            GenerationMethod::Fixed | GenerationMethod::PointBuy => 15,
            GenerationMethod::Rolled => ROLLED_CEILING,
        }
    }

    /// Lowest base value this method can produce.
    pub fn floor(&self) -> u8 {
        match self {
            GenerationMethod::Fixed | GenerationMethod::PointBuy => 8,
            GenerationMethod::Rolled => ATTRIBUTE_FLOOR,
        }
    }
}

/// Point cost of buying `value`, relative to a baseline of 10.
pub fn point_buy_cost(value: u8) -> Result<i32, RuleViolation> {
    match value {
        8 => Ok(-2),
        9 => Ok(-1),
        10 => Ok(0),
        11 => Ok(2),
        12 => Ok(3),
        13 => Ok(4),
        14 => Ok(5),
        15 => Ok(7),
        _ => Err(RuleViolation::InvalidPointBuyValue { value }),
    }
}

/// Total point cost of an assignment. Fails on the first unbuyable value.
pub fn total_point_buy_cost(scores: &AttributeVector) -> Result<i32, RuleViolation> {
    scores
        .values()
        .into_iter()
        .map(point_buy_cost)
        .sum()
}

/// The point-buy rules: every value buyable and the total exactly on budget.
pub fn validate_point_buy(scores: &AttributeVector) -> Result<(), RuleViolation> {
    let total = total_point_buy_cost(scores)?;
    if total != POINT_BUY_BUDGET {
        return Err(RuleViolation::PointBudgetMismatch {
            total,
            budget: POINT_BUY_BUDGET,
        });
    }
    Ok(())
}

/// Check base values against a generation method.
///
/// Per-attribute problems carry the attribute; problems with the set as a
/// whole carry `None`.
pub fn check_generation(
    method: GenerationMethod,
    scores: &AttributeVector,
) -> Vec<(Option<Attribute>, RuleViolation)> {
    let mut problems = Vec::new();

    match method {
        GenerationMethod::Fixed => {
            let mut values = scores.values();
            values.sort_unstable_by(|a, b| b.cmp(a));
            if values != FIXED_ARRAY {
                problems.push((None, RuleViolation::NotFixedArray));
            }
        }
        GenerationMethod::Rolled => {
            for attribute in Attribute::all() {
                let value = scores.get(attribute);
                if !(ATTRIBUTE_FLOOR..=ROLLED_CEILING).contains(&value) {
                    problems.push((
                        Some(attribute),
                        RuleViolation::OutOfRange {
                            value: value as i64,
                            min: ATTRIBUTE_FLOOR as i64,
                            max: ROLLED_CEILING as i64,
                        },
                    ));
                }
            }
        }
        GenerationMethod::PointBuy => {
            for attribute in Attribute::all() {
                if let Err(violation) = point_buy_cost(scores.get(attribute)) {
                    problems.push((Some(attribute), violation));
                }
            }
            if problems.is_empty() {
                if let Err(violation) = validate_point_buy(scores) {
                    problems.push((None, violation));
                }
            }
        }
    }

    problems
}

/// Rolled values must be the last roll, assigned in any order.
pub fn check_rolled(roll: Option<[u8; 6]>, scores: &AttributeVector) -> Result<(), RuleViolation> {
    let Some(mut rolled) = roll else {
        return Err(RuleViolation::NoRollToAssign);
    };
    let mut values = scores.values();
    rolled.sort_unstable_by(|a, b| b.cmp(a));
    values.sort_unstable_by(|a, b| b.cmp(a));
    if values != rolled {
        return Err(RuleViolation::NotRolledValues { rolled });
    }
    Ok(())
}

/// Whether `attribute` can take the Attribute Increment on top of `scores`.
pub fn check_increment(scores: &AttributeVector, attribute: Attribute) -> Result<(), RuleViolation> {
    let value = scores.get(attribute);
    if value > INCREMENT_MAX_BASE {
        return Err(RuleViolation::IncrementCeiling {
            attribute,
            value,
            max: INCREMENT_MAX_BASE,
        });
    }
    Ok(())
}
