//! Resource pools derived from specialization and attributes.

use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeVector};
use crate::specialization::SpecializationDetails;

/// How a specialization computes its energy points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyRule {
    /// No cursed energy at all.
    None,
    Flat(i32),
    /// Base plus the key attribute modifier.
    KeyAttribute { base: i32 },
}

/// Per-specialization pool formula. Hit points always add the Constitution
/// modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRule {
    pub base_hit_points: i32,
    pub energy: EnergyRule,
    pub stamina: Option<i32>,
}

/// Derived capacities at first level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePools {
    pub hit_points: i32,
    pub energy_points: i32,
    pub stamina: i32,
}

/// Compute pools from the chosen specialization and effective attributes.
pub fn derive_pools(
    specialization: &SpecializationDetails,
    attributes: &AttributeVector,
) -> ResourcePools {
    let rule = specialization.specialization().rules().resources;

    let con_mod = attributes.modifier(Attribute::Constitution) as i32;
    let hit_points = (rule.base_hit_points + con_mod).max(1);

    let energy_points = match rule.energy {
        EnergyRule::None => 0,
        EnergyRule::Flat(points) => points,
        EnergyRule::KeyAttribute { base } => {
            base + attributes.modifier(specialization.key_attribute()) as i32
        }
    }
    .max(0);

    ResourcePools {
        hit_points,
        energy_points,
        stamina: rule.stamina.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Craft, Resistance, Skill};

    #[test]
    fn test_fighter_pools() {
        let details = SpecializationDetails::Fighter {
            key_attribute: Attribute::Strength,
            resistance: Resistance::Fortitude,
            combat_skill: Skill::Athletics,
            free_skills: vec![],
        };
        let attributes = AttributeVector::new(15, 14, 14, 12, 10, 8);
        let pools = derive_pools(&details, &attributes);
        assert_eq!(pools.hit_points, 14);
        assert_eq!(pools.energy_points, 4);
        assert_eq!(pools.stamina, 0);
    }

    #[test]
    fn test_support_energy_uses_key_attribute() {
        let details = SpecializationDetails::Support {
            key_attribute: Attribute::Presence,
            resistance: Resistance::Will,
            craft: Craft::Alchemist,
            free_skills: vec![],
        };
        let attributes = AttributeVector::new(10, 10, 8, 10, 10, 16);
        let pools = derive_pools(&details, &attributes);
        assert_eq!(pools.hit_points, 9);
        assert_eq!(pools.energy_points, 8);
    }

    #[test]
    fn test_restricted_has_stamina_and_no_energy() {
        let details = SpecializationDetails::Restricted {
            key_attribute: Attribute::Dexterity,
            free_skills: vec![],
        };
        let pools = derive_pools(&details, &AttributeVector::uniform(18));
        assert_eq!(pools.hit_points, 20);
        assert_eq!(pools.energy_points, 0);
        assert_eq!(pools.stamina, 4);
    }

    #[test]
    fn test_pools_never_negative() {
        let details = SpecializationDetails::Controller {
            key_attribute: Attribute::Intelligence,
            resistance: Resistance::Cunning,
            craft: Craft::Tailor,
            free_skills: vec![],
        };
        let pools = derive_pools(&details, &AttributeVector::uniform(3));
        assert_eq!(pools.hit_points, 6);
        assert_eq!(pools.energy_points, 1);
    }
}
