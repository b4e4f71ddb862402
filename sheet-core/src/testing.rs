//! Testing utilities for the wizard.
//!
//! This module provides:
//! - `FixedDice` for scripted attribute rolls
//! - `fixtures` with step input for a typical innate fighter
//! - document builders that stand at a given point of the wizard

use serde_json::{json, Value};

use crate::attributes::{Attribute, AttributeVector, GenerationMethod};
use crate::catalog::{Resistance, Skill, Spell, Talent, Toolkit, Uniform, Weapon};
use crate::dice::DiceSource;
use crate::document::{Appearance, CharacterDocument, Equipment, FinalDetails, PersonalAspects};
use crate::origin::{Origin, OriginDetails};
use crate::specialization::{Specialization, SpecializationDetails};

/// Dice that return scripted values in order, starting over at the end.
#[derive(Debug, Clone)]
pub struct FixedDice {
    values: Vec<u8>,
    next: usize,
}

impl FixedDice {
    pub fn new(values: Vec<u8>) -> Self {
        Self { values, next: 0 }
    }
}

impl DiceSource for FixedDice {
    fn roll_d6(&mut self) -> u8 {
        if self.values.is_empty() {
            return 1;
        }
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

/// Step input, as a client would submit it.
pub mod fixtures {
    use super::*;

    pub fn base() -> Value {
        json!({ "player_name": "Ana", "character_name": "Yuji Itadori" })
    }

    pub fn personal() -> Value {
        json!({
            "personality_traits": ["Cheerful", "Stubborn"],
            "ideals": ["Nobody should die alone"],
            "bonds": ["Grandfather's last words"],
            "complications": ["Carries a curse inside"],
        })
    }

    pub fn point_buy(values: [u8; 6]) -> Value {
        attributes("point-buy", values)
    }

    pub fn rolled(values: [u8; 6]) -> Value {
        attributes("rolled", values)
    }

    pub fn fixed_attributes() -> Value {
        attributes("fixed", crate::attributes::FIXED_ARRAY)
    }

    fn attributes(method: &str, values: [u8; 6]) -> Value {
        json!({
            "attribute_method": method,
            "attributes": {
                "str": values[0],
                "dex": values[1],
                "con": values[2],
                "int": values[3],
                "wis": values[4],
                "pre": values[5],
            },
        })
    }

    pub fn innate_origin(talent: Talent) -> Value {
        json!({
            "origin": "innate",
            "origin_details": {
                "type": "innate",
                "trademark_spell": "Divergent Fist",
                "technique_name": "Black Flash",
            },
            "bonus_attr_1": "str",
            "bonus_attr_2": "con",
            "natural_talent": talent.name(),
        })
    }

    pub fn fighter() -> Value {
        json!({
            "specialization": "fighter",
            "specialization_details": {
                "type": "fighter",
                "key_attribute": "str",
                "resistance": "Fortitude",
                "combat_skill": "Athletics",
                "free_skills": ["Stealth", "History", "Perception"],
            },
        })
    }

    pub fn support(free_skills: &[&str]) -> Value {
        json!({
            "specialization": "support",
            "specialization_details": {
                "type": "support",
                "key_attribute": "wis",
                "resistance": "Will",
                "craft": "Alchemist",
                "free_skills": free_skills,
            },
        })
    }

    pub fn equipment() -> Value {
        json!({
            "weapon_1": "Katana",
            "weapon_2": "Dagger",
            "uniform": "Common Uniform",
            "toolkit": "Blacksmith's Tools",
        })
    }

    pub fn spells() -> Value {
        json!({ "spells": ["Energy Strike", "Energy Shield"] })
    }

    pub fn final_details() -> Value {
        json!({ "vow": "Protect the weak", "inner_domain": "A quiet riverbank" })
    }

    pub fn appearance() -> Value {
        json!({ "height": "1.73m", "hair_color": "Pink", "eye_color": "Brown" })
    }
}

/// Names, personality and fixed-array attributes.
pub fn through_attributes() -> CharacterDocument {
    CharacterDocument {
        player_name: Some("Ana".to_string()),
        character_name: Some("Yuji Itadori".to_string()),
        personality: Some(PersonalAspects {
            personality_traits: vec!["Cheerful".to_string(), "Stubborn".to_string()],
            ideals: vec!["Nobody should die alone".to_string()],
            bonds: vec!["Grandfather's last words".to_string()],
            complications: vec!["Carries a curse inside".to_string()],
            inner_domain: None,
        }),
        attribute_method: Some(GenerationMethod::Fixed),
        attributes: Some(AttributeVector::fixed_array()),
        ..Default::default()
    }
}

/// An innate origin with Strength and Constitution bonuses.
pub fn through_origin(talent: Talent) -> CharacterDocument {
    CharacterDocument {
        origin: Some(Origin::Innate),
        origin_details: Some(OriginDetails::Innate {
            trademark_spell: "Divergent Fist".to_string(),
            technique_name: "Black Flash".to_string(),
        }),
        bonus_attr_1: Some(Attribute::Strength),
        bonus_attr_2: Some(Attribute::Constitution),
        natural_talent: Some(talent),
        ..through_attributes()
    }
}

/// A fighter, which is proficient with shields.
pub fn through_specialization() -> CharacterDocument {
    CharacterDocument {
        specialization: Some(Specialization::Fighter),
        specialization_details: Some(SpecializationDetails::Fighter {
            key_attribute: Attribute::Strength,
            resistance: Resistance::Fortitude,
            combat_skill: Skill::Athletics,
            free_skills: vec![Skill::Stealth, Skill::History, Skill::Perception],
        }),
        ..through_origin(Talent::EmergencyVow)
    }
}

/// Two weapons, no shield.
pub fn through_equipment() -> CharacterDocument {
    CharacterDocument {
        equipment: Some(Equipment {
            weapon_1: Some(Weapon::Katana),
            weapon_2: Some(Weapon::Dagger),
            shield: None,
            uniform: Some(Uniform::Common),
            toolkit: Some(Toolkit::Blacksmith),
            craft_selection: None,
        }),
        ..through_specialization()
    }
}

/// A complete innate fighter, the document every fixture above builds.
pub fn innate_fighter_document() -> CharacterDocument {
    CharacterDocument {
        spells: Some(vec![Spell::EnergyStrike, Spell::EnergyShield]),
        final_details: Some(FinalDetails {
            vow: Some("Protect the weak".to_string()),
            inner_domain: Some("A quiet riverbank".to_string()),
            anatomy: None,
            cores: Vec::new(),
        }),
        appearance: Some(Appearance {
            height: Some("1.73m".to_string()),
            hair_color: Some("Pink".to_string()),
            eye_color: Some("Brown".to_string()),
            ..Default::default()
        }),
        ..through_equipment()
    }
}
