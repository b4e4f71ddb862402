//! The character document accumulated by the wizard.
//!
//! Every field is optional: the document starts empty and fills in as steps
//! are committed. Absent fields serialize to nothing, so a saved document only
//! carries what the player has actually entered.

use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeVector, GenerationMethod, INCREMENT_AMOUNT};
use crate::catalog::{Anatomy, Craft, Shield, Spell, Talent, Toolkit, Uniform, Weapon};
use crate::origin::{Origin, OriginDetails, BASE_SPELL_ALLOWANCE};
use crate::resources::{derive_pools, ResourcePools};
use crate::specialization::{Specialization, SpecializationDetails};

/// Narrative personality entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalAspects {
    pub personality_traits: Vec<String>,
    pub ideals: Vec<String>,
    pub bonds: Vec<String>,
    pub complications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_domain: Option<String>,
}

/// Starting equipment picks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_1: Option<Weapon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_2: Option<Weapon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield: Option<Shield>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniform: Option<Uniform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolkit: Option<Toolkit>,
    /// Extra craft taken with the toolkit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub craft_selection: Option<Craft>,
}

impl Equipment {
    /// Filled slots among weapon 1, weapon 2 and shield. The shield only
    /// counts when the character is proficient with shields.
    pub fn counted_items(&self, shield_proficient: bool) -> usize {
        let shield = self.shield.is_some() && shield_proficient;
        [self.weapon_1.is_some(), self.weapon_2.is_some(), shield]
            .into_iter()
            .filter(|filled| *filled)
            .count()
    }

    pub fn is_complete(&self, shield_proficient: bool) -> bool {
        self.counted_items(shield_proficient) == 2
            && self.uniform.is_some()
            && self.toolkit.is_some()
    }
}

/// Closing narrative details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_domain: Option<String>,
    /// Cursed-womb only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anatomy: Option<Anatomy>,
    /// Mutant-body only: names of the three cores.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cores: Vec<String>,
}

/// Free-form appearance notes. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinctive_features: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usual_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniform_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_note: Option<String>,
}

impl Appearance {
    pub const FIELDS: [&'static str; 11] = [
        "height",
        "weight",
        "age",
        "hair_color",
        "eye_color",
        "skin_tone",
        "distinctive_features",
        "usual_expression",
        "uniform_preference",
        "voice_description",
        "presence_note",
    ];

    /// Every field with its value, in [`FIELDS`](Self::FIELDS) order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 11] {
        [
            ("height", self.height.as_deref()),
            ("weight", self.weight.as_deref()),
            ("age", self.age.as_deref()),
            ("hair_color", self.hair_color.as_deref()),
            ("eye_color", self.eye_color.as_deref()),
            ("skin_tone", self.skin_tone.as_deref()),
            ("distinctive_features", self.distinctive_features.as_deref()),
            ("usual_expression", self.usual_expression.as_deref()),
            ("uniform_preference", self.uniform_preference.as_deref()),
            ("voice_description", self.voice_description.as_deref()),
            ("presence_note", self.presence_note.as_deref()),
        ]
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "height" => Some(&mut self.height),
            "weight" => Some(&mut self.weight),
            "age" => Some(&mut self.age),
            "hair_color" => Some(&mut self.hair_color),
            "eye_color" => Some(&mut self.eye_color),
            "skin_tone" => Some(&mut self.skin_tone),
            "distinctive_features" => Some(&mut self.distinctive_features),
            "usual_expression" => Some(&mut self.usual_expression),
            "uniform_preference" => Some(&mut self.uniform_preference),
            "voice_description" => Some(&mut self.voice_description),
            "presence_note" => Some(&mut self.presence_note),
            _ => None,
        }
    }
}

/// The whole character as entered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<PersonalAspects>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_method: Option<GenerationMethod>,
    /// Totals of the last roll, waiting to be assigned on the attributes step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_roll: Option<[u8; 6]>,
    /// Base values, before origin bonuses and increments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_details: Option<OriginDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_attr_1: Option<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_attr_2: Option<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_talent: Option<Talent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_increment: Option<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Specialization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization_details: Option<SpecializationDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Equipment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spells: Option<Vec<Spell>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_details: Option<FinalDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appearance: Option<Appearance>,
}

impl CharacterDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_talent(&self, talent: Talent) -> bool {
        self.natural_talent == Some(talent)
    }

    /// Base values plus origin bonuses and the attribute increment, each
    /// capped at the attribute ceiling. `None` until attributes are entered.
    pub fn effective_attributes(&self) -> Option<AttributeVector> {
        let mut effective = self.attributes_before_increment()?;
        if let Some(attribute) = self.attribute_increment {
            effective.raise(attribute, INCREMENT_AMOUNT);
        }
        Some(effective)
    }

    /// Base values plus origin bonuses only. The attribute increment is
    /// checked against these.
    pub fn attributes_before_increment(&self) -> Option<AttributeVector> {
        let mut scores = self.attributes?;
        if let Some(origin) = self.origin {
            let increments = origin
                .rules()
                .bonus
                .increments(self.bonus_attr_1, self.bonus_attr_2);
            for (attribute, amount) in increments {
                scores.raise(attribute, amount);
            }
        }
        Some(scores)
    }

    /// How many spells may be chosen.
    ///
    /// Zero for non-casting origins and for the Restricted specialization;
    /// otherwise the base allowance, plus one with Technique Affinity.
    pub fn spell_cap(&self) -> usize {
        let Some(origin) = self.origin else {
            return 0;
        };
        if !origin.rules().casts_spells || self.specialization == Some(Specialization::Restricted)
        {
            return 0;
        }
        if self.has_talent(Talent::TechniqueAffinity) {
            BASE_SPELL_ALLOWANCE + 1
        } else {
            BASE_SPELL_ALLOWANCE
        }
    }

    /// Whether the chosen specialization can carry a shield.
    pub fn shield_proficient(&self) -> bool {
        self.specialization
            .is_some_and(|s| s.has_shield_proficiency())
    }

    /// Derived pools, once both specialization details and attributes exist.
    pub fn resource_pools(&self) -> Option<ResourcePools> {
        let details = self.specialization_details.as_ref()?;
        let attributes = self.effective_attributes()?;
        Some(derive_pools(details, &attributes))
    }

    /// Every craft picked, from the specialization and the equipment step.
    pub fn crafts(&self) -> Vec<Craft> {
        let mut crafts = self
            .specialization_details
            .as_ref()
            .map(SpecializationDetails::crafts)
            .unwrap_or_default();
        if let Some(extra) = self.equipment.as_ref().and_then(|e| e.craft_selection) {
            crafts.push(extra);
        }
        crafts
    }

    /// Display name for listings.
    pub fn display_name(&self) -> &str {
        self.character_name.as_deref().unwrap_or("Unnamed")
    }
}
