//! Whole-document validation.
//!
//! [`document_errors`] checks every field that is present, plus the rules
//! that tie fields together. It runs after every step commit, so a field that
//! is present is always consistent with the rest of the document.
//! [`completion_errors`] adds the requirement that every step has been
//! filled in and is what the review step gates on.

use std::collections::BTreeSet;

use tracing::debug;

use crate::attributes::{
    check_generation, check_increment, Attribute, ATTRIBUTE_CEILING, ATTRIBUTE_FLOOR,
};
use crate::catalog::Talent;
use crate::document::{CharacterDocument, Equipment, FinalDetails, PersonalAspects};
use crate::origin::{check_bonus_picks, check_talent, Origin};
use crate::specialization::Specialization;
use crate::validation::{FieldErrors, RuleViolation};

/// Number of core names a mutant body lists.
pub const MUTANT_CORE_COUNT: usize = 3;

/// Validate the fields present in `document`.
///
/// Returns the document unchanged when it passes, so validating an already
/// valid document again gives the same result.
pub fn validate_document(document: CharacterDocument) -> Result<CharacterDocument, FieldErrors> {
    document_errors(&document).into_result()?;
    Ok(document)
}

/// Like [`validate_document`] but also requires every step to be filled in.
pub fn validate_complete(document: CharacterDocument) -> Result<CharacterDocument, FieldErrors> {
    completion_errors(&document).into_result()?;
    Ok(document)
}

/// Whether the document is ready for review.
pub fn is_complete(document: &CharacterDocument) -> bool {
    completion_errors(document).is_empty()
}

/// Every problem with the fields that are present.
pub fn document_errors(document: &CharacterDocument) -> FieldErrors {
    let mut errors = FieldErrors::new();

    check_text(&mut errors, "player_name", document.player_name.as_deref());
    check_text(&mut errors, "character_name", document.character_name.as_deref());
    if let Some(personality) = &document.personality {
        errors.merge(personality_errors(personality).prefixed("personality"));
    }

    check_attributes(&mut errors, document);
    check_origin(&mut errors, document);
    check_specialization(&mut errors, document);

    if let Some(equipment) = &document.equipment {
        errors.merge(equipment_errors(equipment, document));
    }
    check_spells(&mut errors, document);
    if let Some(final_details) = &document.final_details {
        errors.merge(final_details_errors(final_details, document.origin).prefixed("final_details"));
    }
    if let Some(appearance) = &document.appearance {
        for (field, value) in appearance.fields() {
            check_text(&mut errors, &format!("appearance.{field}"), value);
        }
    }

    if !errors.is_empty() {
        debug!("Document has {} invalid fields", errors.len());
    }
    errors
}

/// [`document_errors`] plus everything still missing.
pub fn completion_errors(document: &CharacterDocument) -> FieldErrors {
    let mut errors = document_errors(document);
    let mut require = |path: &str, present: bool| {
        if !present {
            errors.add(path, RuleViolation::Missing);
        }
    };

    require("player_name", document.player_name.is_some());
    require("character_name", document.character_name.is_some());
    require("personality", document.personality.is_some());
    require("attribute_method", document.attribute_method.is_some());
    require("attributes", document.attributes.is_some());
    require("origin", document.origin.is_some());
    require("origin_details", document.origin_details.is_some());
    require(
        "attribute_increment",
        !document.has_talent(Talent::AttributeIncrement) || document.attribute_increment.is_some(),
    );
    require("specialization", document.specialization.is_some());
    require(
        "specialization_details",
        document.specialization_details.is_some(),
    );
    require("equipment", document.equipment.is_some());
    require("spells", document.spells.is_some());
    require("final_details", document.final_details.is_some());

    if let Some(spells) = &document.spells {
        let cap = document.spell_cap();
        if spells.len() != cap {
            errors.add(
                "spells",
                RuleViolation::SpellCountMismatch {
                    expected: cap,
                    got: spells.len(),
                },
            );
        }
    }

    errors
}

fn check_text(errors: &mut FieldErrors, path: &str, value: Option<&str>) {
    if value.is_some_and(|text| text.trim().is_empty()) {
        errors.add(path, RuleViolation::Empty);
    }
}

fn personality_errors(personality: &PersonalAspects) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let lists = [
        ("personality_traits", &personality.personality_traits),
        ("ideals", &personality.ideals),
        ("bonds", &personality.bonds),
        ("complications", &personality.complications),
    ];
    for (field, entries) in lists {
        if entries.iter().all(|entry| entry.trim().is_empty()) {
            errors.add(field, RuleViolation::Empty);
        }
    }
    check_text(&mut errors, "inner_domain", personality.inner_domain.as_deref());
    errors
}

fn check_attributes(errors: &mut FieldErrors, document: &CharacterDocument) {
    let Some(scores) = &document.attributes else {
        return;
    };

    let mut in_range = true;
    for attribute in Attribute::all() {
        let value = scores.get(attribute);
        if !(ATTRIBUTE_FLOOR..=ATTRIBUTE_CEILING).contains(&value) {
            in_range = false;
            errors.add(
                format!("attributes.{}", attribute.code()),
                RuleViolation::OutOfRange {
                    value: value as i64,
                    min: ATTRIBUTE_FLOOR as i64,
                    max: ATTRIBUTE_CEILING as i64,
                },
            );
        }
    }

    match document.attribute_method {
        Some(method) if in_range => {
            for (attribute, violation) in check_generation(method, scores) {
                errors.add(attribute_path(attribute), violation);
            }
        }
        Some(_) => {}
        None => errors.add("attribute_method", RuleViolation::Missing),
    }
}

/// `attributes.<code>` for one attribute, `attributes` for the set.
pub fn attribute_path(attribute: Option<Attribute>) -> String {
    match attribute {
        Some(attribute) => format!("attributes.{}", attribute.code()),
        None => "attributes".to_string(),
    }
}

fn check_origin(errors: &mut FieldErrors, document: &CharacterDocument) {
    if let Some(details) = &document.origin_details {
        match document.origin {
            None => errors.add("origin", RuleViolation::Missing),
            Some(origin) if origin != details.origin() => errors.add(
                "origin_details.type",
                RuleViolation::TagMismatch {
                    expected: origin.name().to_string(),
                    found: details.origin().name().to_string(),
                },
            ),
            Some(origin) => {
                errors.merge(details.check().prefixed("origin_details"));
                errors.merge(check_bonus_picks(
                    origin,
                    document.bonus_attr_1,
                    document.bonus_attr_2,
                ));
                errors.merge(check_talent(origin, document.natural_talent));
            }
        }
    }

    if let (Some(Origin::Restricted), Some(specialization)) =
        (document.origin, document.specialization)
    {
        if specialization != Specialization::Restricted {
            errors.add(
                "specialization",
                RuleViolation::SpecializationRequired {
                    origin: Origin::Restricted,
                    required: Specialization::Restricted,
                },
            );
        }
    }

    if let Some(attribute) = document.attribute_increment {
        if !document.has_talent(Talent::AttributeIncrement) {
            errors.add("attribute_increment", RuleViolation::IncrementNotGranted);
        } else if let Some(scores) = document.attributes_before_increment() {
            if let Err(violation) = check_increment(&scores, attribute) {
                errors.add("attribute_increment", violation);
            }
        }
    }
}

fn check_specialization(errors: &mut FieldErrors, document: &CharacterDocument) {
    let Some(details) = &document.specialization_details else {
        return;
    };
    match document.specialization {
        None => errors.add("specialization", RuleViolation::Missing),
        Some(specialization) if specialization != details.specialization() => errors.add(
            "specialization_details.type",
            RuleViolation::TagMismatch {
                expected: specialization.name().to_string(),
                found: details.specialization().name().to_string(),
            },
        ),
        Some(_) => errors.merge(details.check().prefixed("specialization_details")),
    }
}

/// Completeness of the equipment picks. The item count is reported on
/// `equipment` itself.
fn equipment_errors(equipment: &Equipment, document: &CharacterDocument) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let proficient = document.shield_proficient();

    if equipment.shield.is_some() && !proficient {
        errors.add("equipment.shield", RuleViolation::ShieldNotProficient);
    }

    let got = equipment.counted_items(proficient);
    if got != 2 {
        errors.add("equipment", RuleViolation::EquipmentItemCount { got });
    }
    if equipment.uniform.is_none() {
        errors.add("equipment.uniform", RuleViolation::Missing);
    }
    if equipment.toolkit.is_none() {
        errors.add("equipment.toolkit", RuleViolation::Missing);
    }

    if let (Some(extra), Some(details)) =
        (equipment.craft_selection, &document.specialization_details)
    {
        if details.crafts().contains(&extra) {
            errors.add("equipment.craft_selection", RuleViolation::DuplicateCraft(extra));
        }
    }

    errors
}

fn check_spells(errors: &mut FieldErrors, document: &CharacterDocument) {
    let Some(spells) = &document.spells else {
        return;
    };

    let mut seen = BTreeSet::new();
    for spell in spells {
        if !seen.insert(*spell) {
            errors.add("spells", RuleViolation::DuplicateSpell(*spell));
        }
    }

    let cap = document.spell_cap();
    if spells.len() > cap {
        errors.add(
            "spells",
            RuleViolation::SpellLimitExceeded {
                cap,
                got: spells.len(),
            },
        );
    }
}

/// Origin-dependent closing details. Paths are relative to `final_details`.
fn final_details_errors(details: &FinalDetails, origin: Option<Origin>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "vow", details.vow.as_deref());
    check_text(&mut errors, "inner_domain", details.inner_domain.as_deref());

    match (origin, details.anatomy) {
        (Some(Origin::CursedWomb), None) => errors.add("anatomy", RuleViolation::Missing),
        (Some(Origin::CursedWomb), Some(_)) | (_, None) => {}
        (_, Some(_)) => errors.add("anatomy", RuleViolation::NotAvailableForOrigin),
    }

    if origin == Some(Origin::MutantBody) {
        errors.merge(core_errors(&details.cores));
    } else if !details.cores.is_empty() {
        errors.add("cores", RuleViolation::NotAvailableForOrigin);
    }

    errors
}

fn core_errors(cores: &[String]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if cores.len() != MUTANT_CORE_COUNT {
        errors.add(
            "cores",
            RuleViolation::EntryCount {
                expected: MUTANT_CORE_COUNT,
                got: cores.len(),
            },
        );
        return errors;
    }

    let mut seen = BTreeSet::new();
    for (index, core) in cores.iter().enumerate() {
        let name = core.trim();
        if name.is_empty() {
            errors.add(format!("cores[{index}]"), RuleViolation::Empty);
        } else if !seen.insert(name.to_lowercase()) {
            errors.add("cores", RuleViolation::DuplicateEntry(name.to_string()));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeVector, GenerationMethod};
    use crate::catalog::{Anatomy, Craft, Shield, Spell};
    use crate::origin::OriginDetails;
    use crate::specialization::SpecializationDetails;
    use crate::testing;

    #[test]
    fn test_empty_document_is_valid_but_incomplete() {
        let doc = CharacterDocument::new();
        assert!(validate_document(doc.clone()).is_ok());
        let errors = completion_errors(&doc);
        assert!(errors.contains("player_name"));
        assert!(errors.contains("spells"));
        assert!(!errors.contains("appearance"));
        assert!(!is_complete(&doc));
    }

    #[test]
    fn test_complete_fixture_passes() {
        let doc = testing::innate_fighter_document();
        assert_eq!(completion_errors(&doc), FieldErrors::new());
        let validated = validate_complete(doc.clone()).expect("Should be complete");
        assert_eq!(validated, doc);
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let doc = testing::innate_fighter_document();
        let once = validate_document(doc.clone());
        let twice = once.clone().and_then(validate_document);
        assert_eq!(once, twice);
        assert_eq!(twice, Ok(doc));
    }

    #[test]
    fn test_origin_tag_mismatch() {
        let doc = CharacterDocument {
            origin: Some(Origin::Derived),
            origin_details: Some(OriginDetails::Innate {
                trademark_spell: "Y".to_string(),
                technique_name: "X".to_string(),
            }),
            ..Default::default()
        };
        let errors = document_errors(&doc);
        assert_eq!(
            errors.get("origin_details.type"),
            &[RuleViolation::TagMismatch {
                expected: "derived".to_string(),
                found: "innate".to_string(),
            }]
        );
    }

    #[test]
    fn test_specialization_tag_mismatch() {
        let mut doc = testing::innate_fighter_document();
        doc.specialization = Some(Specialization::Support);
        let errors = document_errors(&doc);
        assert!(errors.contains("specialization_details.type"));
    }

    #[test]
    fn test_derived_value_mismatch_reported() {
        let doc = CharacterDocument {
            origin: Some(Origin::Inherited),
            origin_details: Some(OriginDetails::Inherited {
                clan: crate::lineage::Clan::Gojo,
                clan_spell: "Ten Shadows".to_string(),
            }),
            bonus_attr_1: Some(Attribute::Dexterity),
            bonus_attr_2: Some(Attribute::Wisdom),
            natural_talent: Some(Talent::EmergencyVow),
            ..Default::default()
        };
        let errors = document_errors(&doc);
        assert_eq!(
            errors.get("origin_details.clan_spell"),
            &[RuleViolation::DerivedValueMismatch {
                expected: "Divine Illusion".to_string()
            }]
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_attribute_method_consistency() {
        let doc = CharacterDocument {
            attribute_method: Some(GenerationMethod::PointBuy),
            attributes: Some(AttributeVector::new(15, 15, 15, 8, 8, 8)),
            ..Default::default()
        };
        let errors = document_errors(&doc);
        assert_eq!(
            errors.get("attributes"),
            &[RuleViolation::PointBudgetMismatch {
                total: 15,
                budget: 17
            }]
        );

        let doc = CharacterDocument {
            attributes: Some(AttributeVector::uniform(10)),
            ..Default::default()
        };
        assert!(document_errors(&doc).contains("attribute_method"));
    }

    #[test]
    fn test_restricted_origin_requires_restricted_specialization() {
        let doc = CharacterDocument {
            origin: Some(Origin::Restricted),
            specialization: Some(Specialization::Fighter),
            ..Default::default()
        };
        assert_eq!(
            document_errors(&doc).get("specialization"),
            &[RuleViolation::SpecializationRequired {
                origin: Origin::Restricted,
                required: Specialization::Restricted,
            }]
        );
    }

    #[test]
    fn test_increment_rules() {
        let mut doc = testing::innate_fighter_document();
        doc.attribute_increment = Some(Attribute::Wisdom);
        assert_eq!(
            document_errors(&doc).get("attribute_increment"),
            &[RuleViolation::IncrementNotGranted]
        );

        doc.natural_talent = Some(Talent::AttributeIncrement);
        assert!(document_errors(&doc).is_empty());

        doc.attribute_increment = None;
        assert!(completion_errors(&doc).contains("attribute_increment"));

        doc.attributes = Some(AttributeVector::uniform(29));
        doc.attribute_method = Some(GenerationMethod::Rolled);
        doc.attribute_increment = Some(Attribute::Wisdom);
        assert!(document_errors(&doc).contains("attribute_increment"));
    }

    #[test]
    fn test_equipment_rules() {
        let mut doc = testing::innate_fighter_document();
        let equipment = doc.equipment.as_mut().expect("Should have equipment");
        equipment.shield = Some(Shield::Medium);
        let errors = document_errors(&doc);
        assert_eq!(
            errors.get("equipment"),
            &[RuleViolation::EquipmentItemCount { got: 3 }]
        );

        // Without shield proficiency the shield does not count and is flagged.
        doc.specialization = Some(Specialization::Support);
        doc.specialization_details = Some(SpecializationDetails::Support {
            key_attribute: Attribute::Wisdom,
            resistance: crate::catalog::Resistance::Will,
            craft: Craft::Alchemist,
            free_skills: vec![crate::catalog::Skill::Stealth, crate::catalog::Skill::History],
        });
        let errors = document_errors(&doc);
        assert_eq!(
            errors.get("equipment.shield"),
            &[RuleViolation::ShieldNotProficient]
        );
        assert!(!errors.contains("equipment"));

        let equipment = doc.equipment.as_mut().expect("Should have equipment");
        equipment.shield = None;
        equipment.uniform = None;
        equipment.craft_selection = Some(Craft::Alchemist);
        let errors = document_errors(&doc);
        assert!(errors.contains("equipment.uniform"));
        assert_eq!(
            errors.get("equipment.craft_selection"),
            &[RuleViolation::DuplicateCraft(Craft::Alchemist)]
        );
    }

    #[test]
    fn test_spell_rules() {
        let mut doc = testing::innate_fighter_document();
        doc.spells = Some(vec![Spell::EnergyStrike, Spell::EnergyStrike]);
        assert_eq!(
            document_errors(&doc).get("spells"),
            &[RuleViolation::DuplicateSpell(Spell::EnergyStrike)]
        );

        doc.spells = Some(vec![Spell::EnergyStrike, Spell::EnergyShield, Spell::DetectCurse]);
        assert_eq!(
            document_errors(&doc).get("spells"),
            &[RuleViolation::SpellLimitExceeded { cap: 2, got: 3 }]
        );

        doc.spells = Some(vec![Spell::EnergyStrike]);
        assert!(document_errors(&doc).is_empty());
        assert_eq!(
            completion_errors(&doc).get("spells"),
            &[RuleViolation::SpellCountMismatch {
                expected: 2,
                got: 1
            }]
        );
    }

    #[test]
    fn test_final_details_depend_on_origin() {
        let mut doc = testing::innate_fighter_document();
        let details = doc.final_details.as_mut().expect("Should have details");
        details.anatomy = Some(Anatomy::Flight);
        details.cores = vec!["A".to_string()];
        let errors = document_errors(&doc);
        assert_eq!(
            errors.get("final_details.anatomy"),
            &[RuleViolation::NotAvailableForOrigin]
        );
        assert_eq!(
            errors.get("final_details.cores"),
            &[RuleViolation::NotAvailableForOrigin]
        );
    }

    #[test]
    fn test_mutant_cores() {
        let cores = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert!(core_errors(&cores(&["Iron", "Ember", "Tide"])).is_empty());
        assert_eq!(
            core_errors(&cores(&["Iron", "Ember"])).get("cores"),
            &[RuleViolation::EntryCount {
                expected: 3,
                got: 2
            }]
        );
        assert_eq!(
            core_errors(&cores(&["Iron", "iron ", "Tide"])).get("cores"),
            &[RuleViolation::DuplicateEntry("iron".to_string())]
        );
        assert!(core_errors(&cores(&["Iron", " ", "Tide"])).contains("cores[1]"));
    }
}
