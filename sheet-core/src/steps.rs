//! Per-step business rules.
//!
//! Each step reads its form, runs the rules that the document validator
//! cannot express on its own (two picks that must differ, a point total,
//! pairwise craft checks before the details are read) and merges the result
//! into a working copy of the document. The caller discards the copy on
//! failure, so nothing here has to undo a partial merge.

use serde_json::Value;

use crate::attributes::{
    check_generation, check_increment, check_rolled, Attribute, AttributeVector, GenerationMethod,
    ATTRIBUTE_CEILING, ATTRIBUTE_FLOOR,
};
use crate::catalog::{Anatomy, Craft, FoundationChange, Resistance, Skill, Spell, Talent};
use crate::document::{Appearance, CharacterDocument, Equipment, FinalDetails, PersonalAspects};
use crate::forms::FormReader;
use crate::graph::StepId;
use crate::lineage::{Clan, CurseGrade, PrimaryCore};
use crate::origin::{
    check_bonus_picks, check_talent, Origin, OriginDetails, BONUS_1_PATH, BONUS_2_PATH,
    TALENT_PATH,
};
use crate::specialization::{
    distinct_crafts, distinct_foundation_changes, Specialization, SpecializationDetails,
};
use crate::validation::{FieldErrors, RuleViolation};
use crate::validator::attribute_path;

/// Intent that records a selection without its details.
pub const SELECT_INTENT: &str = "select";
/// Intent that clears the document from the review step.
pub const RESTART_INTENT: &str = "restart";

/// What the wizard does after a step's input was merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepAction {
    /// Move on along the graph.
    Advance,
    /// Stay on the same step, e.g. after a selection.
    Stay,
    /// The document was cleared; go back to the start.
    Restart,
    /// The review was confirmed; the document must be complete.
    Finish,
}

/// Parse `input` for `step` and merge it into `document`.
///
/// On error `document` may hold part of the input and must be thrown away.
pub(crate) fn apply(
    step: StepId,
    input: &Value,
    document: &mut CharacterDocument,
) -> Result<StepAction, FieldErrors> {
    let mut form = FormReader::new(input);
    form.finish()?;

    match step {
        StepId::Base => base(&mut form, document),
        StepId::Personal => personal(&form, document),
        StepId::Attributes => attributes(&mut form, document),
        StepId::Origin => origin(&mut form, document),
        StepId::AttributeIncrement => attribute_increment(&mut form, document),
        StepId::Specialization => specialization(&mut form, document),
        StepId::Equipment => equipment(&form, document),
        StepId::Spells => spells(&mut form, document),
        StepId::FinalDetails => final_details(&form, document),
        StepId::Appearance => appearance(&form, document),
        StepId::Review => review(&form, document),
    }
}

fn base(form: &mut FormReader, document: &mut CharacterDocument) -> Result<StepAction, FieldErrors> {
    let player_name = form.text("player_name");
    let character_name = form.text("character_name");
    let (Some(player_name), Some(character_name)) = (player_name, character_name) else {
        return Err(form.fail());
    };

    document.player_name = Some(player_name);
    document.character_name = Some(character_name);
    Ok(StepAction::Advance)
}

fn personal(root: &FormReader, document: &mut CharacterDocument) -> Result<StepAction, FieldErrors> {
    let mut form = root.scoped("personality");
    let personality_traits = form.text_list("personality_traits");
    let ideals = form.text_list("ideals");
    let bonds = form.text_list("bonds");
    let complications = form.text_list("complications");
    let inner_domain = form.optional_text("inner_domain");

    let (Some(personality_traits), Some(ideals), Some(bonds), Some(complications)) =
        (personality_traits, ideals, bonds, complications)
    else {
        return Err(form.fail());
    };

    document.personality = Some(PersonalAspects {
        personality_traits,
        ideals,
        bonds,
        complications,
        inner_domain,
    });
    Ok(StepAction::Advance)
}

fn attributes(
    form: &mut FormReader,
    document: &mut CharacterDocument,
) -> Result<StepAction, FieldErrors> {
    let method = form.choice::<GenerationMethod>("attribute_method");

    let mut scores = None;
    if let Some(mut nested) = form.nested("attributes") {
        let values = Attribute::all().map(|attribute| {
            nested
                .integer(
                    attribute.code(),
                    ATTRIBUTE_FLOOR as i64,
                    ATTRIBUTE_CEILING as i64,
                )
                .map(|value| value as u8)
        });
        if values.iter().all(Option::is_some) {
            scores = Some(AttributeVector::from_ordered(values.map(Option::unwrap_or_default)));
        }
        form.absorb(nested);
    }

    let (Some(method), Some(scores)) = (method, scores) else {
        return Err(form.fail());
    };
    let problems = check_generation(method, &scores);
    let in_range = problems.is_empty();
    for (attribute, violation) in problems {
        form.reject(&attribute_path(attribute), violation);
    }
    if method == GenerationMethod::Rolled && in_range {
        if let Err(violation) = check_rolled(document.pending_roll, &scores) {
            form.reject(&attribute_path(None), violation);
        }
    }
    form.finish()?;

    document.attribute_method = Some(method);
    document.attributes = Some(scores);
    Ok(StepAction::Advance)
}

fn origin(form: &mut FormReader, document: &mut CharacterDocument) -> Result<StepAction, FieldErrors> {
    let Some(origin) = form.choice::<Origin>("origin") else {
        return Err(form.fail());
    };
    if let Some(chosen) = document.origin {
        if chosen != origin {
            form.reject("origin", RuleViolation::OriginLocked { chosen });
            return Err(form.fail());
        }
    }

    if form.intent().as_deref() == Some(SELECT_INTENT) {
        document.origin = Some(origin);
        return Ok(StepAction::Stay);
    }

    let details = if origin == Origin::Restricted && !form.is_present("origin_details") {
        Some(OriginDetails::Restricted)
    } else {
        read_origin_details(form, origin)
    };

    let bonus_1 = form.optional_choice::<Attribute>(BONUS_1_PATH);
    let bonus_2 = form.optional_choice::<Attribute>(BONUS_2_PATH);
    if !form.rejected(BONUS_1_PATH) && !form.rejected(BONUS_2_PATH) {
        form.merge(check_bonus_picks(origin, bonus_1, bonus_2));
    }

    let talent = form.optional_choice::<Talent>(TALENT_PATH);
    if !form.rejected(TALENT_PATH) {
        form.merge(check_talent(origin, talent));
    }

    let Some(details) = details else {
        return Err(form.fail());
    };
    form.finish()?;

    document.origin = Some(origin);
    document.origin_details = Some(details);
    document.bonus_attr_1 = bonus_1;
    document.bonus_attr_2 = bonus_2;
    document.natural_talent = talent;
    if talent != Some(Talent::AttributeIncrement) {
        document.attribute_increment = None;
    }
    // The talent decides the spell cap; a pick list of the wrong size has
    // to be chosen again on the spells step.
    let cap = document.spell_cap();
    if document.spells.as_ref().is_some_and(|spells| spells.len() != cap) {
        document.spells = None;
    }
    Ok(StepAction::Advance)
}

fn read_origin_details(form: &mut FormReader, origin: Origin) -> Option<OriginDetails> {
    let mut details = form.nested("origin_details")?;
    let parsed = origin_details_fields(&mut details, origin);
    form.absorb(details);
    parsed
}

/// The fields of one origin's details. Derived values come from the lineage
/// table, whatever the input says.
fn origin_details_fields(form: &mut FormReader, origin: Origin) -> Option<OriginDetails> {
    let tag = form.choice::<Origin>("type")?;
    if tag != origin {
        form.reject(
            "type",
            RuleViolation::TagMismatch {
                expected: origin.name().to_string(),
                found: tag.name().to_string(),
            },
        );
        return None;
    }

    match origin {
        Origin::Innate => {
            let trademark_spell = form.text("trademark_spell");
            let technique_name = form.text("technique_name");
            Some(OriginDetails::Innate {
                trademark_spell: trademark_spell?,
                technique_name: technique_name?,
            })
        }
        Origin::Inherited => form.choice::<Clan>("clan").map(OriginDetails::inherited),
        Origin::NoTechnique => Some(OriginDetails::NoTechnique {
            vow: form.optional_text("vow"),
        }),
        Origin::Derived => {
            let source_technique = form.text("source_technique");
            let adaptation = form.text("adaptation");
            Some(OriginDetails::Derived {
                source_technique: source_technique?,
                adaptation: adaptation?,
            })
        }
        Origin::CursedWomb => {
            let curse_name = form.text("curse_name");
            let curse_grade = form
                .optional_choice::<CurseGrade>("curse_grade")
                .unwrap_or_default();
            Some(OriginDetails::cursed_womb(curse_name?, curse_grade))
        }
        Origin::MutantBody => {
            let primary_core = form.choice::<PrimaryCore>("primary_core");
            let core_name = form.text("core_name");
            let object_name = form.optional_text("object_name");
            Some(OriginDetails::mutant_body(
                primary_core?,
                core_name?,
                object_name,
            ))
        }
        Origin::Restricted => Some(OriginDetails::Restricted),
    }
}

fn attribute_increment(
    form: &mut FormReader,
    document: &mut CharacterDocument,
) -> Result<StepAction, FieldErrors> {
    let Some(attribute) = form.choice::<Attribute>("attribute_increment") else {
        return Err(form.fail());
    };

    if !document.has_talent(Talent::AttributeIncrement) {
        form.reject("attribute_increment", RuleViolation::IncrementNotGranted);
    }
    match document.attributes_before_increment() {
        None => form.reject("attributes", RuleViolation::Missing),
        Some(scores) => {
            if let Err(violation) = check_increment(&scores, attribute) {
                form.reject("attribute_increment", violation);
            }
        }
    }
    form.finish()?;

    document.attribute_increment = Some(attribute);
    Ok(StepAction::Advance)
}

fn specialization(
    form: &mut FormReader,
    document: &mut CharacterDocument,
) -> Result<StepAction, FieldErrors> {
    let Some(specialization) = form.choice::<Specialization>("specialization") else {
        return Err(form.fail());
    };
    if document.origin == Some(Origin::Restricted) && specialization != Specialization::Restricted
    {
        form.reject(
            "specialization",
            RuleViolation::SpecializationRequired {
                origin: Origin::Restricted,
                required: Specialization::Restricted,
            },
        );
        return Err(form.fail());
    }

    if form.intent().as_deref() == Some(SELECT_INTENT) {
        select_specialization(document, specialization);
        return Ok(StepAction::Stay);
    }

    let details = read_specialization_details(form, specialization);
    let Some(details) = details else {
        return Err(form.fail());
    };
    form.merge(details.check().prefixed("specialization_details"));
    form.finish()?;

    select_specialization(document, specialization);
    if let Some(equipment) = document.equipment.as_mut() {
        if equipment
            .craft_selection
            .is_some_and(|extra| details.crafts().contains(&extra))
        {
            equipment.craft_selection = None;
        }
    }
    document.specialization_details = Some(details);
    Ok(StepAction::Advance)
}

/// Record a specialization. A different one drops the old details and the
/// equipment chosen for them; Restricted drops every spell.
fn select_specialization(document: &mut CharacterDocument, specialization: Specialization) {
    if document.specialization != Some(specialization) {
        document.specialization_details = None;
        document.equipment = None;
    }
    if specialization == Specialization::Restricted {
        document.spells = None;
    }
    document.specialization = Some(specialization);
}

fn read_specialization_details(
    form: &mut FormReader,
    specialization: Specialization,
) -> Option<SpecializationDetails> {
    let mut details = form.nested("specialization_details")?;
    let parsed = specialization_details_fields(&mut details, specialization);
    form.absorb(details);
    parsed
}

/// The fields of one specialization's details. Picks that must differ from
/// each other are checked first and stop the rest of the form.
fn specialization_details_fields(
    form: &mut FormReader,
    specialization: Specialization,
) -> Option<SpecializationDetails> {
    let tag = form.choice::<Specialization>("type")?;
    if tag != specialization {
        form.reject(
            "type",
            RuleViolation::TagMismatch {
                expected: specialization.name().to_string(),
                found: tag.name().to_string(),
            },
        );
        return None;
    }

    let mut paired_crafts = (None, None);
    if specialization == Specialization::CombatSpecialist {
        paired_crafts = (form.choice::<Craft>("craft_1"), form.choice::<Craft>("craft_2"));
        if let (Some(first), Some(second)) = paired_crafts {
            let errors = distinct_crafts(first, second);
            if !errors.is_empty() {
                form.merge(errors);
                return None;
            }
        }
    }

    let mut foundation_changes = None;
    if specialization == Specialization::TechniqueSpecialist {
        foundation_changes = form.choices::<FoundationChange>("foundation_changes");
        if let Some(changes) = &foundation_changes {
            let errors = distinct_foundation_changes(changes);
            if !errors.is_empty() {
                form.merge(errors);
                return None;
            }
        }
    }

    let key_attribute = form.choice::<Attribute>("key_attribute");
    let resistance = (specialization != Specialization::Restricted)
        .then(|| form.choice::<Resistance>("resistance"))
        .flatten();
    let combat_skill = matches!(
        specialization,
        Specialization::Fighter | Specialization::CombatSpecialist
    )
    .then(|| form.choice::<Skill>("combat_skill"))
    .flatten();
    let craft = matches!(
        specialization,
        Specialization::Controller | Specialization::TechniqueSpecialist | Specialization::Support
    )
    .then(|| form.choice::<Craft>("craft"))
    .flatten();
    let free_skills = form.choices::<Skill>("free_skills");

    let key_attribute = key_attribute?;
    let free_skills = free_skills?;
    let details = match specialization {
        Specialization::Fighter => SpecializationDetails::Fighter {
            key_attribute,
            resistance: resistance?,
            combat_skill: combat_skill?,
            free_skills,
        },
        Specialization::Controller => SpecializationDetails::Controller {
            key_attribute,
            resistance: resistance?,
            craft: craft?,
            free_skills,
        },
        Specialization::CombatSpecialist => SpecializationDetails::CombatSpecialist {
            key_attribute,
            resistance: resistance?,
            combat_skill: combat_skill?,
            craft_1: paired_crafts.0?,
            craft_2: paired_crafts.1?,
            free_skills,
        },
        Specialization::TechniqueSpecialist => SpecializationDetails::TechniqueSpecialist {
            key_attribute,
            resistance: resistance?,
            foundation_changes: foundation_changes?,
            craft: craft?,
            free_skills,
        },
        Specialization::Support => SpecializationDetails::Support {
            key_attribute,
            resistance: resistance?,
            craft: craft?,
            free_skills,
        },
        Specialization::Restricted => SpecializationDetails::Restricted {
            key_attribute,
            free_skills,
        },
    };
    Some(details)
}

fn equipment(root: &FormReader, document: &mut CharacterDocument) -> Result<StepAction, FieldErrors> {
    let mut form = root.scoped("equipment");
    let equipment = Equipment {
        weapon_1: form.optional_choice("weapon_1"),
        weapon_2: form.optional_choice("weapon_2"),
        shield: form.optional_choice("shield"),
        uniform: form.optional_choice("uniform"),
        toolkit: form.optional_choice("toolkit"),
        craft_selection: form.optional_choice("craft_selection"),
    };
    form.finish()?;

    // Completeness is a document rule and is checked by the validator.
    document.equipment = Some(equipment);
    Ok(StepAction::Advance)
}

fn spells(form: &mut FormReader, document: &mut CharacterDocument) -> Result<StepAction, FieldErrors> {
    let cap = document.spell_cap();
    let spells = if cap == 0 {
        form.optional_choices::<Spell>("spells")
    } else {
        form.choices::<Spell>("spells")
    };
    let Some(spells) = spells else {
        return Err(form.fail());
    };

    if spells.len() < cap {
        form.reject(
            "spells",
            RuleViolation::SpellCountMismatch {
                expected: cap,
                got: spells.len(),
            },
        );
    }
    form.finish()?;

    document.spells = Some(spells);
    Ok(StepAction::Advance)
}

fn final_details(
    root: &FormReader,
    document: &mut CharacterDocument,
) -> Result<StepAction, FieldErrors> {
    let mut form = root.scoped("final_details");
    let vow = form.optional_text("vow");
    let inner_domain = form.optional_text("inner_domain");
    let anatomy = form.optional_choice::<Anatomy>("anatomy");
    let cores = form.optional_text_list("cores");

    let Some(cores) = cores else {
        return Err(form.fail());
    };
    form.finish()?;

    document.final_details = Some(FinalDetails {
        vow,
        inner_domain,
        anatomy,
        cores,
    });
    Ok(StepAction::Advance)
}

fn appearance(root: &FormReader, document: &mut CharacterDocument) -> Result<StepAction, FieldErrors> {
    let mut form = root.scoped("appearance");
    let mut appearance = Appearance::default();
    for field in Appearance::FIELDS {
        if let Some(slot) = appearance.field_mut(field) {
            *slot = form.optional_text(field);
        }
    }
    form.finish()?;

    document.appearance = Some(appearance);
    Ok(StepAction::Advance)
}

fn review(form: &FormReader, document: &mut CharacterDocument) -> Result<StepAction, FieldErrors> {
    if form.intent().as_deref() == Some(RESTART_INTENT) {
        *document = CharacterDocument::new();
        return Ok(StepAction::Restart);
    }
    Ok(StepAction::Finish)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Shield, Weapon};
    use crate::testing::{self, fixtures};
    use serde_json::json;

    fn run(step: StepId, input: Value, document: &CharacterDocument) -> Result<(StepAction, CharacterDocument), FieldErrors> {
        let mut working = document.clone();
        let action = apply(step, &input, &mut working)?;
        Ok((action, working))
    }

    #[test]
    fn test_base_requires_both_names() {
        let errors = run(StepId::Base, json!({ "player_name": "Ana" }), &CharacterDocument::new())
            .unwrap_err();
        assert_eq!(errors.get("character_name"), &[RuleViolation::Missing]);
        assert!(!errors.contains("player_name"));

        let (action, doc) =
            run(StepId::Base, fixtures::base(), &CharacterDocument::new()).expect("Should accept");
        assert_eq!(action, StepAction::Advance);
        assert!(doc.player_name.is_some());
    }

    #[test]
    fn test_non_object_input_rejected() {
        let errors = run(StepId::Base, json!("hello"), &CharacterDocument::new()).unwrap_err();
        assert!(errors.contains(crate::validation::GLOBAL_PATH));
    }

    #[test]
    fn test_personal_paths_are_nested() {
        let errors = run(
            StepId::Personal,
            json!({ "personality_traits": ["Loud"], "ideals": [], "bonds": ["Sister"] }),
            &CharacterDocument::new(),
        )
        .unwrap_err();
        assert_eq!(errors.get("personality.ideals"), &[RuleViolation::Empty]);
        assert_eq!(
            errors.get("personality.complications"),
            &[RuleViolation::Missing]
        );
    }

    #[test]
    fn test_point_buy_budget() {
        let input = fixtures::point_buy([15, 15, 13, 12, 10, 8]);
        let errors = run(StepId::Attributes, input, &CharacterDocument::new()).unwrap_err();
        assert_eq!(
            errors.get("attributes"),
            &[RuleViolation::PointBudgetMismatch {
                total: 19,
                budget: 17
            }]
        );

        let input = fixtures::point_buy([15, 14, 13, 12, 10, 8]);
        let (_, doc) = run(StepId::Attributes, input, &CharacterDocument::new()).expect("Should accept");
        assert_eq!(doc.attribute_method, Some(GenerationMethod::PointBuy));
    }

    #[test]
    fn test_point_buy_value_out_of_table() {
        let input = fixtures::point_buy([16, 14, 12, 12, 10, 8]);
        let errors = run(StepId::Attributes, input, &CharacterDocument::new()).unwrap_err();
        assert_eq!(
            errors.get("attributes.str"),
            &[RuleViolation::InvalidPointBuyValue { value: 16 }]
        );
        assert!(!errors.contains("attributes"));
    }

    #[test]
    fn test_rolled_values_must_match_stored_roll() {
        let errors = run(StepId::Attributes, fixtures::rolled([18; 6]), &CharacterDocument::new())
            .unwrap_err();
        assert_eq!(errors.get("attributes"), &[RuleViolation::NoRollToAssign]);

        let rolled = CharacterDocument {
            pending_roll: Some([15, 13, 12, 11, 9, 6]),
            ..Default::default()
        };
        let errors = run(StepId::Attributes, fixtures::rolled([18; 6]), &rolled).unwrap_err();
        assert_eq!(
            errors.get("attributes"),
            &[RuleViolation::NotRolledValues {
                rolled: [15, 13, 12, 11, 9, 6]
            }]
        );

        let (_, doc) = run(
            StepId::Attributes,
            fixtures::rolled([9, 15, 6, 12, 13, 11]),
            &rolled,
        )
        .expect("Should accept a reordering of the roll");
        assert_eq!(doc.attribute_method, Some(GenerationMethod::Rolled));
        assert_eq!(doc.attributes, Some(AttributeVector::new(9, 15, 6, 12, 13, 11)));
    }

    #[test]
    fn test_rolled_range_reported_before_roll_match() {
        let rolled = CharacterDocument {
            pending_roll: Some([15, 13, 12, 11, 9, 6]),
            ..Default::default()
        };
        let errors = run(StepId::Attributes, fixtures::rolled([19, 13, 12, 11, 9, 6]), &rolled)
            .unwrap_err();
        assert!(errors.contains("attributes.str"));
        assert!(!errors.contains("attributes"));
    }

    #[test]
    fn test_talent_change_clears_spells_over_cap() {
        let mut doc = testing::innate_fighter_document();
        doc.natural_talent = Some(Talent::TechniqueAffinity);
        doc.spells = Some(vec![Spell::EnergyStrike, Spell::EnergyShield, Spell::DetectCurse]);
        assert_eq!(doc.spell_cap(), 3);

        let (_, doc) = run(StepId::Origin, fixtures::innate_origin(Talent::EmergencyVow), &doc)
            .expect("Should accept");
        assert_eq!(doc.spell_cap(), 2);
        assert_eq!(doc.spells, None);
        assert!(crate::validator::document_errors(&doc).is_empty());
    }

    #[test]
    fn test_talent_change_keeps_spells_within_cap() {
        let doc = testing::innate_fighter_document();
        let (_, after) = run(StepId::Origin, fixtures::innate_origin(Talent::EmergencyVow), &doc)
            .expect("Should accept");
        assert_eq!(after.spells, doc.spells);
    }

    #[test]
    fn test_duplicate_bonus_reported_on_second_field() {
        let mut input = fixtures::innate_origin(Talent::EmergencyVow);
        input["bonus_attr_2"] = json!("str");
        let errors = run(StepId::Origin, input, &testing::through_attributes()).unwrap_err();
        assert_eq!(
            errors.get(BONUS_2_PATH),
            &[RuleViolation::DuplicateBonusAttribute(Attribute::Strength)]
        );
        assert!(!errors.contains(BONUS_1_PATH));
    }

    #[test]
    fn test_origin_select_then_locked() {
        let doc = testing::through_attributes();
        let (action, doc) = run(
            StepId::Origin,
            json!({ "origin": "derived", "intent": "select" }),
            &doc,
        )
        .expect("Should select");
        assert_eq!(action, StepAction::Stay);
        assert_eq!(doc.origin, Some(Origin::Derived));
        assert!(doc.origin_details.is_none());

        let errors = run(StepId::Origin, fixtures::innate_origin(Talent::EmergencyVow), &doc)
            .unwrap_err();
        assert_eq!(
            errors.get("origin"),
            &[RuleViolation::OriginLocked {
                chosen: Origin::Derived
            }]
        );
    }

    #[test]
    fn test_origin_detail_tag_must_match() {
        let mut input = fixtures::innate_origin(Talent::EmergencyVow);
        input["origin_details"]["type"] = json!("derived");
        let errors = run(StepId::Origin, input, &testing::through_attributes()).unwrap_err();
        assert!(errors.contains("origin_details.type"));
    }

    #[test]
    fn test_derived_values_filled_from_lineage() {
        let input = json!({
            "origin": "inherited",
            "origin_details": { "type": "inherited", "clan": "Gojo", "clan_spell": "Red Blood" },
            "bonus_attr_1": "dex",
            "bonus_attr_2": "wis",
            "natural_talent": "Cursed Artisan",
        });
        let (_, doc) = run(StepId::Origin, input, &testing::through_attributes()).expect("Should accept");
        assert_eq!(
            doc.origin_details,
            Some(OriginDetails::inherited(Clan::Gojo))
        );
    }

    #[test]
    fn test_cursed_womb_grade_defaults() {
        let input = json!({
            "origin": "cursed-womb",
            "origin_details": { "type": "cursed-womb", "curse_name": "Hollow" },
        });
        let (_, doc) = run(StepId::Origin, input, &testing::through_attributes()).expect("Should accept");
        assert_eq!(
            doc.origin_details,
            Some(OriginDetails::cursed_womb("Hollow", CurseGrade::default()))
        );
    }

    #[test]
    fn test_restricted_origin_without_details() {
        let (_, doc) = run(
            StepId::Origin,
            json!({ "origin": "restricted" }),
            &testing::through_attributes(),
        )
        .expect("Should accept");
        assert_eq!(doc.origin_details, Some(OriginDetails::Restricted));

        let errors = run(StepId::Specialization, fixtures::fighter(), &doc).unwrap_err();
        assert!(matches!(
            errors.get("specialization"),
            [RuleViolation::SpecializationRequired { .. }]
        ));
    }

    #[test]
    fn test_changing_talent_drops_increment() {
        let mut doc = testing::through_origin(Talent::AttributeIncrement);
        doc.attribute_increment = Some(Attribute::Wisdom);
        let (_, doc) = run(StepId::Origin, fixtures::innate_origin(Talent::EmergencyVow), &doc)
            .expect("Should accept");
        assert_eq!(doc.attribute_increment, None);
    }

    #[test]
    fn test_combat_specialist_crafts_checked_first() {
        let input = json!({
            "specialization": "combat-specialist",
            "specialization_details": {
                "type": "combat-specialist",
                "craft_1": "Tailor",
                "craft_2": "Tailor",
                "key_attribute": "pre",
            },
        });
        let errors = run(StepId::Specialization, input, &testing::through_origin(Talent::EmergencyVow))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("specialization_details.craft_2"),
            &[RuleViolation::DuplicateCraft(Craft::Tailor)]
        );
    }

    #[test]
    fn test_foundation_changes_checked_first() {
        let input = json!({
            "specialization": "technique-specialist",
            "specialization_details": {
                "type": "technique-specialist",
                "foundation_changes": ["Quick Spell"],
            },
        });
        let errors = run(StepId::Specialization, input, &testing::through_origin(Talent::EmergencyVow))
            .unwrap_err();
        assert_eq!(
            errors.get("specialization_details.foundation_changes"),
            &[RuleViolation::FoundationChangeCount {
                expected: 2,
                got: 1
            }]
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_support_exclusions() {
        let errors = run(
            StepId::Specialization,
            fixtures::support(&["Medicine", "Perception"]),
            &testing::through_origin(Talent::EmergencyVow),
        )
        .unwrap_err();
        assert_eq!(
            errors.get("specialization_details.free_skills"),
            &[
                RuleViolation::FreeSkillExcluded(Skill::Medicine),
                RuleViolation::FreeSkillExcluded(Skill::Perception),
            ]
        );
    }

    #[test]
    fn test_specialization_change_clears_equipment() {
        let doc = testing::innate_fighter_document();
        let (_, changed) = run(
            StepId::Specialization,
            fixtures::support(&["Stealth", "History"]),
            &doc,
        )
        .expect("Should accept");
        assert_eq!(changed.equipment, None);
        assert_eq!(changed.specialization, Some(Specialization::Support));

        // Same specialization again keeps the equipment.
        let (_, same) = run(StepId::Specialization, fixtures::fighter(), &doc).expect("Should accept");
        assert_eq!(same.equipment, doc.equipment);
    }

    #[test]
    fn test_restricted_specialization_clears_spells() {
        let mut doc = testing::innate_fighter_document();
        doc.origin = Some(Origin::Restricted);
        let (action, doc) = run(
            StepId::Specialization,
            json!({ "specialization": "restricted", "intent": "select" }),
            &doc,
        )
        .expect("Should select");
        assert_eq!(action, StepAction::Stay);
        assert_eq!(doc.spells, None);
        assert_eq!(doc.specialization_details, None);
    }

    #[test]
    fn test_equipment_reads_catalog_values() {
        let input = json!({ "weapon_1": "Katana", "shield": "Light Shield", "uniform": "Common Uniform", "toolkit": "Blacksmith's Tools" });
        let (_, doc) = run(StepId::Equipment, input, &testing::through_specialization())
            .expect("Should accept");
        let equipment = doc.equipment.expect("Should have equipment");
        assert_eq!(equipment.weapon_1, Some(Weapon::Katana));
        assert_eq!(equipment.shield, Some(Shield::Light));

        let errors = run(
            StepId::Equipment,
            json!({ "weapon_1": "Chainsaw" }),
            &testing::through_specialization(),
        )
        .unwrap_err();
        assert!(errors.contains("equipment.weapon_1"));
    }

    #[test]
    fn test_spell_count_must_reach_cap() {
        let doc = testing::through_equipment();
        let errors = run(StepId::Spells, json!({ "spells": ["Energy Strike"] }), &doc).unwrap_err();
        assert_eq!(
            errors.get("spells"),
            &[RuleViolation::SpellCountMismatch {
                expected: 2,
                got: 1
            }]
        );
    }

    #[test]
    fn test_non_caster_takes_no_spells() {
        let mut doc = testing::through_equipment();
        doc.origin = Some(Origin::NoTechnique);
        let (_, doc) = run(StepId::Spells, json!({}), &doc).expect("Should accept");
        assert_eq!(doc.spells, Some(vec![]));
    }

    #[test]
    fn test_appearance_fields() {
        let (_, doc) = run(
            StepId::Appearance,
            json!({ "height": "1.80m", "eye_color": " ", "unknown": "x" }),
            &CharacterDocument::new(),
        )
        .expect("Should accept");
        let appearance = doc.appearance.expect("Should have appearance");
        assert_eq!(appearance.height.as_deref(), Some("1.80m"));
        assert_eq!(appearance.eye_color, None);
    }

    #[test]
    fn test_review_restart_clears_document() {
        let (action, doc) = run(
            StepId::Review,
            json!({ "intent": "restart" }),
            &testing::innate_fighter_document(),
        )
        .expect("Should restart");
        assert_eq!(action, StepAction::Restart);
        assert_eq!(doc, CharacterDocument::new());

        let (action, _) = run(StepId::Review, json!({}), &testing::innate_fighter_document())
            .expect("Should finish");
        assert_eq!(action, StepAction::Finish);
    }
}
