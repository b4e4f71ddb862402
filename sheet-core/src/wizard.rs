//! Committing steps.
//!
//! [`Wizard::commit_step`] is the one entry point that moves a character
//! forward: parse the step input, apply the step rules, merge into a copy of
//! the document, validate the whole copy and resolve the next step. Any
//! failure leaves the caller's document untouched.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::CharacterDocument;
use crate::graph::{GraphError, StepGraph, StepId};
use crate::steps::{self, StepAction};
use crate::validation::FieldErrors;
use crate::validator;

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub document: CharacterDocument,
    /// Step to show next.
    pub next: StepId,
    /// The step's guard did not admit the document; nothing was merged and
    /// `next` is where the player belongs instead.
    pub redirected: bool,
}

/// Why a commit failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The input broke one or more rules. The wizard stays on the step.
    #[error("invalid input: {0}")]
    Invalid(FieldErrors),

    /// The step graph is misconfigured.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl CommitError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CommitError::Invalid(errors) => Some(errors),
            CommitError::Graph(_) => None,
        }
    }
}

impl From<FieldErrors> for CommitError {
    fn from(errors: FieldErrors) -> Self {
        CommitError::Invalid(errors)
    }
}

/// Drives documents through a step graph.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    graph: StepGraph,
}

impl Wizard {
    pub fn new(graph: StepGraph) -> Self {
        Self { graph }
    }

    pub fn standard() -> Self {
        Self::new(StepGraph::standard())
    }

    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    pub fn resolve_next(
        &self,
        step: StepId,
        document: &CharacterDocument,
    ) -> Result<StepId, GraphError> {
        self.graph.resolve_next(step, document)
    }

    /// Commit `input` for `step` against `document`.
    pub fn commit_step(
        &self,
        step: StepId,
        input: &Value,
        document: &CharacterDocument,
    ) -> Result<Committed, CommitError> {
        let entry = self.graph.entry(step, document)?;
        if entry != step {
            debug!("Commit on '{step}' redirected to '{entry}'");
            return Ok(Committed {
                document: document.clone(),
                next: entry,
                redirected: true,
            });
        }

        let mut candidate = document.clone();
        let action = steps::apply(step, input, &mut candidate).map_err(|errors| {
            warn!("Rejected '{step}' input: {} invalid fields", errors.len());
            CommitError::Invalid(errors)
        })?;

        let validated = match action {
            StepAction::Finish => validator::validate_complete(candidate),
            _ => validator::validate_document(candidate),
        };
        let candidate = validated.map_err(|errors| {
            warn!("Rejected '{step}' document: {} invalid fields", errors.len());
            CommitError::Invalid(errors)
        })?;

        let next = match action {
            StepAction::Stay => step,
            StepAction::Restart => self.graph.start(),
            StepAction::Advance | StepAction::Finish => {
                self.graph.resolve_next(step, &candidate).inspect_err(|err| {
                    warn!("Step graph defect after '{step}': {err}");
                })?
            }
        };

        debug!("Committed '{step}', next '{next}'");
        Ok(Committed {
            document: candidate,
            next,
            redirected: false,
        })
    }
}

/// [`Wizard::commit_step`] on the standard graph.
pub fn commit_step(
    step: StepId,
    input: &Value,
    document: &CharacterDocument,
) -> Result<Committed, CommitError> {
    Wizard::standard().commit_step(step, input, document)
}

/// [`StepGraph::resolve_next`] on the standard graph.
pub fn resolve_next(step: StepId, document: &CharacterDocument) -> Result<StepId, GraphError> {
    StepGraph::standard().resolve_next(step, document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Talent;
    use crate::graph::{predicate, StepDefinition, Transition};
    use crate::testing::{self, fixtures};
    use crate::validation::RuleViolation;
    use serde_json::json;

    #[test]
    fn test_commit_advances() {
        let committed = commit_step(StepId::Base, &fixtures::base(), &CharacterDocument::new())
            .expect("Should commit");
        assert_eq!(committed.next, StepId::Personal);
        assert!(!committed.redirected);
        assert!(committed.document.character_name.is_some());
    }

    #[test]
    fn test_rejected_commit_leaves_document() {
        let doc = testing::through_attributes();
        let err = commit_step(StepId::Origin, &json!({ "origin": "innate" }), &doc).unwrap_err();
        let errors = err.field_errors().expect("Should be field errors");
        assert!(errors.contains("origin_details"));
        assert_eq!(doc, testing::through_attributes());
    }

    #[test]
    fn test_validator_runs_after_merge() {
        // Two weapons plus a proficient shield is one item too many.
        let mut input = fixtures::equipment();
        input["shield"] = json!("Light Shield");
        let err = commit_step(StepId::Equipment, &input, &testing::through_specialization())
            .unwrap_err();
        assert_eq!(
            err.field_errors().map(|e| e.get("equipment").to_vec()),
            Some(vec![RuleViolation::EquipmentItemCount { got: 3 }])
        );
    }

    #[test]
    fn test_guard_redirects_without_merging() {
        let committed = commit_step(StepId::Spells, &json!({ "spells": [] }), &CharacterDocument::new())
            .expect("Should redirect");
        assert!(committed.redirected);
        assert_eq!(committed.next, StepId::Origin);
        assert_eq!(committed.document, CharacterDocument::new());
    }

    #[test]
    fn test_select_stays_on_step() {
        let committed = commit_step(
            StepId::Origin,
            &json!({ "origin": "innate", "intent": "select" }),
            &testing::through_attributes(),
        )
        .expect("Should commit");
        assert_eq!(committed.next, StepId::Origin);
    }

    #[test]
    fn test_origin_branch() {
        let doc = testing::through_attributes();
        let committed = commit_step(
            StepId::Origin,
            &fixtures::innate_origin(Talent::AttributeIncrement),
            &doc,
        )
        .expect("Should commit");
        assert_eq!(committed.next, StepId::AttributeIncrement);

        let committed = commit_step(StepId::Origin, &fixtures::innate_origin(Talent::EmergencyVow), &doc)
            .expect("Should commit");
        assert_eq!(committed.next, StepId::Specialization);
    }

    #[test]
    fn test_review_finishes_on_itself() {
        let committed = commit_step(StepId::Review, &json!({}), &testing::innate_fighter_document())
            .expect("Should commit");
        assert_eq!(committed.next, StepId::Review);
    }

    #[test]
    fn test_graph_defect_is_not_a_field_error() {
        let graph = StepGraph::new(
            StepId::Base,
            vec![StepDefinition::new(StepId::Base, Transition::to(StepId::Base))
                .with_guard(predicate(|_| true), StepId::Base)],
        )
        .expect("Should build");
        let wizard = Wizard::new(graph);
        let err = wizard
            .commit_step(StepId::Personal, &json!({}), &CharacterDocument::new())
            .unwrap_err();
        assert_eq!(err, CommitError::Graph(GraphError::MissingStep(StepId::Personal)));
        assert!(err.field_errors().is_none());
    }
}
