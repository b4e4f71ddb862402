//! The step graph.
//!
//! Each step names its successor, either fixed or chosen by a predicate over
//! the document, and may carry a guard that sends direct entry elsewhere when
//! its preconditions are not met. The resolver knows nothing about individual
//! steps: adding a conditional step means adding a definition, not code.
//!
//! Failures here are configuration defects. They are reported as
//! [`GraphError`] and never turned into a default step.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{normalize_label, Talent};
use crate::document::CharacterDocument;
use crate::origin::Origin;
use crate::specialization::Specialization;
use crate::validator;

/// Identifier of a wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Base,
    Personal,
    Attributes,
    Origin,
    AttributeIncrement,
    Specialization,
    Equipment,
    Spells,
    FinalDetails,
    Appearance,
    Review,
}

impl StepId {
    pub fn id(&self) -> &'static str {
        match self {
            StepId::Base => "base",
            StepId::Personal => "personal",
            StepId::Attributes => "attributes",
            StepId::Origin => "origin",
            StepId::AttributeIncrement => "attribute-increment",
            StepId::Specialization => "specialization",
            StepId::Equipment => "equipment",
            StepId::Spells => "spells",
            StepId::FinalDetails => "final-details",
            StepId::Appearance => "appearance",
            StepId::Review => "review",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StepId::Base => "Player and Character",
            StepId::Personal => "Personality",
            StepId::Attributes => "Attributes",
            StepId::Origin => "Origin",
            StepId::AttributeIncrement => "Attribute Increment",
            StepId::Specialization => "Specialization",
            StepId::Equipment => "Equipment",
            StepId::Spells => "Spells",
            StepId::FinalDetails => "Final Details",
            StepId::Appearance => "Appearance",
            StepId::Review => "Review",
        }
    }

    pub fn all() -> &'static [StepId] {
        &[
            StepId::Base,
            StepId::Personal,
            StepId::Attributes,
            StepId::Origin,
            StepId::AttributeIncrement,
            StepId::Specialization,
            StepId::Equipment,
            StepId::Spells,
            StepId::FinalDetails,
            StepId::Appearance,
            StepId::Review,
        ]
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for StepId {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        StepId::all()
            .iter()
            .copied()
            .find(|step| normalize_label(step.id()) == wanted)
            .ok_or_else(|| GraphError::UnknownStep(s.trim().to_string()))
    }
}

/// Defects in the step graph or in a request against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("step '{0}' has no definition")]
    MissingStep(StepId),

    #[error("step '{from}' leads to '{to}', which has no definition")]
    DanglingTransition { from: StepId, to: StepId },

    #[error("step '{0}' is defined more than once")]
    DuplicateStep(StepId),

    #[error("guards starting at '{0}' redirect in a loop")]
    RedirectLoop(StepId),

    #[error("step '{0}' cannot be reached from the start")]
    UnreachableStep(StepId),
}

/// A condition over the document.
pub type Predicate = Arc<dyn Fn(&CharacterDocument) -> bool + Send + Sync>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate(f: impl Fn(&CharacterDocument) -> bool + Send + Sync + 'static) -> Predicate {
    Arc::new(f)
}

/// How a step picks its successor.
#[derive(Clone)]
pub enum Transition {
    Fixed(StepId),
    Branch {
        when: Predicate,
        then: StepId,
        otherwise: StepId,
    },
}

impl Transition {
    pub fn to(step: StepId) -> Self {
        Transition::Fixed(step)
    }

    pub fn branch(when: Predicate, then: StepId, otherwise: StepId) -> Self {
        Transition::Branch {
            when,
            then,
            otherwise,
        }
    }

    /// Successor for this document.
    pub fn evaluate(&self, document: &CharacterDocument) -> StepId {
        match self {
            Transition::Fixed(step) => *step,
            Transition::Branch {
                when,
                then,
                otherwise,
            } => {
                if when(document) {
                    *then
                } else {
                    *otherwise
                }
            }
        }
    }

    /// Every step this transition can lead to.
    pub fn targets(&self) -> Vec<StepId> {
        match self {
            Transition::Fixed(step) => vec![*step],
            Transition::Branch {
                then, otherwise, ..
            } => vec![*then, *otherwise],
        }
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Fixed(step) => f.debug_tuple("Fixed").field(step).finish(),
            Transition::Branch {
                then, otherwise, ..
            } => f
                .debug_struct("Branch")
                .field("then", then)
                .field("otherwise", otherwise)
                .finish_non_exhaustive(),
        }
    }
}

/// Precondition for entering a step.
#[derive(Clone)]
pub struct Guard {
    pub requires: Predicate,
    /// Where to send the player when `requires` does not hold.
    pub redirect: StepId,
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

/// One node of the graph.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub id: StepId,
    pub next: Transition,
    pub guard: Option<Guard>,
}

impl StepDefinition {
    pub fn new(id: StepId, next: Transition) -> Self {
        Self {
            id,
            next,
            guard: None,
        }
    }

    pub fn with_guard(mut self, requires: Predicate, redirect: StepId) -> Self {
        self.guard = Some(Guard { requires, redirect });
        self
    }

    /// Whether the document meets this step's precondition.
    pub fn admits(&self, document: &CharacterDocument) -> bool {
        self.guard
            .as_ref()
            .map_or(true, |guard| (guard.requires)(document))
    }
}

/// Something the routing layer may ask to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Step(StepId),
    /// Detail form for one origin, part of the origin step.
    OriginDetails(Origin),
    /// Detail form for one specialization, part of the specialization step.
    SpecializationDetails(Specialization),
}

/// A validated set of step definitions.
#[derive(Debug, Clone)]
pub struct StepGraph {
    start: StepId,
    steps: Vec<StepDefinition>,
}

impl StepGraph {
    /// Build a graph, rejecting duplicate steps, transitions or guards that
    /// lead nowhere, and steps nothing leads to.
    pub fn new(start: StepId, steps: Vec<StepDefinition>) -> Result<Self, GraphError> {
        for (index, step) in steps.iter().enumerate() {
            if steps[..index].iter().any(|other| other.id == step.id) {
                return Err(GraphError::DuplicateStep(step.id));
            }
        }

        let graph = Self { start, steps };
        graph.step(start)?;

        for step in &graph.steps {
            let redirect = step.guard.as_ref().map(|guard| guard.redirect);
            for target in step.next.targets().into_iter().chain(redirect) {
                if graph.step(target).is_err() {
                    return Err(GraphError::DanglingTransition {
                        from: step.id,
                        to: target,
                    });
                }
            }
        }

        let mut reached = vec![start];
        let mut pending = vec![start];
        while let Some(id) = pending.pop() {
            let step = graph.step(id)?;
            let redirect = step.guard.as_ref().map(|guard| guard.redirect);
            for target in step.next.targets().into_iter().chain(redirect) {
                if !reached.contains(&target) {
                    reached.push(target);
                    pending.push(target);
                }
            }
        }
        if let Some(step) = graph.steps.iter().find(|step| !reached.contains(&step.id)) {
            return Err(GraphError::UnreachableStep(step.id));
        }

        Ok(graph)
    }

    /// The wizard's graph. The table is fixed, so a defect in it is a bug
    /// in this crate and panics.
    pub fn standard() -> Self {
        Self::try_standard().unwrap_or_else(|err| panic!("standard step table is malformed: {err}"))
    }

    /// The wizard's steps in their canonical order, with the attribute
    /// increment inserted only for the Attribute Increment talent.
    pub fn try_standard() -> Result<Self, GraphError> {
        let has_increment = || predicate(|doc| doc.has_talent(Talent::AttributeIncrement));

        let steps = vec![
            StepDefinition::new(StepId::Base, Transition::to(StepId::Personal)),
            StepDefinition::new(StepId::Personal, Transition::to(StepId::Attributes)),
            StepDefinition::new(StepId::Attributes, Transition::to(StepId::Origin)),
            StepDefinition::new(
                StepId::Origin,
                Transition::branch(
                    has_increment(),
                    StepId::AttributeIncrement,
                    StepId::Specialization,
                ),
            ),
            StepDefinition::new(
                StepId::AttributeIncrement,
                Transition::to(StepId::Specialization),
            )
            .with_guard(has_increment(), StepId::Specialization),
            StepDefinition::new(StepId::Specialization, Transition::to(StepId::Equipment))
                .with_guard(
                    predicate(|doc| doc.origin_details.is_some()),
                    StepId::Origin,
                ),
            StepDefinition::new(StepId::Equipment, Transition::to(StepId::Spells)).with_guard(
                predicate(|doc| doc.specialization_details.is_some()),
                StepId::Specialization,
            ),
            StepDefinition::new(StepId::Spells, Transition::to(StepId::FinalDetails))
                .with_guard(predicate(|doc| doc.equipment.is_some()), StepId::Equipment),
            StepDefinition::new(StepId::FinalDetails, Transition::to(StepId::Appearance))
                .with_guard(predicate(|doc| doc.spells.is_some()), StepId::Spells),
            StepDefinition::new(StepId::Appearance, Transition::to(StepId::Review)),
            StepDefinition::new(StepId::Review, Transition::to(StepId::Review))
                .with_guard(predicate(validator::is_complete), StepId::Base),
        ];

        Self::new(StepId::Base, steps)
    }

    pub fn start(&self) -> StepId {
        self.start
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Result<&StepDefinition, GraphError> {
        self.steps
            .iter()
            .find(|step| step.id == id)
            .ok_or(GraphError::MissingStep(id))
    }

    /// The step that follows `current` for this document.
    pub fn resolve_next(
        &self,
        current: StepId,
        document: &CharacterDocument,
    ) -> Result<StepId, GraphError> {
        let next = self.step(current)?.next.evaluate(document);
        if self.step(next).is_err() {
            warn!("Step '{current}' resolved to undefined step '{next}'");
            return Err(GraphError::DanglingTransition {
                from: current,
                to: next,
            });
        }
        debug!("Resolved '{current}' -> '{next}'");
        Ok(next)
    }

    /// The step actually shown when `requested` is entered directly,
    /// following guard redirects.
    pub fn entry(&self, requested: StepId, document: &CharacterDocument) -> Result<StepId, GraphError> {
        let mut current = requested;
        for _ in 0..=self.steps.len() {
            let step = self.step(current)?;
            match &step.guard {
                Some(guard) if !(guard.requires)(document) => {
                    debug!("Guard on '{current}' redirects to '{}'", guard.redirect);
                    current = guard.redirect;
                }
                _ => return Ok(current),
            }
        }
        warn!("Redirect loop entering '{requested}'");
        Err(GraphError::RedirectLoop(requested))
    }

    /// Like [`entry`](Self::entry) for pages, including the per-origin and
    /// per-specialization detail forms, which need the matching selection.
    pub fn entry_page(&self, page: Page, document: &CharacterDocument) -> Result<Page, GraphError> {
        match page {
            Page::Step(step) => Ok(Page::Step(self.entry(step, document)?)),
            Page::OriginDetails(origin) => {
                let step = self.entry(StepId::Origin, document)?;
                if step == StepId::Origin && document.origin == Some(origin) {
                    Ok(page)
                } else {
                    debug!("No {origin} origin selected; showing '{step}'");
                    Ok(Page::Step(step))
                }
            }
            Page::SpecializationDetails(specialization) => {
                let step = self.entry(StepId::Specialization, document)?;
                if step == StepId::Specialization
                    && document.specialization == Some(specialization)
                {
                    Ok(page)
                } else {
                    debug!("No {specialization} specialization selected; showing '{step}'");
                    Ok(Page::Step(step))
                }
            }
        }
    }
}

impl Default for StepGraph {
    fn default() -> Self {
        Self::standard()
    }
}
