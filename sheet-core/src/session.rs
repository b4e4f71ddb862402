//! WizardSession - one player's pass through the wizard.
//!
//! A session ties the [`Wizard`] to a [`SessionStore`]: it remembers the
//! current step, commits input against the stored document and writes the
//! result back after every accepted commit. The document itself only ever
//! changes through [`Wizard::commit_step`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::WizardConfig;
use crate::dice::{self, AttributeRoll, DiceSource};
use crate::document::CharacterDocument;
use crate::graph::{GraphError, Page, StepId};
use crate::persist::{PersistError, SavedSheet};
use crate::store::{SessionStore, StoreError};
use crate::validation::FieldErrors;
use crate::validator;
use crate::wizard::{CommitError, Wizard};

/// Errors from WizardSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Step graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Saved sheet is invalid: {0}")]
    InvalidSheet(FieldErrors),
}

/// Key of a session in its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of submitting input for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The session moved to `next`. With `redirected` set the input was not
    /// applied because the current step was not reachable.
    Accepted { next: StepId, redirected: bool },
    /// The input broke rules; the session stays on its step.
    Rejected(FieldErrors),
}

/// A wizard session backed by a store.
pub struct WizardSession<S: SessionStore> {
    id: SessionId,
    wizard: Wizard,
    store: S,
    dice: Box<dyn DiceSource>,
    step: StepId,
    document: CharacterDocument,
}

impl<S: SessionStore> WizardSession<S> {
    /// Start a fresh session.
    pub fn new(config: &WizardConfig, store: S) -> Self {
        let wizard = Wizard::standard();
        Self {
            id: SessionId::new(),
            step: wizard.graph().start(),
            wizard,
            store,
            dice: config.dice(),
            document: CharacterDocument::new(),
        }
    }

    /// Replace the dice, e.g. with scripted draws.
    pub fn with_dice(mut self, dice: Box<dyn DiceSource>) -> Self {
        self.dice = dice;
        self
    }

    /// Pick up the session stored under `id`, or start it empty when the
    /// store has nothing for it.
    pub fn resume(config: &WizardConfig, store: S, id: SessionId) -> Result<Self, SessionError> {
        let stored = store.get(&id.to_string())?;
        let mut session = Self::new(config, store);
        session.id = id;

        if let Some(content) = stored {
            let saved = SavedSheet::from_json(&content)?;
            session.restore(saved)?;
            info!("Resumed session {id} at '{}'", session.step);
        }
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn current_step(&self) -> StepId {
        self.step
    }

    pub fn document(&self) -> &CharacterDocument {
        &self.document
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The current state as a save envelope.
    pub fn snapshot(&self) -> SavedSheet {
        SavedSheet::new(self.document.clone(), self.step)
    }

    /// Replace the session state with a saved sheet.
    ///
    /// The document must pass validation; the saved step is re-entered
    /// through its guard.
    pub fn restore(&mut self, saved: SavedSheet) -> Result<(), SessionError> {
        let document =
            validator::validate_document(saved.document).map_err(SessionError::InvalidSheet)?;
        self.step = self.wizard.graph().entry(saved.step, &document)?;
        self.document = document;
        self.persist()
    }

    /// Move to a step, following guard redirects. Returns where the session
    /// ended up.
    pub fn goto(&mut self, step: StepId) -> Result<StepId, SessionError> {
        self.step = self.wizard.graph().entry(step, &self.document)?;
        Ok(self.step)
    }

    /// Where a page request actually lands.
    pub fn page(&self, page: Page) -> Result<Page, SessionError> {
        Ok(self.wizard.graph().entry_page(page, &self.document)?)
    }

    /// Commit input for the current step.
    pub fn submit(&mut self, input: &Value) -> Result<Submission, SessionError> {
        match self.wizard.commit_step(self.step, input, &self.document) {
            Ok(committed) => {
                self.document = committed.document;
                self.step = committed.next;
                self.persist()?;
                Ok(Submission::Accepted {
                    next: committed.next,
                    redirected: committed.redirected,
                })
            }
            Err(CommitError::Invalid(errors)) => Ok(Submission::Rejected(errors)),
            Err(CommitError::Graph(err)) => Err(err.into()),
        }
    }

    /// Roll a set of attributes and keep the totals on the document. The
    /// attributes step only accepts rolled values that match the last roll.
    pub fn roll_attributes(&mut self) -> Result<[AttributeRoll; 6], SessionError> {
        let rolls = dice::roll_attribute_set(self.dice.as_mut());
        self.document.pending_roll = Some(rolls.map(|roll| roll.total));
        self.persist()?;
        Ok(rolls)
    }

    /// Throw the document away and go back to the first step. The store
    /// keeps the empty document.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.document = CharacterDocument::new();
        self.step = self.wizard.graph().start();
        self.persist()?;
        info!("Restarted session {}", self.id);
        Ok(())
    }

    /// Drop the session from its store. The in-memory state is kept.
    pub fn forget(&mut self) -> Result<(), SessionError> {
        self.store.remove(&self.id.to_string())?;
        Ok(())
    }

    fn persist(&mut self) -> Result<(), SessionError> {
        let content = self.snapshot().to_json()?;
        self.store.set(&self.id.to_string(), content)?;
        Ok(())
    }
}
