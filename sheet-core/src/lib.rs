//! Progression engine for a guided character-creation wizard.
//!
//! This crate provides:
//! - A declarative step graph with branching transitions and entry guards
//! - Tagged per-origin and per-specialization detail shapes
//! - Per-step rules and a whole-document validator with field-path errors
//! - Sessions over a pluggable key-value store, and JSON save files
//!
//! # Quick Start
//!
//! ```ignore
//! use serde_json::json;
//! use sheet_core::{MemoryStore, Submission, WizardConfig, WizardSession};
//!
//! let mut session = WizardSession::new(&WizardConfig::new(), MemoryStore::new());
//! let outcome = session.submit(&json!({
//!     "player_name": "Ana",
//!     "character_name": "Yuji Itadori",
//! }))?;
//!
//! match outcome {
//!     Submission::Accepted { next, .. } => println!("Next step: {next}"),
//!     Submission::Rejected(errors) => println!("{errors}"),
//! }
//! ```

pub mod attributes;
pub mod catalog;
pub mod config;
pub mod dice;
pub mod document;
pub mod forms;
pub mod graph;
pub mod lineage;
pub mod origin;
pub mod persist;
pub mod resources;
pub mod session;
pub mod specialization;
mod steps;
pub mod store;
pub mod testing;
pub mod validation;
pub mod validator;
pub mod wizard;

// Primary public API
pub use attributes::{Attribute, AttributeVector, GenerationMethod};
pub use config::{ConfigError, WizardConfig};
pub use document::CharacterDocument;
pub use graph::{GraphError, Page, StepGraph, StepId};
pub use origin::{Origin, OriginDetails};
pub use persist::{PersistError, SavedSheet};
pub use session::{SessionError, SessionId, Submission, WizardSession};
pub use specialization::{Specialization, SpecializationDetails};
pub use steps::{RESTART_INTENT, SELECT_INTENT};
pub use store::{MemoryStore, SessionStore, StoreError};
pub use validation::{FieldErrors, RuleViolation};
pub use wizard::{commit_step, resolve_next, CommitError, Committed, Wizard};
