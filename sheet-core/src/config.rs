//! Wizard configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::dice::{DiceSource, RandomDice};

/// Environment variable naming the save directory.
pub const SAVE_DIR_VAR: &str = "SHEET_SAVE_DIR";
/// Environment variable holding a roll seed.
pub const ROLL_SEED_VAR: &str = "SHEET_ROLL_SEED";
/// Environment variable holding the log filter.
pub const LOG_VAR: &str = "SHEET_LOG";
/// Environment variable switching autosave on.
pub const AUTOSAVE_VAR: &str = "SHEET_AUTOSAVE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

/// Configuration for a wizard session and the driver around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// Directory for saved sheets.
    pub save_dir: PathBuf,

    /// Seed for attribute rolls. Unseeded rolls use thread-local randomness.
    pub roll_seed: Option<u64>,

    /// `tracing` filter directive.
    pub log_filter: String,

    /// Save the sheet to `save_dir` after every accepted step.
    pub autosave: bool,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("sheets"),
            roll_seed: None,
            log_filter: "info".to_string(),
            autosave: false,
        }
    }
}

impl WizardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the save directory.
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    /// Make attribute rolls reproducible.
    pub fn with_roll_seed(mut self, seed: u64) -> Self {
        self.roll_seed = Some(seed);
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Defaults overridden by `SHEET_SAVE_DIR`, `SHEET_ROLL_SEED`, `SHEET_LOG`
    /// and `SHEET_AUTOSAVE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(dir) = lookup(SAVE_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.save_dir = PathBuf::from(dir);
        }
        if let Some(seed) = lookup(ROLL_SEED_VAR).filter(|v| !v.trim().is_empty()) {
            let parsed = seed.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: ROLL_SEED_VAR,
                value: seed.clone(),
            })?;
            config.roll_seed = Some(parsed);
        }
        if let Some(filter) = lookup(LOG_VAR).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }
        if let Some(flag) = lookup(AUTOSAVE_VAR) {
            config.autosave = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "" | "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: AUTOSAVE_VAR,
                        value: flag,
                    })
                }
            };
        }

        Ok(config)
    }

    /// The dice source for attribute rolls.
    pub fn dice(&self) -> Box<dyn DiceSource> {
        match self.roll_seed {
            Some(seed) => Box::new(RandomDice::seeded(seed)),
            None => Box::new(RandomDice::thread()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::roll_attributes;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_builder() {
        let config = WizardConfig::new()
            .with_save_dir("/tmp/sheets")
            .with_roll_seed(7)
            .with_log_filter("debug")
            .with_autosave(true);
        assert_eq!(config.save_dir, PathBuf::from("/tmp/sheets"));
        assert_eq!(config.roll_seed, Some(7));
        assert_eq!(config.log_filter, "debug");
        assert!(config.autosave);
    }

    #[test]
    fn test_from_lookup() {
        let config = WizardConfig::from_lookup(lookup(&[
            (SAVE_DIR_VAR, "saves"),
            (ROLL_SEED_VAR, " 42 "),
            (AUTOSAVE_VAR, "yes"),
        ]))
        .expect("Should parse");
        assert_eq!(config.save_dir, PathBuf::from("saves"));
        assert_eq!(config.roll_seed, Some(42));
        assert_eq!(config.log_filter, "info");
        assert!(config.autosave);

        let defaults = WizardConfig::from_lookup(lookup(&[])).expect("Should parse");
        assert_eq!(defaults, WizardConfig::default());
    }

    #[test]
    fn test_invalid_seed() {
        let err = WizardConfig::from_lookup(lookup(&[(ROLL_SEED_VAR, "abc")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: ROLL_SEED_VAR,
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_seeded_dice_repeat() {
        let config = WizardConfig::new().with_roll_seed(99);
        let first = roll_attributes(&mut *config.dice());
        let second = roll_attributes(&mut *config.dice());
        assert_eq!(first, second);
    }
}
