//! Save files for character sheets in progress.
//!
//! A saved sheet wraps the [`CharacterDocument`] in a versioned envelope
//! together with the step the player was on. The same envelope is what a
//! [`SessionStore`](crate::store::SessionStore) holds for a session.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::document::CharacterDocument;
use crate::graph::StepId;
use crate::origin::Origin;
use crate::specialization::Specialization;
use crate::validator;

/// Why a sheet save could not be written or read back.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot read sheet save {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write sheet save {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("cannot use save directory {}: {source}", .path.display())]
    SaveDir { path: PathBuf, source: io::Error },

    #[error("sheet save is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("sheet save carries no format version")]
    MissingVersion,

    #[error("sheet save format {found} is not supported (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save format version. Saves of any other version are rejected.
pub const SHEET_SAVE_VERSION: u32 = 1;

/// A sheet in progress with everything needed to resume the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSheet {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// Seconds since the Unix epoch.
    pub saved_at: u64,

    /// Step the player was on.
    pub step: StepId,

    pub document: CharacterDocument,

    pub metadata: SheetMetadata,
}

/// Metadata about a saved sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetMetadata {
    pub character_name: String,
    pub player_name: String,
    pub origin: Option<Origin>,
    pub specialization: Option<Specialization>,
    pub step: StepId,
    /// Whether the document passed the final review checks when saved.
    pub complete: bool,
    #[serde(default)]
    pub saved_at: u64,
}

impl SavedSheet {
    pub fn new(document: CharacterDocument, step: StepId) -> Self {
        let saved_at = unix_seconds();
        let metadata = SheetMetadata {
            character_name: document.display_name().to_string(),
            player_name: document.player_name.clone().unwrap_or_default(),
            origin: document.origin,
            specialization: document.specialization,
            step,
            complete: validator::is_complete(&document),
            saved_at,
        };

        Self {
            version: SHEET_SAVE_VERSION,
            saved_at,
            step,
            document,
            metadata,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a saved sheet, rejecting other format versions.
    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let found = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or(PersistError::MissingVersion)?;
        if found != SHEET_SAVE_VERSION as u64 {
            return Err(PersistError::VersionMismatch {
                expected: SHEET_SAVE_VERSION,
                found: found as u32,
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| PersistError::SaveDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|source| PersistError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Saved sheet '{}' to {}", self.metadata.character_name, path.display());
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let content = read_save(path).await?;
        let saved = Self::from_json(&content)?;
        info!("Loaded sheet '{}' from {}", saved.metadata.character_name, path.display());
        Ok(saved)
    }

    /// Read a save file's metadata without keeping the document.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SheetMetadata, PersistError> {
        let content = read_save(path.as_ref()).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SheetMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SHEET_SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SHEET_SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

/// List all sheet saves in a directory, creating it when missing.
pub async fn list_sheet_saves(dir: impl AsRef<Path>) -> Result<Vec<SheetSaveInfo>, PersistError> {
    let dir = dir.as_ref();
    let unavailable = |source| PersistError::SaveDir {
        path: dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).await.map_err(unavailable)?;

    let mut saves = Vec::new();
    let mut entries = fs::read_dir(dir).await.map_err(unavailable)?;

    while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            match SavedSheet::peek_metadata(&path).await {
                Ok(metadata) => saves.push(SheetSaveInfo { path, metadata }),
                Err(err) => debug!("Skipping {}: {err}", path.display()),
            }
        }
    }

    saves.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(saves)
}

/// Information about a save file.
#[derive(Debug, Clone)]
pub struct SheetSaveInfo {
    pub path: PathBuf,
    pub metadata: SheetMetadata,
}

/// Path of the save file for a sheet name.
pub fn sheet_save_path(base_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    let sanitized = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    let sanitized = if sanitized.is_empty() {
        "sheet".to_string()
    } else {
        sanitized
    };
    base_dir.as_ref().join(format!("{sanitized}.json"))
}

async fn read_save(path: &Path) -> Result<String, PersistError> {
    fs::read_to_string(path)
        .await
        .map_err(|source| PersistError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = sheet_save_path(temp.path(), "Yuji Itadori");

        let document = testing::innate_fighter_document();
        let saved = SavedSheet::new(document.clone(), StepId::Review);
        saved.save_json(&path).await.expect("Should save");

        let loaded = SavedSheet::load_json(&path).await.expect("Should load");
        assert_eq!(loaded.document, document);
        assert_eq!(loaded.step, StepId::Review);
        assert!(loaded.metadata.complete);
        assert_eq!(loaded.metadata.origin, Some(Origin::Innate));
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("old.json");

        let mut saved = SavedSheet::new(CharacterDocument::new(), StepId::Base);
        saved.version = 99;
        fs::write(&path, serde_json::to_string(&saved).unwrap())
            .await
            .unwrap();

        let result = SavedSheet::load_json(&path).await;
        assert!(matches!(
            result,
            Err(PersistError::VersionMismatch {
                expected: 1,
                found: 99
            })
        ));
        assert!(matches!(
            SavedSheet::peek_metadata(&path).await,
            Err(PersistError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_version_rejected() {
        let result = SavedSheet::from_json("{\"document\": {}}");
        assert!(matches!(result, Err(PersistError::MissingVersion)));
        assert!(matches!(
            SavedSheet::from_json("not json"),
            Err(PersistError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_list_saves_creates_dir_and_sorts() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sheets");

        assert!(list_sheet_saves(&dir).await.unwrap().is_empty());

        for name in ["zeta", "alpha"] {
            let mut document = CharacterDocument::new();
            document.character_name = Some(name.to_string());
            SavedSheet::new(document, StepId::Personal)
                .save_json(sheet_save_path(&dir, name))
                .await
                .unwrap();
        }
        fs::write(dir.join("notes.json"), "not a save").await.unwrap();

        let saves = list_sheet_saves(&dir).await.unwrap();
        let names: Vec<_> = saves
            .iter()
            .map(|s| s.metadata.character_name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert!(!saves[0].metadata.complete);
    }

    #[test]
    fn test_save_path_sanitized() {
        let path = sheet_save_path("/tmp/saves", "Maki Zen'in");
        assert_eq!(path, PathBuf::from("/tmp/saves/Maki_Zen_in.json"));
        assert_eq!(
            sheet_save_path("/tmp/saves", "  "),
            PathBuf::from("/tmp/saves/sheet.json")
        );
    }
}
