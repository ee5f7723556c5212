//! Durable session persistence.
//!
//! Case numbers and the last selected office/agenda survive restarts; they
//! are written as pretty JSON under `.agendagen/` next to the working
//! directory and removed on explicit reset.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Default store file (relative to current dir).
const DEFAULT_STORE_PATH: &str = ".agendagen/session.json";

/// The persisted slice of session state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    /// Last selected agenda key.
    pub agenda: Option<String>,
    /// Last selected office key.
    pub office: Option<String>,
    /// Case number per agenda key.
    #[serde(default)]
    pub case_numbers: HashMap<String, String>,
}

/// File-backed store for [`PersistedSession`].
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_STORE_PATH)
    }

    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: PathBuf::from(path.as_ref()),
        }
    }

    /// Load the persisted session; a missing or unreadable file yields the
    /// default empty session.
    pub fn load(&self) -> PersistedSession {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Write the persisted session to disk.
    pub fn save(&self, session: &PersistedSession) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Remove the persisted session (explicit reset).
    pub fn clear(&self) -> StoreResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = SessionStore::with_path(dir.path().join("session.json"));

        let mut session = PersistedSession {
            agenda: Some("dr".into()),
            office: Some("bb".into()),
            case_numbers: HashMap::new(),
        };
        session
            .case_numbers
            .insert("dr".into(), "OU-BB-2024/123".into());

        store.save(&session).unwrap();
        assert_eq!(store.load(), session);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let store = SessionStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), PersistedSession::default());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::with_path(&path);
        store.save(&PersistedSession::default()).unwrap();
        assert!(path.exists());
        store.clear().unwrap();
        assert!(!path.exists());
        // Clearing an absent file is not an error.
        store.clear().unwrap();
    }
}
