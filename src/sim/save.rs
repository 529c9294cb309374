/// Save and load the player's progress.
///
/// ## File format
///   One JSON document:
///   ```json
///   { "playerBalance": 1200, "_loanMode": true,
///     "gameMode": { "name": "Hard", "debtThreshold": -2500, "goalMoneyAmount": 12500 } }
///   ```
///
/// An empty (or missing) file means "no saved game". A finished game
/// (won or lost) truncates the file instead of deleting it.
///
/// Persistence is best effort: I/O and parse failures are logged and the
/// session carries on without a save.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::mode::GameMode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    #[serde(rename = "playerBalance")]
    pub player_balance: Option<i64>,
    #[serde(rename = "_loanMode", default)]
    pub loan_mode: bool,
    #[serde(rename = "gameMode", default, skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<GameMode>,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("save file {} is not valid: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A save file on disk.
#[derive(Clone, Debug)]
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SaveStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the save. `Ok(None)` when there is nothing saved.
    pub fn try_load(&self) -> Result<Option<SaveData>, SaveError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SaveError::Io { path: self.path.clone(), source }),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| SaveError::Parse { path: self.path.clone(), source })
    }

    pub fn try_save(&self, data: &SaveData) -> Result<(), SaveError> {
        self.ensure_parent()?;
        let json = serde_json::to_string_pretty(data)
            .map_err(|source| SaveError::Parse { path: self.path.clone(), source })?;
        std::fs::write(&self.path, json).map_err(|source| SaveError::Io { path: self.path.clone(), source })
    }

    pub fn try_clear(&self) -> Result<(), SaveError> {
        self.ensure_parent()?;
        std::fs::write(&self.path, "").map_err(|source| SaveError::Io { path: self.path.clone(), source })
    }

    fn ensure_parent(&self) -> Result<(), SaveError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
                .map_err(|source| SaveError::Io { path: self.path.clone(), source }),
            _ => Ok(()),
        }
    }

    // ── Best-effort wrappers used by the session ──

    pub fn load(&self) -> Option<SaveData> {
        match self.try_load() {
            Ok(Some(data)) => {
                info!(path = %self.path.display(), balance = ?data.player_balance, "save loaded");
                Some(data)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    pub fn save(&self, data: &SaveData) {
        match self.try_save(data) {
            Ok(()) => info!(path = %self.path.display(), "game saved"),
            Err(e) => warn!("{e}"),
        }
    }

    pub fn clear(&self) {
        match self.try_clear() {
            Ok(()) => info!(path = %self.path.display(), "save cleared"),
            Err(e) => warn!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveData {
        SaveData {
            player_balance: Some(1200),
            loan_mode: true,
            game_mode: Some(GameMode::new("Hard", Some(1000), -2500, 12500)),
        }
    }

    #[test]
    fn missing_and_empty_files_mean_no_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("database.json"));
        assert!(store.try_load().unwrap().is_none());

        std::fs::write(store.path(), "  \n").unwrap();
        assert!(store.try_load().unwrap().is_none());
    }

    #[test]
    fn save_writes_expected_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("nested/database.json"));
        store.try_save(&sample()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({
                "playerBalance": 1200,
                "_loanMode": true,
                "gameMode": {"name": "Hard", "debtThreshold": -2500, "goalMoneyAmount": 12500}
            })
        );
    }

    #[test]
    fn round_trip_keeps_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("database.json"));
        store.save(&sample());
        let back = store.load().unwrap();
        assert_eq!(back.player_balance, Some(1200));
        assert!(back.loan_mode);
        let mode = back.game_mode.unwrap();
        assert_eq!(mode.name, "Hard");
        assert_eq!(mode.debt_threshold, -2500);
        assert_eq!(mode.goal_money_amount, 12500);
        assert_eq!(mode.initial_balance, None);
    }

    #[test]
    fn clear_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("database.json"));
        store.save(&sample());
        store.clear();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "");
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_file_is_reported_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("database.json"));
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.try_load(), Err(SaveError::Parse { .. })));
        assert!(store.load().is_none());
    }

    #[test]
    fn legacy_document_without_loan_flag_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("database.json"));
        std::fs::write(store.path(), r#"{"playerBalance": 50}"#).unwrap();
        let data = store.load().unwrap();
        assert_eq!(data.player_balance, Some(50));
        assert!(!data.loan_mode);
        assert!(data.game_mode.is_none());
    }
}
