//! Application settings: a small JSON key-value file next to the workspace.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    APP_DIR_NAME, DEFAULT_HISTORY_RETENTION, DEFAULT_TIMEOUT_MS, HISTORY_FILE, SETTINGS_FILE,
    WORKSPACE_FILE,
};
use crate::error::StoreError;
use crate::storage::atomic::atomic_write;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Timeout for requests that do not carry their own; 0 reads as the default
    pub default_timeout_ms: u64,
    /// How many history entries to show by default
    pub history_retention: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            history_retention: DEFAULT_HISTORY_RETENTION,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable. Never fails.
    pub fn load(path: &Path) -> Settings {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Settings::default(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read settings");
                return Settings::default();
            }
        };

        match serde_json::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                if settings.default_timeout_ms == 0 {
                    tracing::warn!(path = %path.display(), "default_timeout_ms is 0, using default");
                    settings.default_timeout_ms = DEFAULT_TIMEOUT_MS;
                }
                settings
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to parse settings");
                Settings::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let contents =
            serde_json::to_vec_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        atomic_write(path, &contents)?;
        Ok(())
    }
}

/// Locations of the files the application reads and writes
#[derive(Clone, Debug)]
pub struct AppPaths {
    pub dir: PathBuf,
}

impl AppPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        AppPaths { dir: dir.into() }
    }

    /// `~/.restbench`, or `./.restbench` when no home directory is known
    pub fn default_dir() -> Self {
        let dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        AppPaths { dir }
    }

    pub fn settings(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn workspace(&self) -> PathBuf {
        self.dir.join(WORKSPACE_FILE)
    }

    pub fn history(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(&dir.path().join("settings.json")), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"default_timeout_ms": 2500, "theme": "dark"}"#).unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.default_timeout_ms, 2500);
        assert_eq!(settings.history_retention, DEFAULT_HISTORY_RETENTION);
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"default_timeout_ms": 0, "history_retention": 5}"#).unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.default_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(settings.history_retention, 5);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(dir.path().join("app"));
        let settings = Settings {
            default_timeout_ms: 1234,
            history_retention: 7,
        };

        settings.save(&paths.settings()).unwrap();
        assert_eq!(Settings::load(&paths.settings()), settings);
    }
}
