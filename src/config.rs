//! Configuration management for task-reminders.
//!
//! Settings live in `~/.task-reminders/config.yaml`. Every field has a
//! default, so a missing file or a partial one is fine.

use crate::error::Result;
use crate::paths;
use crate::platform::NotificationChannel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Database file. `None` means `~/.task-reminders/tasks.sqlite3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Try exact alarms before inexact ones.
    #[serde(default = "default_true")]
    pub prefer_exact_alarms: bool,

    /// Whether the local alarm platform grants exact alarms.
    #[serde(default = "default_true")]
    pub exact_alarms_granted: bool,

    /// Directory with template overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,

    /// JSONL file every shown notification is appended to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_log: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Channel reminders are posted to.
    #[serde(default)]
    pub channel: NotificationChannel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            prefer_exact_alarms: true,
            exact_alarms_granted: true,
            templates_dir: None,
            notification_log: None,
            log_level: default_log_level(),
            channel: NotificationChannel::default(),
        }
    }
}

impl AppConfig {
    /// Load config from the default location, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Option<Self>> {
        match paths::default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load config from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(Some(config))
    }

    /// Load from `path` (or the default location), falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let loaded = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        Ok(loaded.unwrap_or_default())
    }

    /// Save config to a specific file, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The database path to use: the configured one, else the default.
    #[must_use]
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(paths::default_db_path)
    }
}
