//! Path utilities for determining data storage locations.
//!
//! Data is stored in `~/.task-reminders/`: the `SQLite` database holding
//! tasks and alarm registrations, and the YAML config file.

use std::path::PathBuf;

/// The base directory name for task-reminders data.
const DATA_DIR_NAME: &str = ".task-reminders";

/// The database filename.
pub const DATABASE_FILENAME: &str = "tasks.sqlite3";

/// The config filename.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Get the base data directory.
///
/// Returns `~/.task-reminders/` or `None` if the home directory cannot be
/// determined.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME))
}

/// Default database location, `~/.task-reminders/tasks.sqlite3`.
#[must_use]
pub fn default_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(DATABASE_FILENAME))
}

/// Default config location, `~/.task-reminders/config.yaml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(CONFIG_FILENAME))
}
