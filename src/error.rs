//! Error types for `task_reminders`.

use crate::platform::NotifyError;
use crate::tasks::models::TaskId;

/// Input rejected before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The task title was empty or whitespace only.
    #[error("task title must not be empty")]
    EmptyTitle,
}

/// Errors that can occur while managing tasks and reminders.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A task store outside `SQLite` failed.
    #[error("Store error: {0}")]
    Store(String),

    /// User input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No task exists with the given id.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// A notification could not be shown.
    #[error("Notification error: {0}")]
    Notification(#[from] NotifyError),

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),

    /// A reminder time could not be understood.
    #[error("Invalid time: {0}")]
    InvalidTime(String),
}

impl Error {
    /// Whether this error came from the persistence layer.
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Store(_) | Self::Io(_))
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
