//! Console notification service.
//!
//! Prints reminders to stdout. When a log path is configured every shown
//! notification is also appended as a JSONL line, so reminders delivered
//! while nobody was watching the terminal can be reviewed later.

use crate::platform::{Notification, NotificationChannel, NotificationService, NotifyError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Notification service for terminal hosts.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier {
    log_path: Option<PathBuf>,
}

impl ConsoleNotifier {
    /// Create a notifier that prints to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also append every notification to a JSONL file.
    #[must_use]
    pub fn with_log(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(log_path.into());
        self
    }

    fn append_log(path: &Path, notification: &Notification) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entry = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "id": notification.id,
            "channel": notification.channel_id,
            "title": notification.title,
            "body": notification.body,
        });

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{entry}")
    }
}

impl NotificationService for ConsoleNotifier {
    fn show(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.body.is_empty() {
            println!("[{}] {}", notification.id, notification.title);
        } else {
            println!("[{}] {}\n    {}", notification.id, notification.title, notification.body);
        }

        if let Some(path) = &self.log_path {
            Self::append_log(path, notification).map_err(|e| NotifyError(e.to_string()))?;
        }

        Ok(())
    }

    fn register_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        tracing::debug!(channel = %channel.id, "notification channel ready");
        Ok(())
    }
}
