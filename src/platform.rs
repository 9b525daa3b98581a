//! Platform services the reminder core depends on.
//!
//! Alarms and notifications are owned by the host platform. These traits
//! abstract them for testability; [`crate::alarms::SqliteAlarmService`] and
//! [`crate::notifier::ConsoleNotifier`] are the local implementations and
//! [`crate::testing`] has in-memory mocks.

use crate::tasks::models::{Task, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Data attached to an alarm when it is armed and handed back when it fires.
///
/// This is a snapshot: later edits to the task are not reflected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPayload {
    /// Id of the task the alarm belongs to.
    pub task_id: TaskId,
    /// Task title at scheduling time.
    pub title: String,
    /// Task description at scheduling time.
    pub description: String,
}

impl AlarmPayload {
    /// Capture the payload for a task.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        Self { task_id: task.id, title: task.title.clone(), description: task.description.clone() }
    }

    /// Store-assigned ids start at 1.
    #[must_use]
    pub const fn has_valid_task_id(&self) -> bool {
        self.task_id > 0
    }
}

/// Errors reported by an alarm service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlarmError {
    /// Exact alarms need an authorization that is not granted.
    #[error("exact alarm scheduling is not permitted")]
    ExactDenied,
    /// The alarm could not be registered or removed.
    #[error("alarm registration failed: {0}")]
    Failed(String),
}

/// Trait for the platform alarm service.
///
/// One registration exists per id; arming an id again replaces it.
#[allow(clippy::missing_errors_doc)]
pub trait AlarmService {
    /// Arm an exact, device-waking alarm.
    fn arm_wake(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> Result<(), AlarmError>;

    /// Arm a device-waking alarm the platform may delay or batch.
    fn arm_wake_inexact(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> Result<(), AlarmError>;

    /// Remove the alarm for `id`. Returns whether one was registered.
    fn cancel(&self, id: TaskId) -> Result<bool, AlarmError>;

    /// Whether exact alarms are currently authorized.
    fn can_schedule_exact(&self) -> bool;
}

impl<T: AlarmService + ?Sized> AlarmService for &T {
    fn arm_wake(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> Result<(), AlarmError> {
        (**self).arm_wake(id, trigger_at, payload)
    }

    fn arm_wake_inexact(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> Result<(), AlarmError> {
        (**self).arm_wake_inexact(id, trigger_at, payload)
    }

    fn cancel(&self, id: TaskId) -> Result<bool, AlarmError> {
        (**self).cancel(id)
    }

    fn can_schedule_exact(&self) -> bool {
        (**self).can_schedule_exact()
    }
}

/// A notification channel that reminders are posted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    /// Stable channel identifier.
    pub id: String,
    /// User-visible channel name.
    pub name: String,
    /// User-visible channel description.
    pub description: String,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self {
            id: "task_reminders".to_string(),
            name: "Task Reminders".to_string(),
            description: "Notifications for task reminders".to_string(),
        }
    }
}

/// A notification ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification id; showing the same id again replaces the previous one.
    pub id: TaskId,
    /// Channel the notification is posted to.
    pub channel_id: String,
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
}

/// Error reported by a notification service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not show notification: {0}")]
pub struct NotifyError(pub String);

/// Trait for the platform notification service.
#[allow(clippy::missing_errors_doc)]
pub trait NotificationService {
    /// Show a notification to the user.
    fn show(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Make sure the channel exists before anything is posted to it.
    fn register_channel(&self, _channel: &NotificationChannel) -> Result<(), NotifyError> {
        Ok(())
    }
}

impl<T: NotificationService + ?Sized> NotificationService for &T {
    fn show(&self, notification: &Notification) -> Result<(), NotifyError> {
        (**self).show(notification)
    }

    fn register_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        (**self).register_channel(channel)
    }
}
