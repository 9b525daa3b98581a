//! Task model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store on insert.
pub type TaskId = i64;

/// Reminder state of a task.
///
/// A notification id can only exist alongside a scheduled time, so the two
/// optional fields of a task record are folded into one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Reminder {
    /// No reminder was requested.
    #[default]
    Unscheduled,
    /// A reminder was requested but no alarm is currently armed.
    Requested {
        /// When the reminder should fire.
        at: DateTime<Utc>,
    },
    /// An alarm is armed for this task.
    Armed {
        /// When the reminder should fire.
        at: DateTime<Utc>,
        /// Id of the armed alarm (equal to the task id).
        notification_id: TaskId,
    },
}

impl Reminder {
    /// Build a reminder from the two nullable columns of a task record.
    ///
    /// A notification id without a scheduled time is dropped.
    #[must_use]
    pub const fn from_parts(at: Option<DateTime<Utc>>, notification_id: Option<TaskId>) -> Self {
        match (at, notification_id) {
            (None, _) => Self::Unscheduled,
            (Some(at), None) => Self::Requested { at },
            (Some(at), Some(notification_id)) => Self::Armed { at, notification_id },
        }
    }

    /// Requested reminder time, if any.
    #[must_use]
    pub const fn scheduled_time(&self) -> Option<DateTime<Utc>> {
        match *self {
            Self::Unscheduled => None,
            Self::Requested { at } | Self::Armed { at, .. } => Some(at),
        }
    }

    /// Id of the armed alarm, if any.
    #[must_use]
    pub const fn notification_id(&self) -> Option<TaskId> {
        match *self {
            Self::Armed { notification_id, .. } => Some(notification_id),
            _ => None,
        }
    }

    /// Whether an alarm is currently armed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }

    /// Mark the alarm as armed. No effect without a scheduled time.
    pub fn arm(&mut self, notification_id: TaskId) {
        if let Some(at) = self.scheduled_time() {
            *self = Self::Armed { at, notification_id };
        }
    }

    /// Forget the armed alarm, keeping the requested time.
    pub fn disarm(&mut self) {
        if let Self::Armed { at, .. } = *self {
            *self = Self::Requested { at };
        }
    }
}

/// A task in the reminder list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Short title describing the task.
    pub title: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Whether the task has been completed.
    pub is_completed: bool,
    /// Reminder state.
    pub reminder: Reminder,
}

impl Task {
    /// Requested reminder time, if any.
    #[must_use]
    pub const fn scheduled_time(&self) -> Option<DateTime<Utc>> {
        self.reminder.scheduled_time()
    }

    /// Id of the armed alarm, if any.
    #[must_use]
    pub const fn notification_id(&self) -> Option<TaskId> {
        self.reminder.notification_id()
    }

    /// Current list state of the task.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        if self.is_completed {
            TaskState::Completed
        } else {
            TaskState::Pending
        }
    }
}

/// A task that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Short title describing the task.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Requested reminder time.
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// The two states a task moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Not yet done.
    Pending,
    /// Done.
    Completed,
}

/// Which subset of tasks the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    /// Only pending tasks.
    #[default]
    Pending,
    /// Only completed tasks.
    Completed,
    /// Every task.
    All,
}

impl TaskFilter {
    /// Whether a task belongs to this subset.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::Pending => !task.is_completed,
            Self::Completed => task.is_completed,
            Self::All => true,
        }
    }
}
