//! Handling of fired alarms.
//!
//! The dispatcher runs on whatever context the platform uses to deliver
//! alarms. It owns nothing but a notification service and works only from
//! the payload captured at scheduling time, so a task renamed after its
//! reminder was armed still fires with the old title.

use crate::error::Result;
use crate::platform::{AlarmPayload, Notification, NotificationChannel, NotificationService};
use crate::templates;

/// What happened to a fired alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A notification was shown.
    Shown,
    /// The payload was missing or did not name a task.
    Ignored,
    /// The notification could not be built or shown.
    Failed(String),
}

/// Turns alarm payloads into notifications.
#[derive(Debug)]
pub struct ReminderDispatcher<N> {
    notifier: N,
    channel: NotificationChannel,
}

impl<N: NotificationService> ReminderDispatcher<N> {
    /// Create a dispatcher posting to the default channel.
    pub fn new(notifier: N) -> Self {
        Self::with_channel(notifier, NotificationChannel::default())
    }

    /// Create a dispatcher posting to `channel`.
    pub const fn with_channel(notifier: N, channel: NotificationChannel) -> Self {
        Self { notifier, channel }
    }

    /// The channel notifications are posted to.
    pub const fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    /// Register the channel with the notification service.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification service rejects the channel.
    pub fn register_channel(&self) -> Result<()> {
        self.notifier.register_channel(&self.channel)?;
        Ok(())
    }

    /// Handle one fired alarm.
    pub fn on_alarm(&self, payload: Option<&AlarmPayload>) -> Delivery {
        let Some(payload) = payload.filter(|p| p.has_valid_task_id()) else {
            tracing::debug!("ignoring alarm without a task id");
            return Delivery::Ignored;
        };

        let notification = match self.build_notification(payload) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(task_id = payload.task_id, error = %e, "failed to render reminder");
                return Delivery::Failed(e.to_string());
            }
        };

        match self.notifier.show(&notification) {
            Ok(()) => {
                tracing::info!(task_id = payload.task_id, "reminder shown");
                Delivery::Shown
            }
            Err(e) => {
                tracing::warn!(task_id = payload.task_id, error = %e, "failed to show reminder");
                Delivery::Failed(e.to_string())
            }
        }
    }

    /// Render the notification for a payload.
    fn build_notification(&self, payload: &AlarmPayload) -> Result<Notification> {
        let vars = [("title", payload.title.as_str()), ("description", payload.description.as_str())];
        Ok(Notification {
            id: payload.task_id,
            channel_id: self.channel.id.clone(),
            title: templates::render_with_vars(templates::REMINDER_TITLE, &vars)?,
            body: templates::render_with_vars(templates::REMINDER_BODY, &vars)?,
        })
    }
}
