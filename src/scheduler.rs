//! Arming and cancelling reminder alarms.
//!
//! Exact alarms depend on a revocable authorization, so scheduling walks a
//! fallback ladder: exact, then inexact, then an immediate notification.
//! Every rung failing is logged and absorbed; callers only learn which rung
//! was used.

use crate::dispatcher::{Delivery, ReminderDispatcher};
use crate::platform::{AlarmError, AlarmPayload, AlarmService, NotificationService};
use crate::tasks::models::Task;

/// Which rung of the fallback ladder a schedule request ended on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The task has no scheduled time.
    NotRequested,
    /// An exact alarm was armed.
    Exact,
    /// An inexact alarm was armed.
    Inexact,
    /// No alarm could be armed; the reminder was delivered right away.
    Immediate(Delivery),
}

impl ScheduleOutcome {
    /// Whether an alarm is now armed for the task.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self, Self::Exact | Self::Inexact)
    }
}

/// Decides when and whether to arm or cancel alarms for tasks.
#[derive(Debug)]
pub struct ReminderScheduler<A, N> {
    alarms: A,
    dispatcher: ReminderDispatcher<N>,
    prefer_exact: bool,
}

impl<A: AlarmService, N: NotificationService> ReminderScheduler<A, N> {
    /// Create a scheduler. The dispatcher is used for immediate delivery.
    pub const fn new(alarms: A, dispatcher: ReminderDispatcher<N>) -> Self {
        Self { alarms, dispatcher, prefer_exact: true }
    }

    /// Skip the exact rung even when exact alarms are authorized.
    #[must_use]
    pub fn with_prefer_exact(mut self, prefer_exact: bool) -> Self {
        self.prefer_exact = prefer_exact;
        self
    }

    /// The alarm service.
    pub const fn alarms(&self) -> &A {
        &self.alarms
    }

    /// The dispatcher used for immediate delivery.
    pub const fn dispatcher(&self) -> &ReminderDispatcher<N> {
        &self.dispatcher
    }

    /// Arm the reminder for `task`, replacing any alarm already armed for it.
    ///
    /// On an exact or inexact alarm the task's notification id is set to its
    /// id. When the reminder is delivered immediately instead, the task is
    /// left without a notification id.
    pub fn schedule(&self, task: &mut Task) -> ScheduleOutcome {
        let Some(at) = task.scheduled_time() else {
            return ScheduleOutcome::NotRequested;
        };
        let payload = AlarmPayload::for_task(task);

        if self.prefer_exact && self.alarms.can_schedule_exact() {
            match self.alarms.arm_wake(task.id, at, &payload) {
                Ok(()) => {
                    tracing::debug!(task_id = task.id, %at, "armed exact alarm");
                    task.reminder.arm(task.id);
                    return ScheduleOutcome::Exact;
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = task.id,
                        error = %e,
                        "exact alarm unavailable, falling back to inexact"
                    );
                }
            }
        } else if self.prefer_exact {
            tracing::warn!(
                task_id = task.id,
                error = %AlarmError::ExactDenied,
                "exact alarm unavailable, falling back to inexact"
            );
        }

        match self.alarms.arm_wake_inexact(task.id, at, &payload) {
            Ok(()) => {
                tracing::debug!(task_id = task.id, %at, "armed inexact alarm");
                task.reminder.arm(task.id);
                ScheduleOutcome::Inexact
            }
            Err(e) => {
                tracing::warn!(task_id = task.id, error = %e, "could not arm alarm, notifying now");
                // A stale registration from an earlier schedule must not fire later
                if let Err(e) = self.alarms.cancel(task.id) {
                    tracing::warn!(task_id = task.id, error = %e, "failed to clear old alarm");
                }
                task.reminder.disarm();
                ScheduleOutcome::Immediate(self.dispatcher.on_alarm(Some(&payload)))
            }
        }
    }

    /// Cancel the armed alarm for `task`, if any.
    ///
    /// Returns whether the task had a notification id. Calling this again is
    /// a no-op.
    pub fn cancel(&self, task: &mut Task) -> bool {
        let Some(notification_id) = task.notification_id() else {
            return false;
        };

        match self.alarms.cancel(notification_id) {
            Ok(true) => tracing::debug!(task_id = task.id, "cancelled alarm"),
            Ok(false) => tracing::debug!(task_id = task.id, "alarm already gone"),
            Err(e) => tracing::warn!(task_id = task.id, error = %e, "failed to cancel alarm"),
        }

        task.reminder.disarm();
        true
    }
}
