//! # `task_reminders`
//!
//! A personal task list whose tasks can carry a reminder. Reminders are
//! armed as alarms on a platform alarm service, survive restarts, and are
//! delivered as notifications when they fire.
//!
//! The pieces:
//! - [`controller::TaskListController`] handles user actions on the list.
//! - [`scheduler::ReminderScheduler`] arms and cancels alarms, falling back
//!   from exact to inexact alarms to an immediate notification.
//! - [`dispatcher::ReminderDispatcher`] turns a fired alarm into a
//!   notification.
//! - [`tasks::SqliteTaskStore`] and [`alarms::SqliteAlarmService`] persist
//!   tasks and alarm registrations.

pub mod alarms;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod notifier;
pub mod paths;
pub mod platform;
pub mod scheduler;
pub mod tasks;
pub mod templates;
pub mod testing;

pub use controller::{Added, TaskListController};
pub use dispatcher::{Delivery, ReminderDispatcher};
pub use error::{Error, Result, ValidationError};
pub use scheduler::{ReminderScheduler, ScheduleOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
