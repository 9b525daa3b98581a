//! Command-line host for the task list.
//!
//! Wires the `SQLite` task store, the `SQLite` alarm service and the console
//! notifier into a [`TaskListController`](crate::controller::TaskListController).
//! Alarms are delivered by running `fire-due`, typically from cron or a
//! systemd timer.

mod run;


pub use run::{run, run_at, CliOutput};

use crate::error::{Error, Result};
use crate::tasks::models::{TaskFilter, TaskId};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Personal task list with alarm-backed reminders.
#[derive(Parser, Debug)]
#[command(name = "task-reminders")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ~/.task-reminders/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a task, optionally with a reminder.
    Add {
        /// Task title
        title: String,

        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Reminder time, "YYYY-MM-DD HH:MM" in local time or RFC 3339
        #[arg(long, conflicts_with = "in_minutes")]
        at: Option<String>,

        /// Reminder in this many minutes from now
        #[arg(long)]
        in_minutes: Option<i64>,
    },

    /// List tasks (pending by default).
    List {
        /// Show completed tasks
        #[arg(long, conflicts_with = "all")]
        completed: bool,

        /// Show all tasks
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark a task completed, or reopen a completed one.
    Toggle {
        /// Task ID
        id: TaskId,
    },

    /// Delete a task and its reminder.
    Remove {
        /// Task ID
        id: TaskId,
    },

    /// Delete every completed task.
    #[command(name = "clear-completed")]
    ClearCompleted,

    /// Return every task to pending and re-arm reminders.
    Reset,

    /// Delete every task and cancel every reminder.
    #[command(name = "clear-all")]
    ClearAll,

    /// List armed alarms.
    Alarms,

    /// Deliver every reminder whose time has passed.
    #[command(name = "fire-due")]
    FireDue,

    /// Write a default config file.
    #[command(name = "init-config")]
    InitConfig,
}

impl Command {
    /// The list filter a `list` command asks for.
    #[must_use]
    pub const fn list_filter(completed: bool, all: bool) -> TaskFilter {
        if all {
            TaskFilter::All
        } else if completed {
            TaskFilter::Completed
        } else {
            TaskFilter::Pending
        }
    }
}

/// Parse a reminder time.
///
/// Accepts RFC 3339 (`2030-01-15T09:00:00Z`) or `YYYY-MM-DD HH:MM` in local
/// time. An ambiguous local time (clocks going back) resolves to the earlier
/// instant.
///
/// # Errors
///
/// Returns [`Error::InvalidTime`] if neither form matches or the local time
/// does not exist.
pub fn parse_when(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .map_err(|_| Error::InvalidTime(input.to_string()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidTime(input.to_string()))
}
