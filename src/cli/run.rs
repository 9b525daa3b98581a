//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::alarms::SqliteAlarmService;
use crate::cli::{parse_when, Cli, Command};
use crate::config::AppConfig;
use crate::controller::TaskListController;
use crate::dispatcher::{Delivery, ReminderDispatcher};
use crate::error::{Error, Result, ValidationError};
use crate::notifier::ConsoleNotifier;
use crate::paths;
use crate::platform::AlarmService;
use crate::scheduler::{ReminderScheduler, ScheduleOutcome};
use crate::tasks::models::{Task, TaskFilter};
use crate::tasks::store::SqliteTaskStore;
use crate::templates;
use chrono::{DateTime, Duration, Local, Utc};
use std::path::Path;
use std::process::ExitCode;

type Controller = TaskListController<SqliteTaskStore, SqliteAlarmService, ConsoleNotifier>;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

impl CliOutput {
    fn success(stdout: Vec<String>) -> Self {
        Self { exit_code: ExitCode::SUCCESS, stdout, stderr: vec![] }
    }

    fn failure(message: String) -> Self {
        Self { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message] }
    }
}

/// Run a CLI command.
pub fn run(cli: Cli) -> CliOutput {
    run_at(cli, Utc::now())
}

/// Run a CLI command as if the current time were `now`.
pub fn run_at(cli: Cli, now: DateTime<Utc>) -> CliOutput {
    execute(cli, now).unwrap_or_else(|e| error_output(&e))
}

fn execute(cli: Cli, now: DateTime<Utc>) -> Result<CliOutput> {
    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    templates::init_templates(config.templates_dir.as_deref())?;

    let open = || -> Result<Controller> {
        let db_path = cli
            .db
            .clone()
            .or_else(|| config.database_path())
            .ok_or_else(|| Error::Store("could not determine home directory".to_string()))?;
        open_controller(&db_path, &config)
    };

    match cli.command {
        Command::Add { title, description, at, in_minutes } => {
            let when = match (at, in_minutes) {
                (Some(at), _) => Some(parse_when(&at)?),
                (None, Some(minutes)) => Some(
                    Duration::try_minutes(minutes)
                        .and_then(|offset| now.checked_add_signed(offset))
                        .ok_or_else(|| Error::InvalidTime(format!("{minutes} minutes from now")))?,
                ),
                (None, None) => None,
            };
            run_add(&mut open()?, &config, &title, &description, when)
        }
        Command::List { completed, all, json } => {
            run_list(&mut open()?, Command::list_filter(completed, all), json)
        }
        Command::Toggle { id } => {
            let task = open()?.toggle_complete(id)?;
            let name = if task.is_completed {
                "messages/task_completed.tera"
            } else {
                "messages/task_reopened.tera"
            };
            Ok(CliOutput::success(vec![templates::render_with_vars(
                name,
                &[("title", task.title.as_str())],
            )?]))
        }
        Command::Remove { id } => {
            let task = open()?.remove(id)?.ok_or(Error::TaskNotFound(id))?;
            Ok(CliOutput::success(vec![templates::render_with_vars(
                "messages/task_removed.tera",
                &[("title", task.title.as_str())],
            )?]))
        }
        Command::ClearCompleted => {
            let removed = open()?.clear_completed()?;
            let message = if removed == 0 {
                templates::render_with_vars("messages/nothing_to_clear.tera", &[])?
            } else {
                templates::render_count("messages/completed_cleared.tera", removed)?
            };
            Ok(CliOutput::success(vec![message]))
        }
        Command::Reset => {
            open()?.reset_all()?;
            Ok(CliOutput::success(vec![templates::render_with_vars(
                "messages/tasks_reset.tera",
                &[],
            )?]))
        }
        Command::ClearAll => {
            let removed = open()?.clear_all()?;
            Ok(CliOutput::success(vec![templates::render_count(
                "messages/all_cleared.tera",
                removed,
            )?]))
        }
        Command::Alarms => run_alarms(&open()?),
        Command::FireDue => run_fire_due(&mut open()?, now),
        Command::InitConfig => run_init_config(cli.config.as_deref()),
    }
}

fn open_controller(db_path: &Path, config: &AppConfig) -> Result<Controller> {
    let store = SqliteTaskStore::new(db_path)?;
    let alarms = SqliteAlarmService::new(db_path, config.exact_alarms_granted)?;

    let mut notifier = ConsoleNotifier::new();
    if let Some(log) = &config.notification_log {
        notifier = notifier.with_log(log);
    }

    let dispatcher = ReminderDispatcher::with_channel(notifier, config.channel.clone());
    if let Err(e) = dispatcher.register_channel() {
        tracing::warn!(error = %e, "could not register notification channel");
    }

    let scheduler = ReminderScheduler::new(alarms, dispatcher)
        .with_prefer_exact(config.prefer_exact_alarms);
    Ok(TaskListController::new(store, scheduler))
}

fn run_add(
    controller: &mut Controller,
    config: &AppConfig,
    title: &str,
    description: &str,
    when: Option<DateTime<Utc>>,
) -> Result<CliOutput> {
    let added = controller.add(title, description, when)?;

    let mut stderr = vec![];
    if when.is_some()
        && config.prefer_exact_alarms
        && !controller.scheduler().alarms().can_schedule_exact()
    {
        stderr.push(templates::render_with_vars("messages/exact_alarm_denied.tera", &[])?);
    }

    let name = if added.schedule.is_armed() {
        "messages/task_added_with_reminder.tera"
    } else {
        "messages/task_added.tera"
    };
    let mut stdout = vec![templates::render_with_vars(name, &[])?];
    stdout.push(format_task(&added.task));

    if let ScheduleOutcome::Immediate(Delivery::Failed(reason)) = &added.schedule {
        stderr.push(format!("Warning: reminder could not be delivered: {reason}"));
    }

    Ok(CliOutput { exit_code: ExitCode::SUCCESS, stdout, stderr })
}

fn run_list(controller: &mut Controller, filter: TaskFilter, json: bool) -> Result<CliOutput> {
    let tasks = controller.set_filter(filter)?;

    if json {
        return Ok(CliOutput::success(vec![serde_json::to_string_pretty(tasks)?]));
    }
    if tasks.is_empty() {
        return Ok(CliOutput::success(vec![templates::render_with_vars(
            "messages/no_tasks.tera",
            &[],
        )?]));
    }
    Ok(CliOutput::success(tasks.iter().map(format_task).collect()))
}

fn run_alarms(controller: &Controller) -> Result<CliOutput> {
    let alarms = controller.scheduler().alarms().list()?;
    if alarms.is_empty() {
        return Ok(CliOutput::success(vec![templates::render_with_vars(
            "messages/no_alarms.tera",
            &[],
        )?]));
    }

    let lines = alarms
        .iter()
        .map(|alarm| {
            let kind = if alarm.exact { "exact" } else { "inexact" };
            let title = alarm.payload.as_ref().map_or("(unreadable)", |p| p.title.as_str());
            format!("#{:<4} {} {kind:<7} {title}", alarm.id, format_time(alarm.trigger_at))
        })
        .collect();
    Ok(CliOutput::success(lines))
}

fn run_fire_due(controller: &mut Controller, now: DateTime<Utc>) -> Result<CliOutput> {
    let due = controller.scheduler().alarms().take_due(now)?;

    let mut shown = 0;
    let mut stderr = vec![];
    for alarm in &due {
        match controller.scheduler().dispatcher().on_alarm(alarm.payload.as_ref()) {
            Delivery::Shown => shown += 1,
            Delivery::Ignored => tracing::debug!(alarm_id = alarm.id, "ignored alarm"),
            Delivery::Failed(reason) => {
                stderr.push(format!("Warning: reminder #{} not delivered: {reason}", alarm.id));
            }
        }

        // The registration is gone, so the task must not keep its notification id
        if let Err(e) = controller.mark_fired(alarm.id) {
            stderr.push(format!("Warning: task #{} not updated after firing: {e}", alarm.id));
        }
    }

    Ok(CliOutput {
        exit_code: ExitCode::SUCCESS,
        stdout: vec![templates::render_count("messages/reminders_fired.tera", shown)?],
        stderr,
    })
}

fn run_init_config(path: Option<&Path>) -> Result<CliOutput> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(paths::default_config_path)
        .ok_or_else(|| Error::Store("could not determine home directory".to_string()))?;
    let display = path.display().to_string();

    if path.exists() {
        return Ok(CliOutput::success(vec![templates::render_with_vars(
            "messages/config_exists.tera",
            &[("path", display.as_str())],
        )?]));
    }

    AppConfig::default().save_to(&path)?;
    Ok(CliOutput::success(vec![templates::render_with_vars(
        "messages/config_written.tera",
        &[("path", display.as_str())],
    )?]))
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn format_task(task: &Task) -> String {
    let mark = if task.is_completed { "[x]" } else { "[ ]" };
    let reminder = task
        .scheduled_time()
        .map(|at| {
            let state = if task.reminder.is_armed() { "armed" } else { "not armed" };
            format!("  @ {} ({state})", format_time(at))
        })
        .unwrap_or_default();
    let description = if task.description.is_empty() {
        String::new()
    } else {
        format!("\n         {}", task.description)
    };
    format!("{mark} #{:<4} {}{reminder}{description}", task.id, task.title)
}

fn error_output(e: &Error) -> CliOutput {
    let message = match e {
        Error::Validation(ValidationError::EmptyTitle) => {
            templates::render_with_vars("messages/empty_title.tera", &[])
                .unwrap_or_else(|_| e.to_string())
        }
        _ => format!("Error: {e}"),
    };
    CliOutput::failure(message)
}
