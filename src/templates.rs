//! Template loading and rendering using Tera.
//!
//! Every user-facing string (notification text and status messages) is a
//! template. Embedded defaults are always available; a templates directory
//! on disk can override any of them.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tera::{Context, Tera};

/// Notification title for a fired reminder.
pub const REMINDER_TITLE: &str = "notifications/reminder_title.tera";
/// Notification body for a fired reminder.
pub const REMINDER_BODY: &str = "notifications/reminder_body.tera";

/// Embedded default templates for fallback when files don't exist.
static EMBEDDED_TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert(REMINDER_TITLE, include_str!("../templates/notifications/reminder_title.tera"));
    m.insert(REMINDER_BODY, include_str!("../templates/notifications/reminder_body.tera"));

    m.insert("messages/task_added.tera", include_str!("../templates/messages/task_added.tera"));
    m.insert(
        "messages/task_added_with_reminder.tera",
        include_str!("../templates/messages/task_added_with_reminder.tera"),
    );
    m.insert(
        "messages/task_completed.tera",
        include_str!("../templates/messages/task_completed.tera"),
    );
    m.insert("messages/task_reopened.tera", include_str!("../templates/messages/task_reopened.tera"));
    m.insert("messages/task_removed.tera", include_str!("../templates/messages/task_removed.tera"));
    m.insert(
        "messages/completed_cleared.tera",
        include_str!("../templates/messages/completed_cleared.tera"),
    );
    m.insert(
        "messages/nothing_to_clear.tera",
        include_str!("../templates/messages/nothing_to_clear.tera"),
    );
    m.insert("messages/tasks_reset.tera", include_str!("../templates/messages/tasks_reset.tera"));
    m.insert("messages/all_cleared.tera", include_str!("../templates/messages/all_cleared.tera"));
    m.insert("messages/empty_title.tera", include_str!("../templates/messages/empty_title.tera"));
    m.insert(
        "messages/exact_alarm_denied.tera",
        include_str!("../templates/messages/exact_alarm_denied.tera"),
    );
    m.insert(
        "messages/reminders_fired.tera",
        include_str!("../templates/messages/reminders_fired.tera"),
    );
    m.insert("messages/no_tasks.tera", include_str!("../templates/messages/no_tasks.tera"));
    m.insert("messages/no_alarms.tera", include_str!("../templates/messages/no_alarms.tera"));
    m.insert(
        "messages/config_exists.tera",
        include_str!("../templates/messages/config_exists.tera"),
    );
    m.insert(
        "messages/config_written.tera",
        include_str!("../templates/messages/config_written.tera"),
    );

    m
});

/// Global template engine with caching.
static TERA: Lazy<RwLock<Option<Tera>>> = Lazy::new(|| RwLock::new(None));

/// Initialize the template engine.
///
/// Templates found under `templates_dir` take precedence; anything missing is
/// filled in from the embedded defaults. With no directory only the embedded
/// defaults are used.
///
/// # Errors
///
/// Returns an error if the directory exists but contains invalid templates.
pub fn init_templates(templates_dir: Option<&Path>) -> Result<()> {
    let mut tera = Tera::default();

    if let Some(dir) = templates_dir.filter(|dir| dir.exists()) {
        let glob_pattern = format!("{}/**/*.tera", dir.display());
        tera = Tera::new(&glob_pattern).map_err(|e| {
            Error::Template(format!("Failed to load templates from {}: {e}", dir.display()))
        })?;
    }

    for (name, content) in EMBEDDED_TEMPLATES.iter() {
        if tera.get_template(name).is_err() {
            tera.add_raw_template(name, content)
                .map_err(|e| Error::Template(format!("Invalid embedded template {name}: {e}")))?;
        }
    }

    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = Some(tera);

    Ok(())
}

/// Render a template with the given context.
///
/// The engine is initialized with the embedded defaults on first use.
///
/// # Errors
///
/// Returns an error if the template doesn't exist or rendering fails.
pub fn render(name: &str, context: &Context) -> Result<String> {
    let needs_init = TERA.read().map_err(|e| Error::Template(e.to_string()))?.is_none();

    if needs_init {
        init_templates(None)?;
    }

    let guard = TERA.read().map_err(|e| Error::Template(e.to_string()))?;
    let tera = guard.as_ref().ok_or_else(|| Error::Template("Templates not initialized".into()))?;
    let rendered = tera
        .render(name, context)
        .map_err(|e| Error::Template(format!("Failed to render template {name}: {e}")))?;
    drop(guard);

    Ok(rendered)
}

/// Render a template with a simple key-value context.
///
/// # Errors
///
/// Returns an error if the template doesn't exist or rendering fails.
pub fn render_with_vars(name: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut context = Context::new();
    for (key, value) in vars {
        context.insert(*key, value);
    }
    render(name, &context)
}

/// Render a template whose only variable is `count`.
///
/// # Errors
///
/// Returns an error if the template doesn't exist or rendering fails.
pub fn render_count(name: &str, count: usize) -> Result<String> {
    let mut context = Context::new();
    context.insert("count", &count);
    render(name, &context)
}

/// Reset the template cache, forcing re-initialization on next use.
///
/// # Errors
///
/// Returns an error if the write lock cannot be acquired.
pub fn reset_cache() -> Result<()> {
    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = None;
    Ok(())
}

/// Names of all embedded templates.
#[must_use]
pub fn embedded_template_names() -> Vec<&'static str> {
    EMBEDDED_TEMPLATES.keys().copied().collect()
}
