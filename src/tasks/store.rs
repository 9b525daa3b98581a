//! Task store trait and `SQLite` implementation.

use crate::error::Result;
use crate::tasks::models::{NewTask, Reminder, Task, TaskId};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Trait for task storage operations.
///
/// All methods return a `Result` and may fail with database errors. No call
/// is atomic with any other call. Lists are ordered newest first.
#[allow(clippy::missing_errors_doc)]
pub trait TaskStore {
    /// All tasks.
    fn get_all(&self) -> Result<Vec<Task>>;

    /// Tasks that are not completed.
    fn get_pending(&self) -> Result<Vec<Task>>;

    /// Tasks that are completed.
    fn get_completed(&self) -> Result<Vec<Task>>;

    /// Insert a new pending task and return its id.
    fn insert(&self, task: &NewTask) -> Result<TaskId>;

    /// Overwrite the stored record with the same id.
    fn update(&self, task: &Task) -> Result<()>;

    /// Delete one task. Returns whether it existed.
    fn delete(&self, id: TaskId) -> Result<bool>;

    /// Delete every completed task. Returns how many were deleted.
    fn delete_completed(&self) -> Result<usize>;

    /// Delete every task. Returns how many were deleted.
    fn delete_all(&self) -> Result<usize>;

    /// Get a task by id.
    fn get_by_id(&self, id: TaskId) -> Result<Option<Task>>;
}

impl<T: TaskStore + ?Sized> TaskStore for &T {
    fn get_all(&self) -> Result<Vec<Task>> {
        (**self).get_all()
    }

    fn get_pending(&self) -> Result<Vec<Task>> {
        (**self).get_pending()
    }

    fn get_completed(&self) -> Result<Vec<Task>> {
        (**self).get_completed()
    }

    fn insert(&self, task: &NewTask) -> Result<TaskId> {
        (**self).insert(task)
    }

    fn update(&self, task: &Task) -> Result<()> {
        (**self).update(task)
    }

    fn delete(&self, id: TaskId) -> Result<bool> {
        (**self).delete(id)
    }

    fn delete_completed(&self) -> Result<usize> {
        (**self).delete_completed()
    }

    fn delete_all(&self) -> Result<usize> {
        (**self).delete_all()
    }

    fn get_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        (**self).get_by_id(id)
    }
}

const TASK_COLUMNS: &str =
    "id, title, description, is_completed, scheduled_time_millis, notification_id";

/// Convert a timestamp to the stored epoch-millisecond form.
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Convert a stored epoch-millisecond value back to a timestamp.
pub(crate) fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// SQLite-based task store.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    db_path: PathBuf,
}

impl SqliteTaskStore {
    /// Create a new `SQLite` task store at the given database path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self { db_path: db_path.as_ref().to_path_buf() };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection to the database.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                is_completed INTEGER NOT NULL DEFAULT 0 CHECK (is_completed IN (0, 1)),
                scheduled_time_millis INTEGER,
                notification_id INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_is_completed ON tasks(is_completed);
            ",
        )?;

        Ok(())
    }

    /// Parse a task from a row.
    fn parse_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let scheduled: Option<i64> = row.get(4)?;
        let notification_id: Option<TaskId> = row.get(5)?;

        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            is_completed: row.get(3)?,
            reminder: Reminder::from_parts(scheduled.and_then(from_millis), notification_id),
        })
    }

    /// Run a listing query with an optional completion filter.
    fn query_tasks(&self, completed: Option<bool>) -> Result<Vec<Task>> {
        let conn = self.open()?;

        let tasks = match completed {
            Some(completed) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE is_completed = ?1 ORDER BY id DESC"
                ))?;
                let rows = stmt.query_map(params![completed], Self::parse_task)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id DESC"))?;
                let rows = stmt.query_map([], Self::parse_task)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        Ok(tasks)
    }
}

impl TaskStore for SqliteTaskStore {
    fn get_all(&self) -> Result<Vec<Task>> {
        self.query_tasks(None)
    }

    fn get_pending(&self) -> Result<Vec<Task>> {
        self.query_tasks(Some(false))
    }

    fn get_completed(&self) -> Result<Vec<Task>> {
        self.query_tasks(Some(true))
    }

    fn insert(&self, task: &NewTask) -> Result<TaskId> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO tasks (title, description, scheduled_time_millis) VALUES (?1, ?2, ?3)",
            params![task.title, task.description, task.scheduled_time.map(to_millis)],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn update(&self, task: &Task) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "UPDATE tasks
             SET title = ?1, description = ?2, is_completed = ?3,
                 scheduled_time_millis = ?4, notification_id = ?5
             WHERE id = ?6",
            params![
                task.title,
                task.description,
                task.is_completed,
                task.scheduled_time().map(to_millis),
                task.notification_id(),
                task.id,
            ],
        )?;

        Ok(())
    }

    fn delete(&self, id: TaskId) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_completed(&self) -> Result<usize> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM tasks WHERE is_completed = 1", [])?;
        Ok(rows)
    }

    fn delete_all(&self) -> Result<usize> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM tasks", [])?;
        Ok(rows)
    }

    fn get_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        let conn = self.open()?;
        let task = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                Self::parse_task,
            )
            .optional()?;
        Ok(task)
    }
}
