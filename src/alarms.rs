//! Local alarm service backed by `SQLite`.
//!
//! Registrations live in an `alarms` table so they survive restarts. A host
//! process calls [`SqliteAlarmService::take_due`] periodically (or on start)
//! and hands each payload to the
//! [`ReminderDispatcher`](crate::dispatcher::ReminderDispatcher).

use crate::error::Result;
use crate::platform::{AlarmError, AlarmPayload, AlarmService};
use crate::tasks::models::TaskId;
use crate::tasks::store::{from_millis, to_millis};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSqlError, Type};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// An alarm currently registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredAlarm {
    /// Alarm id (the task id).
    pub id: TaskId,
    /// When the alarm fires.
    pub trigger_at: DateTime<Utc>,
    /// Whether it was armed as an exact alarm.
    pub exact: bool,
    /// Payload to hand back on firing. `None` if the stored payload is unreadable.
    pub payload: Option<AlarmPayload>,
}

/// SQLite-based alarm service.
#[derive(Debug, Clone)]
pub struct SqliteAlarmService {
    db_path: PathBuf,
    exact_granted: bool,
}

impl SqliteAlarmService {
    /// Create an alarm service at the given database path.
    ///
    /// `exact_granted` is the exact-alarm authorization; without it
    /// [`AlarmService::arm_wake`] fails with [`AlarmError::ExactDenied`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_path: impl AsRef<Path>, exact_granted: bool) -> Result<Self> {
        let service = Self { db_path: db_path.as_ref().to_path_buf(), exact_granted };
        service.init_schema()?;
        Ok(service)
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
            CREATE TABLE IF NOT EXISTS alarms (
                id INTEGER PRIMARY KEY,
                trigger_at_millis INTEGER NOT NULL,
                exact INTEGER NOT NULL CHECK (exact IN (0, 1)),
                payload TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_alarms_trigger_at ON alarms(trigger_at_millis);
            ",
        )?;
        Ok(())
    }

    /// Parse an alarm from a row.
    fn parse_alarm(row: &rusqlite::Row) -> rusqlite::Result<RegisteredAlarm> {
        let trigger_millis: i64 = row.get(1)?;
        let trigger_at = from_millis(trigger_millis).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Integer,
                Box::new(FromSqlError::OutOfRange(trigger_millis)),
            )
        })?;
        let payload: String = row.get(3)?;

        Ok(RegisteredAlarm {
            id: row.get(0)?,
            trigger_at,
            exact: row.get(2)?,
            payload: serde_json::from_str(&payload).ok(),
        })
    }

    fn register(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
        exact: bool,
    ) -> Result<()> {
        let conn = self.open()?;
        let payload = serde_json::to_string(payload)?;
        conn.execute(
            "INSERT OR REPLACE INTO alarms (id, trigger_at_millis, exact, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, to_millis(trigger_at), exact, payload],
        )?;
        Ok(())
    }

    /// All registered alarms, soonest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read.
    pub fn list(&self) -> Result<Vec<RegisteredAlarm>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, trigger_at_millis, exact, payload FROM alarms
             ORDER BY trigger_at_millis ASC, id ASC",
        )?;
        let alarms = stmt.query_map([], Self::parse_alarm)?.collect::<rusqlite::Result<_>>()?;
        Ok(alarms)
    }

    /// Remove and return every alarm whose trigger time is at or before `now`.
    ///
    /// Each alarm is returned exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read or written.
    pub fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<RegisteredAlarm>> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        let due: Vec<RegisteredAlarm> = {
            let mut stmt = tx.prepare(
                "SELECT id, trigger_at_millis, exact, payload FROM alarms
                 WHERE trigger_at_millis <= ?1
                 ORDER BY trigger_at_millis ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![to_millis(now)], Self::parse_alarm)?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        tx.execute("DELETE FROM alarms WHERE trigger_at_millis <= ?1", params![to_millis(now)])?;
        tx.commit()?;

        Ok(due)
    }
}

fn registration_failed(e: &crate::error::Error) -> AlarmError {
    AlarmError::Failed(e.to_string())
}

impl AlarmService for SqliteAlarmService {
    fn arm_wake(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> std::result::Result<(), AlarmError> {
        if !self.exact_granted {
            return Err(AlarmError::ExactDenied);
        }
        self.register(id, trigger_at, payload, true).map_err(|e| registration_failed(&e))
    }

    fn arm_wake_inexact(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> std::result::Result<(), AlarmError> {
        self.register(id, trigger_at, payload, false).map_err(|e| registration_failed(&e))
    }

    fn cancel(&self, id: TaskId) -> std::result::Result<bool, AlarmError> {
        let conn = self.open().map_err(|e| registration_failed(&e))?;
        let rows = conn
            .execute("DELETE FROM alarms WHERE id = ?1", params![id])
            .map_err(|e| AlarmError::Failed(e.to_string()))?;
        Ok(rows > 0)
    }

    fn can_schedule_exact(&self) -> bool {
        self.exact_granted
    }
}
