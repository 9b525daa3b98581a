//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]

use crate::error::{Error, Result};
use crate::platform::{
    AlarmError, AlarmPayload, AlarmService, Notification, NotificationChannel,
    NotificationService, NotifyError,
};
use crate::tasks::models::{NewTask, Reminder, Task, TaskId};
use crate::tasks::store::TaskStore;
use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// An in-memory task store.
///
/// Ids are assigned from 1 upwards and never reused. Individual operations
/// can be made to fail to exercise partial-failure paths.
#[derive(Debug)]
pub struct InMemoryTaskStore {
    tasks: RefCell<BTreeMap<TaskId, Task>>,
    next_id: Cell<TaskId>,
    insert_calls: Cell<usize>,
    update_calls: Cell<usize>,
    fail_updates: Cell<bool>,
    fail_deletes: Cell<bool>,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self {
            tasks: RefCell::default(),
            next_id: Cell::new(1),
            insert_calls: Cell::new(0),
            update_calls: Cell::new(0),
            fail_updates: Cell::new(false),
            fail_deletes: Cell::new(false),
        }
    }
}

impl InMemoryTaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `insert` calls so far.
    #[must_use]
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.get()
    }

    /// Number of `update` calls so far.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.update_calls.get()
    }

    /// Make every `update` fail.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.set(fail);
    }

    /// Make every delete operation fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.set(fail);
    }

    /// Snapshot of every stored task, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.borrow().values().cloned().collect()
    }

    fn listed(&self, keep: impl Fn(&Task) -> bool) -> Vec<Task> {
        self.tasks.borrow().values().rev().filter(|t| keep(t)).cloned().collect()
    }

    fn check_delete(&self) -> Result<()> {
        if self.fail_deletes.get() {
            return Err(Error::Store("delete failed".to_string()));
        }
        Ok(())
    }
}

impl TaskStore for InMemoryTaskStore {
    fn get_all(&self) -> Result<Vec<Task>> {
        Ok(self.listed(|_| true))
    }

    fn get_pending(&self) -> Result<Vec<Task>> {
        Ok(self.listed(|t| !t.is_completed))
    }

    fn get_completed(&self) -> Result<Vec<Task>> {
        Ok(self.listed(|t| t.is_completed))
    }

    fn insert(&self, task: &NewTask) -> Result<TaskId> {
        self.insert_calls.set(self.insert_calls.get() + 1);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.tasks.borrow_mut().insert(
            id,
            Task {
                id,
                title: task.title.clone(),
                description: task.description.clone(),
                is_completed: false,
                reminder: Reminder::from_parts(task.scheduled_time, None),
            },
        );
        Ok(id)
    }

    fn update(&self, task: &Task) -> Result<()> {
        self.update_calls.set(self.update_calls.get() + 1);
        if self.fail_updates.get() {
            return Err(Error::Store("update failed".to_string()));
        }
        if let Some(stored) = self.tasks.borrow_mut().get_mut(&task.id) {
            *stored = task.clone();
        }
        Ok(())
    }

    fn delete(&self, id: TaskId) -> Result<bool> {
        self.check_delete()?;
        Ok(self.tasks.borrow_mut().remove(&id).is_some())
    }

    fn delete_completed(&self) -> Result<usize> {
        self.check_delete()?;
        let mut tasks = self.tasks.borrow_mut();
        let before = tasks.len();
        tasks.retain(|_, t| !t.is_completed);
        Ok(before - tasks.len())
    }

    fn delete_all(&self) -> Result<usize> {
        self.check_delete()?;
        let mut tasks = self.tasks.borrow_mut();
        let count = tasks.len();
        tasks.clear();
        Ok(count)
    }

    fn get_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.borrow().get(&id).cloned())
    }
}

/// A task store whose every operation fails, for testing error paths.
#[derive(Debug, Default)]
pub struct FailingTaskStore {
    error_message: String,
}

impl FailingTaskStore {
    /// Create a failing store with the specified error message.
    #[must_use]
    pub fn new(error_message: impl Into<String>) -> Self {
        Self { error_message: error_message.into() }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(Error::Store(self.error_message.clone()))
    }
}

impl TaskStore for FailingTaskStore {
    fn get_all(&self) -> Result<Vec<Task>> {
        self.fail()
    }

    fn get_pending(&self) -> Result<Vec<Task>> {
        self.fail()
    }

    fn get_completed(&self) -> Result<Vec<Task>> {
        self.fail()
    }

    fn insert(&self, _task: &NewTask) -> Result<TaskId> {
        self.fail()
    }

    fn update(&self, _task: &Task) -> Result<()> {
        self.fail()
    }

    fn delete(&self, _id: TaskId) -> Result<bool> {
        self.fail()
    }

    fn delete_completed(&self) -> Result<usize> {
        self.fail()
    }

    fn delete_all(&self) -> Result<usize> {
        self.fail()
    }

    fn get_by_id(&self, _id: TaskId) -> Result<Option<Task>> {
        self.fail()
    }
}

/// An alarm registered with [`MockAlarmService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedAlarm {
    /// When the alarm fires.
    pub trigger_at: DateTime<Utc>,
    /// Whether it was armed as an exact alarm.
    pub exact: bool,
    /// Payload handed back on firing.
    pub payload: AlarmPayload,
}

/// A call made to [`MockAlarmService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmCall {
    /// `arm_wake`.
    ArmExact(TaskId),
    /// `arm_wake_inexact`.
    ArmInexact(TaskId),
    /// `cancel`.
    Cancel(TaskId),
}

/// A mock alarm service for testing.
///
/// Records every call and keeps the current registrations. Exact
/// authorization and per-operation failures can be toggled.
#[derive(Debug)]
pub struct MockAlarmService {
    armed: RefCell<BTreeMap<TaskId, ArmedAlarm>>,
    calls: RefCell<Vec<AlarmCall>>,
    exact_granted: Cell<bool>,
    exact_error: RefCell<Option<AlarmError>>,
    inexact_error: RefCell<Option<AlarmError>>,
    cancel_error: RefCell<Option<AlarmError>>,
}

impl Default for MockAlarmService {
    fn default() -> Self {
        Self {
            armed: RefCell::default(),
            calls: RefCell::default(),
            exact_granted: Cell::new(true),
            exact_error: RefCell::default(),
            inexact_error: RefCell::default(),
            cancel_error: RefCell::default(),
        }
    }
}

impl MockAlarmService {
    /// Create a mock with exact alarms authorized.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant or revoke exact alarm authorization.
    pub fn set_exact_granted(&self, granted: bool) {
        self.exact_granted.set(granted);
    }

    /// Make `arm_wake` fail with `error`.
    pub fn set_exact_error(&self, error: Option<AlarmError>) {
        *self.exact_error.borrow_mut() = error;
    }

    /// Make `arm_wake_inexact` fail with `error`.
    pub fn set_inexact_error(&self, error: Option<AlarmError>) {
        *self.inexact_error.borrow_mut() = error;
    }

    /// Make `cancel` fail with `error`.
    pub fn set_cancel_error(&self, error: Option<AlarmError>) {
        *self.cancel_error.borrow_mut() = error;
    }

    /// The registration for `id`, if any.
    #[must_use]
    pub fn armed(&self, id: TaskId) -> Option<ArmedAlarm> {
        self.armed.borrow().get(&id).cloned()
    }

    /// Number of current registrations.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.armed.borrow().len()
    }

    /// Every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<AlarmCall> {
        self.calls.borrow().clone()
    }

    /// Forget recorded calls, keeping registrations.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Simulate the platform firing the alarm for `id`.
    ///
    /// Removes the registration and returns its payload.
    pub fn fire(&self, id: TaskId) -> Option<AlarmPayload> {
        self.armed.borrow_mut().remove(&id).map(|alarm| alarm.payload)
    }

    fn register(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
        exact: bool,
    ) {
        self.armed
            .borrow_mut()
            .insert(id, ArmedAlarm { trigger_at, exact, payload: payload.clone() });
    }
}

impl AlarmService for MockAlarmService {
    fn arm_wake(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> std::result::Result<(), AlarmError> {
        self.calls.borrow_mut().push(AlarmCall::ArmExact(id));
        if !self.exact_granted.get() {
            return Err(AlarmError::ExactDenied);
        }
        if let Some(error) = self.exact_error.borrow().clone() {
            return Err(error);
        }
        self.register(id, trigger_at, payload, true);
        Ok(())
    }

    fn arm_wake_inexact(
        &self,
        id: TaskId,
        trigger_at: DateTime<Utc>,
        payload: &AlarmPayload,
    ) -> std::result::Result<(), AlarmError> {
        self.calls.borrow_mut().push(AlarmCall::ArmInexact(id));
        if let Some(error) = self.inexact_error.borrow().clone() {
            return Err(error);
        }
        self.register(id, trigger_at, payload, false);
        Ok(())
    }

    fn cancel(&self, id: TaskId) -> std::result::Result<bool, AlarmError> {
        self.calls.borrow_mut().push(AlarmCall::Cancel(id));
        if let Some(error) = self.cancel_error.borrow().clone() {
            return Err(error);
        }
        Ok(self.armed.borrow_mut().remove(&id).is_some())
    }

    fn can_schedule_exact(&self) -> bool {
        self.exact_granted.get()
    }
}

/// A notification service that records what it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: RefCell<Vec<Notification>>,
    channels: RefCell<Vec<NotificationChannel>>,
    failing: Cell<bool>,
}

impl RecordingNotifier {
    /// Create a recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `show` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Notifications shown so far.
    #[must_use]
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.borrow().clone()
    }

    /// Channels registered so far.
    #[must_use]
    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.channels.borrow().clone()
    }
}

impl NotificationService for RecordingNotifier {
    fn show(&self, notification: &Notification) -> std::result::Result<(), NotifyError> {
        if self.failing.get() {
            return Err(NotifyError("notifications are disabled".to_string()));
        }
        self.shown.borrow_mut().push(notification.clone());
        Ok(())
    }

    fn register_channel(
        &self,
        channel: &NotificationChannel,
    ) -> std::result::Result<(), NotifyError> {
        self.channels.borrow_mut().push(channel.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_task(title: &str) -> NewTask {
        NewTask { title: title.to_string(), description: String::new(), scheduled_time: None }
    }

    #[test]
    fn test_in_memory_store_assigns_ids() {
        let store = InMemoryTaskStore::new();
        let a = store.insert(&new_task("A")).unwrap();
        let b = store.insert(&new_task("B")).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.insert_calls(), 2);

        let ids: Vec<TaskId> = store.get_all().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_in_memory_store_failures() {
        let store = InMemoryTaskStore::new();
        let id = store.insert(&new_task("A")).unwrap();
        let task = store.get_by_id(id).unwrap().unwrap();

        store.set_fail_updates(true);
        assert!(store.update(&task).unwrap_err().is_store_error());

        store.set_fail_deletes(true);
        assert!(store.delete_completed().is_err());
        assert!(store.delete(id).is_err());
    }

    #[test]
    fn test_failing_store() {
        let store = FailingTaskStore::new("disk unplugged");
        let err = store.get_all().unwrap_err();
        assert_eq!(err.to_string(), "Store error: disk unplugged");
    }

    #[test]
    fn test_mock_alarm_service_records_calls() {
        let alarms = MockAlarmService::new();
        let payload =
            AlarmPayload { task_id: 1, title: "A".to_string(), description: String::new() };
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        alarms.arm_wake(1, at, &payload).unwrap();
        assert!(alarms.cancel(1).unwrap());
        assert!(!alarms.cancel(1).unwrap());

        assert_eq!(
            alarms.calls(),
            vec![AlarmCall::ArmExact(1), AlarmCall::Cancel(1), AlarmCall::Cancel(1)]
        );
    }

    #[test]
    fn test_mock_alarm_service_fire_consumes_registration() {
        let alarms = MockAlarmService::new();
        let payload =
            AlarmPayload { task_id: 4, title: "B".to_string(), description: String::new() };
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        alarms.arm_wake_inexact(4, at, &payload).unwrap();

        assert_eq!(alarms.fire(4), Some(payload));
        assert_eq!(alarms.fire(4), None);
    }

    #[test]
    fn test_recording_notifier_failure() {
        let notifier = RecordingNotifier::new();
        notifier.set_failing(true);
        let notification = Notification {
            id: 1,
            channel_id: "c".to_string(),
            title: "t".to_string(),
            body: String::new(),
        };
        assert!(notifier.show(&notification).is_err());
        assert!(notifier.shown().is_empty());
    }
}
