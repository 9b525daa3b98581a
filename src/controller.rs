//! The task list: user actions against the store and the scheduler.
//!
//! The controller is the single owner of the in-memory list. The list is a
//! cache of one store query for the active filter and is re-read after every
//! mutation; decisions are always made on records freshly read from the
//! store. Store failures propagate to the caller without rollback, so an
//! operation may be applied up to the failing step. Scheduling problems never
//! fail an operation.

use crate::error::{Error, Result, ValidationError};
use crate::platform::{AlarmService, NotificationService};
use crate::scheduler::{ReminderScheduler, ScheduleOutcome};
use crate::tasks::models::{NewTask, Task, TaskFilter, TaskId};
use crate::tasks::store::TaskStore;
use chrono::{DateTime, Utc};

/// Result of adding a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
    /// The task as persisted.
    pub task: Task,
    /// How the reminder was scheduled.
    pub schedule: ScheduleOutcome,
}

/// Orchestrates user actions on the task list.
#[derive(Debug)]
pub struct TaskListController<S, A, N> {
    store: S,
    scheduler: ReminderScheduler<A, N>,
    filter: TaskFilter,
    tasks: Vec<Task>,
}

impl<S: TaskStore, A: AlarmService, N: NotificationService> TaskListController<S, A, N> {
    /// Create a controller showing pending tasks. The list starts empty until
    /// [`refresh`](Self::refresh) is called.
    pub const fn new(store: S, scheduler: ReminderScheduler<A, N>) -> Self {
        Self { store, scheduler, filter: TaskFilter::Pending, tasks: Vec::new() }
    }

    /// The task store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The reminder scheduler.
    pub const fn scheduler(&self) -> &ReminderScheduler<A, N> {
        &self.scheduler
    }

    /// The active filter.
    pub const fn filter(&self) -> TaskFilter {
        self.filter
    }

    /// Tasks loaded for the active filter, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Switch the filter and reload. Persisted state is not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn set_filter(&mut self, filter: TaskFilter) -> Result<&[Task]> {
        self.filter = filter;
        self.refresh()
    }

    /// Reload the list for the active filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn refresh(&mut self) -> Result<&[Task]> {
        self.tasks = match self.filter {
            TaskFilter::Pending => self.store.get_pending()?,
            TaskFilter::Completed => self.store.get_completed()?,
            TaskFilter::All => self.store.get_all()?,
        };
        Ok(&self.tasks)
    }

    /// Add a pending task, arming its reminder if a time was given.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] without touching the store if
    /// the title is blank, or a store error.
    pub fn add(
        &mut self,
        title: &str,
        description: &str,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> Result<Added> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let id = self.store.insert(&NewTask {
            title: title.to_string(),
            description: description.trim().to_string(),
            scheduled_time,
        })?;
        tracing::info!(task_id = id, "task added");

        // The alarm payload needs the stored record, generated id included
        let mut task = self.store.get_by_id(id)?.ok_or(Error::TaskNotFound(id))?;
        let schedule = self.scheduler.schedule(&mut task);
        if schedule != ScheduleOutcome::NotRequested {
            self.store.update(&task)?;
        }

        self.refresh()?;
        Ok(Added { task, schedule })
    }

    /// Flip a task between pending and completed.
    ///
    /// Completing a task cancels its alarm. Reopening it does not re-arm the
    /// reminder; only [`reset_all`](Self::reset_all) does that.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown id, or a store error.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<Task> {
        let mut task = self.store.get_by_id(id)?.ok_or(Error::TaskNotFound(id))?;

        task.is_completed = !task.is_completed;
        if task.is_completed {
            self.scheduler.cancel(&mut task);
        }
        self.store.update(&task)?;
        tracing::info!(task_id = id, completed = task.is_completed, "task toggled");

        self.refresh()?;
        Ok(task)
    }

    /// Delete every completed task, cancelling their alarms first.
    ///
    /// Returns how many tasks were removed.
    ///
    /// # Errors
    ///
    /// Returns a store error. Alarms cancelled before the failure stay
    /// cancelled.
    pub fn clear_completed(&mut self) -> Result<usize> {
        let mut completed = self.store.get_completed()?;
        if completed.is_empty() {
            return Ok(0);
        }

        for task in &mut completed {
            self.scheduler.cancel(task);
        }
        self.store.delete_completed()?;
        tracing::info!(count = completed.len(), "completed tasks cleared");

        self.refresh()?;
        Ok(completed.len())
    }

    /// Return every task to pending, re-arming every requested reminder.
    ///
    /// Tasks that are already pending without a reminder are left alone.
    /// Returns how many tasks were updated.
    ///
    /// # Errors
    ///
    /// Returns a store error. Tasks processed before the failure keep their
    /// new state.
    pub fn reset_all(&mut self) -> Result<usize> {
        let mut updated = 0;

        for mut task in self.store.get_all()? {
            if !task.is_completed && task.scheduled_time().is_none() {
                continue;
            }
            task.is_completed = false;
            self.scheduler.schedule(&mut task);
            self.store.update(&task)?;
            updated += 1;
        }
        tracing::info!(count = updated, "tasks reset to pending");

        self.refresh()?;
        Ok(updated)
    }

    /// Delete one task, cancelling its alarm first.
    ///
    /// Returns the removed task, or `None` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn remove(&mut self, id: TaskId) -> Result<Option<Task>> {
        let Some(mut task) = self.store.get_by_id(id)? else {
            return Ok(None);
        };

        self.scheduler.cancel(&mut task);
        self.store.delete(id)?;
        tracing::info!(task_id = id, "task removed");

        self.refresh()?;
        Ok(Some(task))
    }

    /// Record that the alarm for task `id` has fired.
    ///
    /// The alarm service has already dropped the registration, so nothing is
    /// cancelled; the task's notification id is cleared and the record
    /// persisted. Returns whether the task was armed. A task that no longer
    /// exists, or was never armed, is left alone.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn mark_fired(&mut self, id: TaskId) -> Result<bool> {
        let Some(mut task) = self.store.get_by_id(id)? else {
            return Ok(false);
        };
        if !task.reminder.is_armed() {
            return Ok(false);
        }

        task.reminder.disarm();
        self.store.update(&task)?;
        tracing::debug!(task_id = id, "reminder fired");

        self.refresh()?;
        Ok(true)
    }

    /// Delete every task, cancelling every armed alarm first.
    ///
    /// Returns how many tasks were removed.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn clear_all(&mut self) -> Result<usize> {
        for mut task in self.store.get_all()? {
            self.scheduler.cancel(&mut task);
        }
        let removed = self.store.delete_all()?;
        tracing::info!(count = removed, "all tasks removed");

        self.refresh()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ReminderDispatcher;
    use crate::platform::AlarmError;
    use crate::tasks::models::Reminder;
    use crate::testing::{
        AlarmCall, FailingTaskStore, InMemoryTaskStore, MockAlarmService, RecordingNotifier,
    };
    use chrono::TimeZone;
    use proptest::prelude::*;

    type TestController<'a, S> =
        TaskListController<&'a S, &'a MockAlarmService, &'a RecordingNotifier>;

    fn controller<'a, S: TaskStore>(
        store: &'a S,
        alarms: &'a MockAlarmService,
        notifier: &'a RecordingNotifier,
    ) -> TestController<'a, S> {
        let scheduler = ReminderScheduler::new(alarms, ReminderDispatcher::new(notifier));
        TaskListController::new(store, scheduler)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2033, 2, 14, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_add_with_reminder_round_trip() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);

        let added = list.add("Buy milk", "", Some(t0())).unwrap();
        assert_eq!(added.schedule, ScheduleOutcome::Exact);

        let stored = store.get_by_id(added.task.id).unwrap().unwrap();
        assert_eq!(stored.title, "Buy milk");
        assert!(!stored.is_completed);
        assert_eq!(stored.scheduled_time(), Some(t0()));
        assert_eq!(stored.notification_id(), Some(added.task.id));

        let armed = alarms.armed(added.task.id).unwrap();
        assert_eq!(armed.payload.task_id, added.task.id);
        assert_eq!(list.tasks(), [stored]);
    }

    #[test]
    fn test_add_without_reminder_does_not_schedule() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);

        let added = list.add("  Water plants  ", "  balcony ", None).unwrap();

        assert_eq!(added.schedule, ScheduleOutcome::NotRequested);
        assert_eq!(added.task.title, "Water plants");
        assert_eq!(added.task.description, "balcony");
        assert!(alarms.calls().is_empty());
        assert_eq!(store.update_calls(), 0);
    }

    #[test]
    fn test_add_empty_title_is_rejected() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);

        for title in ["", "   ", "\t\n"] {
            let err = list.add(title, "description", Some(t0())).unwrap_err();
            assert!(matches!(err, Error::Validation(ValidationError::EmptyTitle)));
        }
        assert_eq!(store.insert_calls(), 0);
        assert!(alarms.calls().is_empty());
    }

    #[test]
    fn test_add_store_failure_surfaces() {
        let store = FailingTaskStore::new("read-only filesystem");
        let (alarms, notifier) = (MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);

        let err = list.add("Anything", "", Some(t0())).unwrap_err();
        assert!(err.is_store_error());
        assert!(alarms.calls().is_empty());
    }

    #[test]
    fn test_add_absorbs_scheduling_failures() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        alarms.set_exact_granted(false);
        alarms.set_inexact_error(Some(AlarmError::Failed("no alarm slots".to_string())));
        let mut list = controller(&store, &alarms, &notifier);

        let added = list.add("Stand up", "", Some(t0())).unwrap();

        assert!(matches!(added.schedule, ScheduleOutcome::Immediate(_)));
        let stored = store.get_by_id(added.task.id).unwrap().unwrap();
        assert_eq!(stored.reminder, Reminder::Requested { at: t0() });
        assert_eq!(notifier.shown().len(), 1);
    }

    #[test]
    fn test_toggle_complete_cancels_alarm() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let id = list.add("Send invoice", "", Some(t0())).unwrap().task.id;

        let task = list.toggle_complete(id).unwrap();

        assert!(task.is_completed);
        assert_eq!(task.notification_id(), None);
        assert!(alarms.armed(id).is_none());
        assert_eq!(store.get_by_id(id).unwrap().unwrap(), task);
        // Default filter is pending, so the task left the list
        assert!(list.tasks().is_empty());
    }

    #[test]
    fn test_reopening_does_not_reschedule() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let id = list.add("Send invoice", "", Some(t0())).unwrap().task.id;
        list.toggle_complete(id).unwrap();
        alarms.clear_calls();

        let task = list.toggle_complete(id).unwrap();

        assert!(!task.is_completed);
        assert_eq!(task.reminder, Reminder::Requested { at: t0() });
        assert!(alarms.calls().is_empty());
    }

    #[test]
    fn test_toggle_unknown_task() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);

        assert!(matches!(list.toggle_complete(42), Err(Error::TaskNotFound(42))));
    }

    #[test]
    fn test_clear_completed_removes_only_completed() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let ids: Vec<TaskId> = (1..=5)
            .map(|n| list.add(&format!("Task {n}"), "", Some(t0())).unwrap().task.id)
            .collect();
        list.toggle_complete(ids[1]).unwrap();
        list.toggle_complete(ids[3]).unwrap();

        assert_eq!(list.clear_completed().unwrap(), 2);

        let remaining: Vec<TaskId> = store.snapshot().iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[4]]);
        for id in [ids[0], ids[2], ids[4]] {
            assert!(alarms.armed(id).is_some());
        }
        assert_eq!(list.clear_completed().unwrap(), 0);
    }

    #[test]
    fn test_clear_completed_cancels_before_delete() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let id = list.add("Book flights", "", Some(t0())).unwrap().task.id;

        // Completed in storage with an alarm still armed, as a crash mid-toggle leaves it
        let mut task = store.get_by_id(id).unwrap().unwrap();
        task.is_completed = true;
        store.update(&task).unwrap();
        store.set_fail_deletes(true);

        assert!(list.clear_completed().unwrap_err().is_store_error());
        assert!(alarms.armed(id).is_none());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_reset_all_rearms_reminders() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let with_time = list.add("Dentist", "", Some(t0())).unwrap().task.id;
        let without_time = list.add("Read book", "", None).unwrap().task.id;
        list.toggle_complete(with_time).unwrap();
        list.toggle_complete(without_time).unwrap();
        alarms.clear_calls();

        assert_eq!(list.reset_all().unwrap(), 2);

        let rearmed = store.get_by_id(with_time).unwrap().unwrap();
        assert!(!rearmed.is_completed);
        assert_eq!(rearmed.notification_id(), Some(with_time));
        assert_eq!(alarms.armed(with_time).unwrap().trigger_at, t0());

        let plain = store.get_by_id(without_time).unwrap().unwrap();
        assert!(!plain.is_completed);
        assert_eq!(plain.reminder, Reminder::Unscheduled);

        assert_eq!(alarms.calls(), vec![AlarmCall::ArmExact(with_time)]);
        assert_eq!(list.tasks().len(), 2);
    }

    #[test]
    fn test_reset_all_skips_untouched_tasks() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        list.add("Nothing to do", "", None).unwrap();
        let updates_before = store.update_calls();

        assert_eq!(list.reset_all().unwrap(), 0);
        assert_eq!(store.update_calls(), updates_before);
    }

    #[test]
    fn test_reset_all_partial_failure() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let id = list.add("Dentist", "", Some(t0())).unwrap().task.id;
        list.toggle_complete(id).unwrap();
        store.set_fail_updates(true);

        assert!(list.reset_all().unwrap_err().is_store_error());
        // The alarm was re-armed before the write failed
        assert!(alarms.armed(id).is_some());
        assert!(store.get_by_id(id).unwrap().unwrap().is_completed);
    }

    #[test]
    fn test_filter_changes_only_the_view() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let done = list.add("Done", "", None).unwrap().task.id;
        list.add("Open", "", None).unwrap();
        list.toggle_complete(done).unwrap();
        let before = store.snapshot();

        let completed: Vec<String> =
            list.set_filter(TaskFilter::Completed).unwrap().iter().map(|t| t.title.clone()).collect();
        assert_eq!(completed, vec!["Done"]);
        assert_eq!(list.filter(), TaskFilter::Completed);

        assert_eq!(list.set_filter(TaskFilter::All).unwrap().len(), 2);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_remove_cancels_alarm() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let id = list.add("Return parcel", "", Some(t0())).unwrap().task.id;

        let removed = list.remove(id).unwrap().unwrap();
        assert_eq!(removed.title, "Return parcel");
        assert!(alarms.armed(id).is_none());
        assert!(store.get_by_id(id).unwrap().is_none());
        assert!(list.remove(id).unwrap().is_none());
    }

    #[test]
    fn test_clear_all_cancels_every_alarm() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        list.add("A", "", Some(t0())).unwrap();
        list.add("B", "", None).unwrap();
        list.add("C", "", Some(t0())).unwrap();

        assert_eq!(list.clear_all().unwrap(), 3);
        assert_eq!(alarms.armed_count(), 0);
        assert!(list.tasks().is_empty());
    }

    #[test]
    fn test_mark_fired_clears_notification_id() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let id = list.add("Feed cat", "", Some(t0())).unwrap().task.id;
        alarms.fire(id).unwrap();
        alarms.clear_calls();

        assert!(list.mark_fired(id).unwrap());

        let stored = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.notification_id(), None);
        assert_eq!(stored.reminder, Reminder::Requested { at: t0() });
        assert!(!stored.is_completed);
        assert!(alarms.calls().is_empty());
        assert_eq!(list.tasks()[0].notification_id(), None);
    }

    #[test]
    fn test_mark_fired_is_noop_for_unarmed_or_missing_tasks() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let id = list.add("No reminder", "", None).unwrap().task.id;
        let updates = store.update_calls();

        assert!(!list.mark_fired(id).unwrap());
        assert!(!list.mark_fired(id + 100).unwrap());
        assert_eq!(store.update_calls(), updates);
    }

    #[test]
    fn test_reset_rearms_fired_reminder() {
        let (store, alarms, notifier) =
            (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
        let mut list = controller(&store, &alarms, &notifier);
        let id = list.add("Stretch", "", Some(t0())).unwrap().task.id;
        alarms.fire(id).unwrap();
        list.mark_fired(id).unwrap();

        list.reset_all().unwrap();

        assert_eq!(store.get_by_id(id).unwrap().unwrap().notification_id(), Some(id));
        assert!(alarms.armed(id).is_some());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { with_time: bool },
        Toggle(usize),
        ClearCompleted,
        ResetAll,
        Remove(usize),
        Fire(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(|with_time| Op::Add { with_time }),
            (0..8usize).prop_map(Op::Toggle),
            Just(Op::ClearCompleted),
            Just(Op::ResetAll),
            (0..8usize).prop_map(Op::Remove),
            (0..8usize).prop_map(Op::Fire),
        ]
    }

    proptest! {
        #[test]
        fn prop_completed_tasks_never_keep_alarms(
            ops in proptest::collection::vec(op_strategy(), 1..40),
            exact_granted in any::<bool>(),
        ) {
            let (store, alarms, notifier) =
                (InMemoryTaskStore::new(), MockAlarmService::new(), RecordingNotifier::new());
            alarms.set_exact_granted(exact_granted);
            let mut list = controller(&store, &alarms, &notifier);

            for op in ops {
                let ids: Vec<TaskId> = store.snapshot().iter().map(|t| t.id).collect();
                match op {
                    Op::Add { with_time } => {
                        list.add("Task", "", with_time.then(t0)).unwrap();
                    }
                    Op::Toggle(i) if !ids.is_empty() => {
                        list.toggle_complete(ids[i % ids.len()]).unwrap();
                    }
                    Op::Remove(i) if !ids.is_empty() => {
                        list.remove(ids[i % ids.len()]).unwrap();
                    }
                    Op::Fire(i) if !ids.is_empty() => {
                        let id = ids[i % ids.len()];
                        if alarms.fire(id).is_some() {
                            list.mark_fired(id).unwrap();
                        }
                    }
                    Op::ClearCompleted => {
                        list.clear_completed().unwrap();
                    }
                    Op::ResetAll => {
                        list.reset_all().unwrap();
                    }
                    Op::Toggle(_) | Op::Remove(_) | Op::Fire(_) => {}
                }

                for task in store.snapshot() {
                    if task.is_completed {
                        prop_assert_eq!(task.notification_id(), None);
                        prop_assert!(alarms.armed(task.id).is_none());
                    }
                    if task.notification_id().is_some() {
                        prop_assert!(task.scheduled_time().is_some());
                        prop_assert!(alarms.armed(task.id).is_some());
                    }
                }
            }
        }
    }
}
