use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::{Result, TaskError};
use crate::model::task::{NewTask, Priority, Status, Task, TaskId};
use crate::repository::TaskRepository;
use crate::service::resolver::resolve;
use crate::time::{parse_due, truncate_to_minute, Clock, SystemClock};

pub const DEFAULT_SNOOZE_MINUTES: i64 = 60;

/// The user's answer to a reminder batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderDecision {
    Complete,
    Snooze,
    Dismiss,
}

impl ReminderDecision {
    pub const ALL: [ReminderDecision; 3] = [
        ReminderDecision::Complete,
        ReminderDecision::Snooze,
        ReminderDecision::Dismiss,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReminderDecision::Complete => "Mark Complete",
            ReminderDecision::Snooze => "Snooze",
            ReminderDecision::Dismiss => "Dismiss",
        }
    }
}

/// Per-id result of a batch update. Failed ids do not undo applied ones.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub applied: Vec<TaskId>,
    pub failed: Vec<(TaskId, TaskError)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct TaskService<R: TaskRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    snooze: Duration,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: TaskRepository, C: Clock> TaskService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            snooze: Duration::minutes(DEFAULT_SNOOZE_MINUTES),
        }
    }

    pub fn with_snooze(mut self, snooze: Duration) -> Self {
        self.snooze = snooze;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn create(&self, description: &str, due: &str, priority: Priority) -> Result<Task> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TaskError::validation("Please enter a task description"));
        }
        let due = parse_due(due).map_err(|e| {
            TaskError::validation(format!("Please enter a valid date in format: yyyy-MM-dd HH:mm ({})", e))
        })?;

        let task = self.repo.insert(&NewTask {
            description: description.to_string(),
            due,
            priority,
            created_at: self.clock.now(),
        })?;
        info!(id = task.id, due = %task.due, priority = %task.priority, "task created");
        Ok(task)
    }

    /// Every task ordered by due, with effective statuses written back to the store.
    pub fn list(&self) -> Result<Vec<Task>> {
        let now = self.clock.now();
        let mut tasks = self.repo.list_all_ordered_by_due()?;

        for task in &mut tasks {
            let resolved = resolve(task, now);
            // A failed write leaves the row for the next refresh to retry.
            if let Err(e) = self.persist_resolution(task, resolved) {
                warn!(id = task.id, error = %e, "could not persist resolved status");
                task.status = resolved;
            }
        }
        Ok(tasks)
    }

    /// Writes `resolved` if it differs from what `task` was read with, then updates
    /// `task`. Returns whether a write happened.
    pub fn persist_resolution(&self, task: &mut Task, resolved: Status) -> Result<bool> {
        if task.status == resolved {
            return Ok(false);
        }
        self.repo.update_status(task.id, resolved)?;
        debug!(id = task.id, from = %task.status, to = %resolved, "status resolved");
        task.status = resolved;
        Ok(true)
    }

    pub fn get(&self, id: TaskId) -> Result<Task> {
        self.repo.get(id)
    }

    /// Pending and Overdue tasks become Done. Completing a Done task is a no-op; a
    /// Dismissed one is rejected.
    pub fn complete(&self, id: TaskId) -> Result<()> {
        if self.close(id, Status::Done)? {
            info!(id, "task completed");
        }
        Ok(())
    }

    pub fn dismiss(&self, id: TaskId) -> Result<()> {
        if self.close(id, Status::Dismissed)? {
            info!(id, "task dismissed");
        }
        Ok(())
    }

    /// Moves an open task to the terminal status `to`. Returns whether a write happened.
    fn close(&self, id: TaskId, to: Status) -> Result<bool> {
        let task = self.repo.get(id)?;
        if task.status == to {
            return Ok(false);
        }
        if task.status.is_terminal() {
            return Err(TaskError::validation(format!(
                "Task {} is already {} and cannot become {}",
                id, task.status, to
            )));
        }
        self.repo.update_status(id, to)?;
        Ok(true)
    }

    /// Moves `due` to now plus the snooze period. The stored status is left alone; the
    /// next `list` resolves it against the new due time.
    pub fn snooze(&self, id: TaskId) -> Result<NaiveDateTime> {
        let due = self
            .clock
            .now()
            .checked_add_signed(self.snooze)
            .map(truncate_to_minute)
            .ok_or_else(|| TaskError::validation(format!("Snooze period {} is too long", self.snooze)))?;
        self.repo.update_due(id, due)?;
        info!(id, due = %due, "task snoozed");
        Ok(due)
    }

    pub fn delete(&self, id: TaskId) -> Result<()> {
        self.repo.delete(id)?;
        info!(id, "task deleted");
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        self.repo.count()
    }

    pub fn apply_reminder_decision(&self, ids: &[TaskId], decision: ReminderDecision) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for &id in ids {
            let result = match decision {
                ReminderDecision::Complete => self.complete(id),
                ReminderDecision::Snooze => self.snooze(id).map(|_| ()),
                ReminderDecision::Dismiss => self.dismiss(id),
            };
            match result {
                Ok(()) => outcome.applied.push(id),
                Err(e) => {
                    warn!(id, ?decision, error = %e, "reminder decision failed for task");
                    outcome.failed.push((id, e));
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteTaskRepository;
    use crate::time::{format_due, FixedClock};

    fn service_at(now: &str) -> TaskService<SqliteTaskRepository, FixedClock> {
        let repo = SqliteTaskRepository::open_in_memory().unwrap();
        TaskService::with_clock(repo, FixedClock::at(now).unwrap())
    }

    #[test]
    fn test_create_validates_input() {
        let service = service_at("2024-01-01 08:00");

        let err = service.create("   ", "2024-01-01 09:00", Priority::High).unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));

        let err = service.create("Pay rent", "2024/01/01", Priority::High).unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));

        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn test_create_starts_pending_with_creation_time() {
        let service = service_at("2024-01-01 08:00");
        let task = service.create(" Pay rent ", "2024-01-01 09:00", Priority::High).unwrap();

        assert_eq!(task.description, "Pay rent");
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.created_at, "2024-01-01 08:00:00");
    }

    #[test]
    fn test_list_persists_overdue_once() {
        let service = service_at("2024-01-01 08:00");
        let task = service.create("Pay rent", "2024-01-01 09:00", Priority::High).unwrap();

        service.clock().set(parse_due("2024-01-02 00:00").unwrap());
        let listed = service.list().unwrap();
        assert_eq!(listed[0].status, Status::Overdue);
        assert_eq!(service.get(task.id).unwrap().status, Status::Overdue);

        let mut again = service.get(task.id).unwrap();
        assert!(!service.persist_resolution(&mut again, Status::Overdue).unwrap());
        assert_eq!(service.list().unwrap()[0].status, Status::Overdue);
    }

    #[test]
    fn test_complete_and_missing_ids() {
        let service = service_at("2024-01-01 08:00");
        let task = service.create("Pay rent", "2024-01-01 09:00", Priority::High).unwrap();

        service.complete(task.id).unwrap();
        assert_eq!(service.get(task.id).unwrap().status, Status::Done);

        assert!(service.complete(999).unwrap_err().is_not_found());
        assert!(service.delete(999).unwrap_err().is_not_found());
    }

    #[test]
    fn test_closed_tasks_keep_their_terminal_status() {
        let service = service_at("2024-01-01 08:00");
        let dismissed = service.create("Call plumber", "2024-01-01 09:00", Priority::Low).unwrap();
        let done = service.create("Pay rent", "2024-01-01 09:00", Priority::High).unwrap();
        service.dismiss(dismissed.id).unwrap();
        service.complete(done.id).unwrap();

        let err = service.complete(dismissed.id).unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(service.get(dismissed.id).unwrap().status, Status::Dismissed);

        assert!(matches!(service.dismiss(done.id).unwrap_err(), TaskError::Validation(_)));
        assert_eq!(service.get(done.id).unwrap().status, Status::Done);

        service.complete(done.id).unwrap();
        service.dismiss(dismissed.id).unwrap();
        assert_eq!(service.get(done.id).unwrap().status, Status::Done);
        assert_eq!(service.get(dismissed.id).unwrap().status, Status::Dismissed);
    }

    #[test]
    fn test_snooze_past_the_calendar_is_rejected() {
        let service = service_at("2024-01-01 10:00").with_snooze(Duration::MAX);
        let task = service.create("Stretch", "2024-01-01 09:00", Priority::Low).unwrap();

        let err = service.snooze(task.id).unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(service.get(task.id).unwrap().due, "2024-01-01 09:00");
    }

    #[test]
    fn test_snooze_truncates_to_minute() {
        let service = service_at("2024-01-01 10:00");
        service.clock().advance(Duration::seconds(42));
        let task = service.create("Stretch", "2024-01-01 09:00", Priority::Low).unwrap();

        let due = service.snooze(task.id).unwrap();
        assert_eq!(format_due(due), "2024-01-01 11:00");
        assert_eq!(service.get(task.id).unwrap().due, "2024-01-01 11:00");
    }

    #[test]
    fn test_custom_snooze_period() {
        let service = service_at("2024-01-01 10:00").with_snooze(Duration::minutes(15));
        let task = service.create("Stretch", "2024-01-01 09:00", Priority::Low).unwrap();
        service.snooze(task.id).unwrap();
        assert_eq!(service.get(task.id).unwrap().due, "2024-01-01 10:15");
    }

    #[test]
    fn test_dismiss_decision_is_terminal() {
        let service = service_at("2024-01-01 10:00");
        let task = service.create("Water plants", "2024-01-01 09:00", Priority::Medium).unwrap();

        let outcome = service.apply_reminder_decision(&[task.id], ReminderDecision::Dismiss);
        assert!(outcome.is_complete());
        assert_eq!(outcome.applied, vec![task.id]);

        service.clock().advance(Duration::days(3));
        assert_eq!(service.list().unwrap()[0].status, Status::Dismissed);
    }
}
