//! Periodic due-task reminders.
//!
//! A reminder tick looks at every task that is still open, picks the ones that are
//! already due or fall inside the lookahead window, and hands them to a
//! [`NotificationSink`] as one batch. The single decision that comes back is applied
//! to the whole batch.

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info};

use crate::error::Result;
use crate::model::task::{Status, Task, TaskId};
use crate::repository::TaskRepository;
use crate::service::resolver::resolve_status;
use crate::service::task_service::{BatchOutcome, ReminderDecision, TaskService};
use crate::time::Clock;

pub const DEFAULT_LOOKAHEAD_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderEntry {
    pub task: Task,
    /// Due strictly before the time of the check.
    pub overdue: bool,
}

/// Everything a single reminder tick wants to show the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderBatch {
    pub checked_at: NaiveDateTime,
    pub entries: Vec<ReminderEntry>,
}

impl ReminderBatch {
    pub fn ids(&self) -> Vec<TaskId> {
        self.entries.iter().map(|e| e.task.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Presents a reminder batch and reports the user's choice. `None` means the
/// prompt was closed without picking anything.
pub trait NotificationSink {
    fn notify(&mut self, batch: &ReminderBatch) -> anyhow::Result<Option<ReminderDecision>>;
}

/// What one full reminder cycle did.
#[derive(Debug)]
pub struct CycleReport {
    pub batch: ReminderBatch,
    pub decision: Option<ReminderDecision>,
    pub outcome: BatchOutcome,
    /// The task list as refreshed after the decision.
    pub tasks: Vec<Task>,
}

/// Picks open tasks whose due time is at most `lookahead` away from `now`.
///
/// Past due times give a negative distance and always qualify. Tasks whose due text
/// does not parse, and tasks that are Done or Dismissed, are left out.
pub fn select_due(tasks: Vec<Task>, now: NaiveDateTime, lookahead: Duration) -> Vec<ReminderEntry> {
    tasks
        .into_iter()
        .filter(|task| !task.status.is_terminal())
        .filter_map(|task| {
            let due = task.due_at()?;
            if due - now > lookahead {
                return None;
            }
            let overdue = resolve_status(task.status, Some(due), now) == Status::Overdue;
            Some(ReminderEntry { task, overdue })
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct ReminderCycle {
    lookahead: Duration,
}

impl Default for ReminderCycle {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_LOOKAHEAD_MINUTES))
    }
}

impl ReminderCycle {
    pub fn new(lookahead: Duration) -> Self {
        Self { lookahead }
    }

    pub fn lookahead(&self) -> Duration {
        self.lookahead
    }

    /// The batch for this tick, or `None` when nothing qualifies.
    pub fn poll<R: TaskRepository, C: Clock>(
        &self,
        service: &TaskService<R, C>,
    ) -> Result<Option<ReminderBatch>> {
        let now = service.now();
        let candidates = service.repository().list_active()?;
        let entries = select_due(candidates, now, self.lookahead);

        if entries.is_empty() {
            debug!("no tasks due");
            return Ok(None);
        }
        info!(count = entries.len(), "reminder batch ready");
        Ok(Some(ReminderBatch {
            checked_at: now,
            entries,
        }))
    }

    /// Applies the decision taken on `batch` (if any) and refreshes the task list.
    pub fn conclude<R: TaskRepository, C: Clock>(
        &self,
        service: &TaskService<R, C>,
        batch: ReminderBatch,
        decision: Option<ReminderDecision>,
    ) -> Result<CycleReport> {
        let outcome = match decision {
            Some(decision) => service.apply_reminder_decision(&batch.ids(), decision),
            None => {
                debug!(count = batch.len(), "reminder closed without a decision");
                BatchOutcome::default()
            }
        };
        let tasks = service.list()?;
        Ok(CycleReport {
            batch,
            decision,
            outcome,
            tasks,
        })
    }

    /// Poll, ask `sink` once for the whole batch, apply, refresh.
    pub fn run_once<R: TaskRepository, C: Clock, S: NotificationSink>(
        &self,
        service: &TaskService<R, C>,
        sink: &mut S,
    ) -> anyhow::Result<Option<CycleReport>> {
        let Some(batch) = self.poll(service)? else {
            return Ok(None);
        };
        let decision = sink.notify(&batch)?;
        Ok(Some(self.conclude(service, batch, decision)?))
    }
}
