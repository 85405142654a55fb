use chrono::NaiveDateTime;

use crate::model::task::{Status, Task};

/// Effective status of a task at `now`.
///
/// Done and Dismissed are returned untouched. Otherwise a due time strictly before
/// `now` is Overdue and anything else is Pending. An unparseable due (`None`) keeps
/// the stored status.
pub fn resolve_status(stored: Status, due: Option<NaiveDateTime>, now: NaiveDateTime) -> Status {
    if stored.is_terminal() {
        return stored;
    }
    match due {
        Some(due) if due < now => Status::Overdue,
        Some(_) => Status::Pending,
        None => stored,
    }
}

pub fn resolve(task: &Task, now: NaiveDateTime) -> Status {
    resolve_status(task.status, task.due_at(), now)
}
