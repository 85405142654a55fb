use chrono::NaiveDateTime;

use crate::error::Result;
use crate::model::task::{NewTask, Status, Task, TaskId};

/// Durable task storage. Every call is atomic on its own; nothing spans calls.
pub trait TaskRepository {
    fn insert(&self, task: &NewTask) -> Result<Task>;
    fn get(&self, id: TaskId) -> Result<Task>;
    /// All tasks, ascending by due, ties by id.
    fn list_all_ordered_by_due(&self) -> Result<Vec<Task>>;
    /// Tasks that are neither Done nor Dismissed, in the same order.
    fn list_active(&self) -> Result<Vec<Task>>;
    fn update_status(&self, id: TaskId, status: Status) -> Result<()>;
    fn update_due(&self, id: TaskId, due: NaiveDateTime) -> Result<()>;
    fn delete(&self, id: TaskId) -> Result<()>;
    fn count(&self) -> Result<usize>;
}
