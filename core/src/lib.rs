pub mod config;
pub mod error;
pub mod model;
pub mod repository;
pub mod schedule;
pub mod service;
pub mod time;

pub use config::{Config, Settings};
pub use error::{Result, TaskError};
pub use model::task::{NewTask, Priority, Status, Task, TaskId};
pub use repository::{SqliteTaskRepository, TaskRepository};
pub use schedule::{FirstTick, Ticker, Timers};
pub use service::reminder::{NotificationSink, ReminderBatch, ReminderCycle, ReminderEntry};
pub use service::task_service::{BatchOutcome, ReminderDecision, TaskService};
pub use time::{describe_duration, format_due, parse_due, parse_duration, Clock, FixedClock, SystemClock};
