use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::parse_due;

pub type TaskId = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Next priority in `ALL`, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }

    pub fn cycle_back(self) -> Self {
        match self {
            Priority::Low => Priority::High,
            Priority::Medium => Priority::Low,
            Priority::High => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "l" | "low" => Ok(Priority::Low),
            "m" | "med" | "medium" => Ok(Priority::Medium),
            "h" | "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Pending,
    Overdue,
    Done,
    Dismissed,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Pending, Status::Overdue, Status::Done, Status::Dismissed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Overdue => "Overdue",
            Status::Done => "Done",
            Status::Dismissed => "Dismissed",
        }
    }

    /// Done and Dismissed are never changed by the automatic overdue check.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Dismissed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status: '{}'", s))
    }
}

/// A stored task.
///
/// `due` keeps the column text as stored. Everything written by this crate is in the
/// `%Y-%m-%d %H:%M` format, but a row edited by hand may not be, so callers go through
/// [`Task::due_at`] and decide what an unparseable value means for them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub due: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: String,
}

impl Task {
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        parse_due(&self.due).ok()
    }
}

/// Input for [`crate::repository::TaskRepository::insert`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub description: String,
    pub due: NaiveDateTime,
    pub priority: Priority,
    pub created_at: NaiveDateTime,
}
