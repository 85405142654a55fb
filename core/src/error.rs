use crate::model::task::TaskId;

/// Errors surfaced by the task store and the services built on it.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Rejected input. Nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The database file or its directory could not be created.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskError {
    pub fn validation(message: impl Into<String>) -> Self {
        TaskError::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::NotFound(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, TaskError::Storage(_) | TaskError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
