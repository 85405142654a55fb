pub mod sqlite;
pub mod traits;

// Re-export
pub use sqlite::SqliteTaskRepository;
pub use traits::TaskRepository;
