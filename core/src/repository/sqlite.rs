//! SQLite-backed task store.
//!
//! One `tasks` table; `due` and `status` are stored as text so the database stays
//! readable with any SQLite shell.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Result, TaskError};
use crate::model::task::{NewTask, Status, Task, TaskId};
use crate::repository::traits::TaskRepository;
use crate::time::{format_due, CREATED_AT_FORMAT};

pub const DEFAULT_DB_FILE_NAME: &str = "tasks.db";

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    task       TEXT NOT NULL,
    due        TEXT NOT NULL,
    priority   TEXT NOT NULL,
    status     TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due);
";

const SELECT_COLUMNS: &str = "SELECT id, task, due, priority, status, created_at FROM tasks";

/// The connection is neither `Sync` nor meant to be shared: the owning thread does all
/// store work, background timers only post messages to it.
pub struct SqliteTaskRepository {
    path: Option<PathBuf>,
    conn: Connection,
}

impl SqliteTaskRepository {
    /// Open (or create) the database file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        debug!(path = %path.display(), "opened task database");
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { path: None, conn })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn query_tasks(&self, sql: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    fn expect_one_row(changed: usize, id: TaskId) -> Result<()> {
        if changed == 0 {
            Err(TaskError::NotFound(id))
        } else {
            Ok(())
        }
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn insert(&self, task: &NewTask) -> Result<Task> {
        let description = task.description.trim();
        if description.is_empty() {
            return Err(TaskError::validation("Please enter a task description"));
        }

        self.conn.execute(
            "INSERT INTO tasks (task, due, priority, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                description,
                format_due(task.due),
                task.priority.as_str(),
                Status::Pending.as_str(),
                task.created_at.format(CREATED_AT_FORMAT).to_string(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get(id)
    }

    fn get(&self, id: TaskId) -> Result<Task> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                row_to_task,
            )
            .optional()?
            .ok_or(TaskError::NotFound(id))
    }

    fn list_all_ordered_by_due(&self) -> Result<Vec<Task>> {
        self.query_tasks(&format!("{} ORDER BY due ASC, id ASC", SELECT_COLUMNS))
    }

    fn list_active(&self) -> Result<Vec<Task>> {
        self.query_tasks(&format!(
            "{} WHERE status NOT IN ('Done', 'Dismissed') ORDER BY due ASC, id ASC",
            SELECT_COLUMNS
        ))
    }

    fn update_status(&self, id: TaskId, status: Status) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Self::expect_one_row(changed, id)
    }

    fn update_due(&self, id: TaskId, due: NaiveDateTime) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET due = ?1 WHERE id = ?2",
            params![format_due(due), id],
        )?;
        Self::expect_one_row(changed, id)
    }

    fn delete(&self, id: TaskId) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Self::expect_one_row(changed, id)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let priority: String = row.get(3)?;
    let status: String = row.get(4)?;
    Ok(Task {
        id: row.get(0)?,
        description: row.get(1)?,
        due: row.get(2)?,
        priority: priority
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?,
        status: status
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?,
        created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}
