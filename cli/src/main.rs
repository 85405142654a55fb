mod logging;
mod prompt;
mod tui;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tickler_core::{
    describe_duration, format_due, Priority, ReminderCycle, ReminderDecision, Settings,
    SqliteTaskRepository, Task, TaskId, TaskService,
};
use tracing::info;

use crate::prompt::{confirm, PromptSink};

#[derive(Parser)]
#[command(name = "tickler")]
#[command(about = "A to-do list that reminds you when things are due", long_about = None)]
struct Cli {
    /// Directory for tasks.db, config.toml and tickler.log (default: ~/.tickler)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a new task (usage: add Pay rent --due "2024-01-01 09:00" --priority high)
    Add {
        /// Task description
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
        /// Due date as "yyyy-MM-dd HH:mm" (default: now)
        #[arg(long, short)]
        due: Option<String>,
        /// low, medium or high
        #[arg(long, short, default_value = "low")]
        priority: Priority,
    },
    /// List all tasks, marking overdue ones
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as done
    Complete { id: TaskId },
    /// Delete a task
    Delete {
        id: TaskId,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Check for due tasks once and decide what to do with them
    Remind,
    /// Open the Terminal User Interface
    Tui,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: TaskId,
    #[tabled(rename = "Task")]
    description: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Priority")]
    priority: Priority,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            description: task.description.clone(),
            due: task.due.clone(),
            priority: task.priority,
            status: task.status.to_string(),
        }
    }
}

fn open_service(settings: &Settings) -> Result<TaskService<SqliteTaskRepository>> {
    let repo = SqliteTaskRepository::open(&settings.database_path).with_context(|| {
        format!("Failed to open database {}", settings.database_path.display())
    })?;
    Ok(TaskService::new(repo).with_snooze(settings.snooze))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.data_dir)?;
    let _log_guard = logging::init(&settings)?;
    info!(data_dir = %settings.data_dir.display(), "tickler starting");

    match cli.command {
        Some(Commands::Add { description, due, priority }) => {
            let service = open_service(&settings)?;
            let due = due.unwrap_or_else(|| format_due(service.now()));
            let task = service.create(&description.join(" "), &due, priority)?;
            println!("Task added: {} (ID: {})", task.description, task.id);
            println!("  Due: {}", task.due);
            println!("  Priority: {}", task.priority);
        }
        Some(Commands::List { json }) => {
            let service = open_service(&settings)?;
            let tasks = service.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from).collect();
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        Some(Commands::Complete { id }) => {
            let service = open_service(&settings)?;
            service.complete(id)?;
            println!("Task {} marked complete.", id);
        }
        Some(Commands::Delete { id, yes }) => {
            let service = open_service(&settings)?;
            let task = service.get(id)?;
            let question = format!("Delete task: {}?", task.description);
            if yes || confirm(&mut io::stdin().lock(), &mut io::stdout(), &question)? {
                service.delete(id)?;
                println!("Task {} deleted.", id);
            } else {
                println!("Kept task {}.", id);
            }
        }
        Some(Commands::Remind) => {
            let service = open_service(&settings)?;
            let cycle = ReminderCycle::new(settings.reminder_lookahead);
            let mut sink = PromptSink::new(
                io::stdin().lock(),
                io::stdout(),
                describe_duration(settings.snooze),
            );
            match cycle.run_once(&service, &mut sink)? {
                None => println!("Nothing due in the next {}.", describe_duration(settings.reminder_lookahead)),
                Some(report) => {
                    let verb = match report.decision {
                        Some(ReminderDecision::Complete) => "Completed",
                        Some(ReminderDecision::Snooze) => "Snoozed",
                        Some(ReminderDecision::Dismiss) => "Dismissed",
                        None => "Left",
                    };
                    let count = if report.decision.is_some() {
                        report.outcome.applied.len()
                    } else {
                        report.batch.len()
                    };
                    println!("{} {} task(s).", verb, count);
                    for (id, err) in &report.outcome.failed {
                        eprintln!("  Task {}: {}", id, err);
                    }
                }
            }
        }
        Some(Commands::Tui) | None => {
            tui::run(&settings)?;
        }
    }
    info!("tickler exiting");
    Ok(())
}
