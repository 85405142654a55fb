pub mod app;
pub mod theme;
pub mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tickler_core::{
    describe_duration, Clock, ReminderCycle, Settings, SqliteTaskRepository, TaskRepository,
    TaskService, Timers,
};
use tracing::{error, info};

use crate::tui::app::{App, AppEvent};

pub fn run(settings: &Settings) -> Result<()> {
    let mut app = open_app(settings);

    // Timers only post events; all store work happens on this thread.
    let (tx, rx) = unbounded();
    let timers = Timers::start(
        tx,
        to_std(settings.refresh_interval, "refresh_interval")?,
        to_std(settings.reminder_interval, "reminder_interval")?,
        || AppEvent::Refresh,
        || AppEvent::ReminderCheck,
    )?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    timers.shutdown();
    // Dropping the app closes the database connection.
    drop(app);
    info!("ui closed");

    if let Err(err) = res {
        println!("{:?}", err);
    }

    Ok(())
}

/// Opens the store; on failure the UI still starts and shows the error.
fn open_app(settings: &Settings) -> App {
    let reminders = ReminderCycle::new(settings.reminder_lookahead);
    let snooze_label = describe_duration(settings.snooze);

    match SqliteTaskRepository::open(&settings.database_path) {
        Ok(repo) => {
            let service = TaskService::new(repo).with_snooze(settings.snooze);
            App::new(service, reminders, snooze_label)
        }
        Err(e) => {
            error!(path = %settings.database_path.display(), error = %e, "failed to open database");
            App::without_store(&e, reminders, snooze_label)
        }
    }
}

fn to_std(d: chrono::Duration, key: &str) -> Result<Duration> {
    d.to_std().with_context(|| format!("`{}` must be positive", key))
}

fn run_app<B: Backend, R: TaskRepository, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<R, C>,
    events: &Receiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| io::Error::other(e.to_string()))?;

        if app.take_bell() {
            let mut out = io::stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code);
                }
            }
        }

        while let Ok(ev) = events.try_recv() {
            app.on_event(ev);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
