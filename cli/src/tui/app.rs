use chrono::NaiveDateTime;
use crossterm::event::KeyCode;
use ratatui::widgets::TableState;
use tickler_core::{
    format_due, BatchOutcome, Clock, Priority, ReminderBatch, ReminderCycle, ReminderDecision,
    SqliteTaskRepository, SystemClock, Task, TaskError, TaskId, TaskRepository, TaskService,
};
use tracing::{debug, error};

/// Messages posted to the UI loop by the background timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Refresh,
    ReminderCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Adding,
    ConfirmDelete,
    Reminder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Description,
    Due,
    Priority,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Description => FormField::Due,
            FormField::Due => FormField::Priority,
            FormField::Priority => FormField::Description,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormField::Description => FormField::Priority,
            FormField::Due => FormField::Description,
            FormField::Priority => FormField::Due,
        }
    }
}

/// The new-task inputs. Due starts at the current minute, priority at Low.
pub struct TaskForm {
    pub description: String,
    pub due: String,
    pub priority: Priority,
    pub focus: FormField,
    /// In chars, within the focused text field.
    pub cursor_position: usize,
}

impl TaskForm {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            description: String::new(),
            due: format_due(now),
            priority: Priority::default(),
            focus: FormField::Description,
            cursor_position: 0,
        }
    }

    pub fn reset(&mut self, now: NaiveDateTime) {
        *self = Self::new(now);
    }

    pub fn focused_text(&self) -> Option<&str> {
        match self.focus {
            FormField::Description => Some(&self.description),
            FormField::Due => Some(&self.due),
            FormField::Priority => None,
        }
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Description => Some(&mut self.description),
            FormField::Due => Some(&mut self.due),
            FormField::Priority => None,
        }
    }

    fn focus(&mut self, field: FormField) {
        self.focus = field;
        self.cursor_position = self.focused_text().map(|t| t.chars().count()).unwrap_or(0);
    }

    pub fn next_field(&mut self) {
        self.focus(self.focus.next());
    }

    pub fn previous_field(&mut self) {
        self.focus(self.focus.previous());
    }

    pub fn input_char(&mut self, c: char) {
        let cursor = self.cursor_position;
        if let Some(text) = self.focused_text_mut() {
            let byte_index = text.chars().take(cursor).map(|c| c.len_utf8()).sum();
            text.insert(byte_index, c);
            self.cursor_position += 1;
        } else if c == ' ' {
            self.priority = self.priority.cycle();
        }
    }

    pub fn delete_char(&mut self) {
        let cursor = self.cursor_position;
        if cursor == 0 {
            return;
        }
        if let Some(text) = self.focused_text_mut() {
            let byte_index: usize = text.chars().take(cursor - 1).map(|c| c.len_utf8()).sum();
            text.remove(byte_index);
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.focus == FormField::Priority {
            self.priority = self.priority.cycle_back();
        } else if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        match self.focused_text() {
            None => self.priority = self.priority.cycle(),
            Some(text) => {
                if self.cursor_position < text.chars().count() {
                    self.cursor_position += 1;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct App<R: TaskRepository = SqliteTaskRepository, C: Clock = SystemClock> {
    /// `None` when the store could not be opened; the UI still runs.
    pub service: Option<TaskService<R, C>>,
    store_error: Option<String>,
    pub reminders: ReminderCycle,
    pub snooze_label: String,
    pub tasks: Vec<Task>,
    pub state: TableState,
    pub form: TaskForm,
    pub input_mode: InputMode,
    /// Mode to go back to once the reminder dialog closes.
    resume_mode: InputMode,
    pub pending_delete: Option<Task>,
    pub reminder: Option<ReminderBatch>,
    /// Index into `ReminderDecision::ALL`.
    pub reminder_choice: usize,
    pub notice: Notice,
    bell: bool,
    pub should_quit: bool,
}

impl<R: TaskRepository, C: Clock> App<R, C> {
    pub fn new(service: TaskService<R, C>, reminders: ReminderCycle, snooze_label: String) -> Self {
        let form = TaskForm::new(service.now());
        let mut app = Self::with_parts(Some(service), None, reminders, snooze_label, form);
        app.reload_tasks();
        if !app.tasks.is_empty() {
            app.state.select(Some(0));
        }
        app
    }

    /// Opens without a store, reporting `err` and refusing store-backed actions.
    pub fn without_store(err: &TaskError, reminders: ReminderCycle, snooze_label: String) -> Self {
        let message = format!("Failed to initialize database: {}", err);
        let form = TaskForm::new(SystemClock.now());
        let mut app = Self::with_parts(None, Some(message.clone()), reminders, snooze_label, form);
        app.notice = Notice::Error(message);
        app
    }

    fn with_parts(
        service: Option<TaskService<R, C>>,
        store_error: Option<String>,
        reminders: ReminderCycle,
        snooze_label: String,
        form: TaskForm,
    ) -> Self {
        App {
            service,
            store_error,
            reminders,
            snooze_label,
            tasks: Vec::new(),
            state: TableState::default(),
            form,
            input_mode: InputMode::Normal,
            resume_mode: InputMode::Normal,
            pending_delete: None,
            reminder: None,
            reminder_choice: 0,
            notice: Notice::Info("Ready".to_string()),
            bell: false,
            should_quit: false,
        }
    }

    fn now(&self) -> NaiveDateTime {
        match &self.service {
            Some(service) => service.now(),
            None => SystemClock.now(),
        }
    }

    fn report(&mut self, notice: Notice) {
        if let Notice::Error(message) = &notice {
            error!(%message, "reported to user");
        }
        self.notice = notice;
    }

    fn unavailable(&mut self) {
        let message = self
            .store_error
            .clone()
            .unwrap_or_else(|| "Task store unavailable".to_string());
        self.report(Notice::Error(message));
    }

    /// True once after the reminder dialog opened.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    // --- Navigation ---

    pub fn next(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        let i = match self.state.selected() {
            Some(i) => {
                if i >= self.tasks.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    self.tasks.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    // --- Store-backed actions ---

    /// Re-reads the list (resolving overdue tasks) and keeps the selection on the same
    /// task when it still exists.
    pub fn reload_tasks(&mut self) {
        let Some(service) = &self.service else { return };
        let selected_id = self.selected_task().map(|t| t.id);

        match service.list() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.select_after_reload(selected_id);
            }
            Err(e) => self.report(Notice::Error(format!("Failed to load tasks: {}", e))),
        }
    }

    fn select_after_reload(&mut self, selected_id: Option<TaskId>) {
        if self.tasks.is_empty() {
            self.state.select(None);
            return;
        }
        let by_id = selected_id.and_then(|id| self.tasks.iter().position(|t| t.id == id));
        let index = match (by_id, self.state.selected()) {
            (Some(i), _) => i,
            (None, Some(i)) => i.min(self.tasks.len() - 1),
            (None, None) => 0,
        };
        self.state.select(Some(index));
    }

    pub fn submit_add(&mut self) {
        let Some(service) = &self.service else { return self.unavailable() };

        match service.create(&self.form.description, &self.form.due, self.form.priority) {
            Ok(task) => {
                let now = service.now();
                self.form.reset(now);
                self.input_mode = InputMode::Normal;
                self.reload_tasks();
                if let Some(i) = self.tasks.iter().position(|t| t.id == task.id) {
                    self.state.select(Some(i));
                }
                self.report(Notice::Info(format!("Task added: {}", task.description)));
            }
            Err(e) => self.report(Notice::Error(e.to_string())),
        }
    }

    pub fn complete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return self.report(Notice::Error("Please select a task to mark complete".to_string()));
        };
        let Some(service) = &self.service else { return self.unavailable() };

        match service.complete(id) {
            Ok(()) => {
                self.reload_tasks();
                self.report(Notice::Info("Task marked complete".to_string()));
            }
            Err(e) => self.report(Notice::Error(format!("Failed to update task status: {}", e))),
        }
    }

    pub fn request_delete(&mut self) {
        match self.selected_task().cloned() {
            None => self.report(Notice::Error("Please select a task to delete".to_string())),
            Some(task) => {
                self.pending_delete = Some(task);
                self.input_mode = InputMode::ConfirmDelete;
            }
        }
    }

    pub fn answer_delete(&mut self, confirmed: bool) {
        self.input_mode = InputMode::Normal;
        let Some(task) = self.pending_delete.take() else { return };
        if !confirmed {
            return;
        }
        let Some(service) = &self.service else { return self.unavailable() };

        match service.delete(task.id) {
            Ok(()) => {
                self.reload_tasks();
                self.report(Notice::Info(format!("Task deleted: {}", task.description)));
            }
            Err(e) => {
                self.reload_tasks();
                self.report(Notice::Error(format!("Failed to delete task: {}", e)));
            }
        }
    }

    // --- Reminders ---

    pub fn check_reminders(&mut self) {
        if self.input_mode == InputMode::Reminder {
            debug!("reminder dialog still open, skipping check");
            return;
        }
        let Some(service) = &self.service else { return };

        match self.reminders.poll(service) {
            Ok(Some(batch)) => {
                self.reminder = Some(batch);
                self.reminder_choice = 0;
                self.resume_mode = self.input_mode;
                self.input_mode = InputMode::Reminder;
                self.bell = true;
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "error checking due tasks"),
        }
    }

    pub fn answer_reminder(&mut self, decision: Option<ReminderDecision>) {
        self.input_mode = self.resume_mode;
        let Some(batch) = self.reminder.take() else { return };
        let Some(service) = &self.service else { return self.unavailable() };

        match self.reminders.conclude(service, batch, decision) {
            Ok(report) => {
                let selected_id = self.selected_task().map(|t| t.id);
                self.tasks = report.tasks;
                self.select_after_reload(selected_id);
                if let Some(decision) = decision {
                    let notice = describe_outcome(decision, &report.outcome);
                    self.report(notice);
                }
            }
            Err(e) => self.report(Notice::Error(format!("Failed to update tasks: {}", e))),
        }
    }

    // --- Input dispatch ---

    pub fn on_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Refresh => self.reload_tasks(),
            AppEvent::ReminderCheck => self.check_reminders(),
        }
    }

    pub fn on_key(&mut self, code: KeyCode) {
        match self.input_mode {
            InputMode::Normal => match code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Down | KeyCode::Char('j') => self.next(),
                KeyCode::Up | KeyCode::Char('k') => self.previous(),
                KeyCode::Char('a') => self.input_mode = InputMode::Adding,
                KeyCode::Char('c') | KeyCode::Char(' ') | KeyCode::Enter => self.complete_selected(),
                KeyCode::Char('d') | KeyCode::Delete => self.request_delete(),
                KeyCode::Char('r') => self.reload_tasks(),
                _ => {}
            },
            InputMode::Adding => match code {
                KeyCode::Enter => self.submit_add(),
                KeyCode::Esc => self.input_mode = InputMode::Normal,
                KeyCode::Tab | KeyCode::Down => self.form.next_field(),
                KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
                KeyCode::Char(c) => self.form.input_char(c),
                KeyCode::Backspace => self.form.delete_char(),
                KeyCode::Left => self.form.move_cursor_left(),
                KeyCode::Right => self.form.move_cursor_right(),
                _ => {}
            },
            InputMode::ConfirmDelete => match code {
                KeyCode::Char('y') | KeyCode::Enter => self.answer_delete(true),
                KeyCode::Char('n') | KeyCode::Esc => self.answer_delete(false),
                _ => {}
            },
            InputMode::Reminder => match code {
                KeyCode::Char('c') => self.answer_reminder(Some(ReminderDecision::Complete)),
                KeyCode::Char('s') => self.answer_reminder(Some(ReminderDecision::Snooze)),
                KeyCode::Char('d') | KeyCode::Char('x') => self.answer_reminder(Some(ReminderDecision::Dismiss)),
                KeyCode::Left => {
                    let n = ReminderDecision::ALL.len();
                    self.reminder_choice = (self.reminder_choice + n - 1) % n;
                }
                KeyCode::Right | KeyCode::Tab => {
                    self.reminder_choice = (self.reminder_choice + 1) % ReminderDecision::ALL.len();
                }
                KeyCode::Enter => {
                    let decision = ReminderDecision::ALL[self.reminder_choice];
                    self.answer_reminder(Some(decision));
                }
                KeyCode::Esc => self.answer_reminder(None),
                _ => {}
            },
        }
    }
}

fn describe_outcome(decision: ReminderDecision, outcome: &BatchOutcome) -> Notice {
    if let Some((id, err)) = outcome.failed.first() {
        return Notice::Error(format!(
            "Failed to update {} task(s); task {}: {}",
            outcome.failed.len(),
            id,
            err
        ));
    }
    let verb = match decision {
        ReminderDecision::Complete => "Marked complete",
        ReminderDecision::Snooze => "Snoozed",
        ReminderDecision::Dismiss => "Dismissed",
    };
    Notice::Info(format!("{}: {} task(s)", verb, outcome.applied.len()))
}
