use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use tickler_core::{Clock, ReminderDecision, TaskRepository};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, FormField, InputMode, Notice};
use crate::tui::theme::{priority_look, status_look, THEME};

pub fn draw<R: TaskRepository, C: Clock>(f: &mut Frame, app: &mut App<R, C>) {
    let size = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // New task form
            Constraint::Min(1),    // Task list
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Footer/Help
        ])
        .split(size);

    let header = Paragraph::new("My Tasks")
        .style(Style::default().fg(THEME.primary).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(header, main_chunks[0]);

    draw_form(f, app, main_chunks[1]);
    draw_task_list(f, app, main_chunks[2]);
    draw_status_bar(f, app, main_chunks[3]);

    let help = match app.input_mode {
        InputMode::Normal => "a: Add | c/Enter: Complete | d: Delete | r: Refresh | j/k: Navigate | q: Quit",
        InputMode::Adding => "Tab: Next field | ←/→: Priority | Enter: Add | Esc: Cancel",
        InputMode::ConfirmDelete => "y: Delete | n/Esc: Keep",
        InputMode::Reminder => "c: Complete | s: Snooze | d: Dismiss | ←/→ + Enter: Choose | Esc: Close",
    };
    let footer = Paragraph::new(help)
        .style(Style::default().fg(THEME.muted))
        .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[4]);

    match app.input_mode {
        InputMode::ConfirmDelete => draw_confirm_delete(f, app, size),
        InputMode::Reminder => draw_reminder(f, app, size),
        InputMode::Normal | InputMode::Adding => {}
    }
}

fn draw_form<R: TaskRepository, C: Clock>(f: &mut Frame, app: &App<R, C>, area: Rect) {
    let editing = app.input_mode == InputMode::Adding;
    let label = |field: FormField, text: &'static str| {
        let style = if editing && app.form.focus == field {
            Style::default().fg(THEME.primary).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(THEME.muted)
        };
        Span::styled(text, style)
    };

    let priority = priority_look(app.form.priority);
    let lines = vec![
        Line::from(vec![
            label(FormField::Description, "New Task: "),
            Span::raw(app.form.description.as_str()),
        ]),
        Line::from(vec![
            label(FormField::Due, "Due Date: "),
            Span::raw(app.form.due.as_str()),
        ]),
        Line::from(vec![
            label(FormField::Priority, "Priority: "),
            Span::styled(format!("◀ {} ▶", app.form.priority), priority.style),
        ]),
    ];

    let title = if editing { " Add Task " } else { " Add Task (a) " };
    let form = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(form, area);

    if editing {
        if let Some(text) = app.form.focused_text() {
            let row = match app.form.focus {
                FormField::Description => 0,
                _ => 1,
            };
            let before_cursor: String = text.chars().take(app.form.cursor_position).collect();
            let x = area.x + 1 + "New Task: ".len() as u16 + before_cursor.width() as u16;
            f.set_cursor_position((x, area.y + 1 + row));
        }
    }
}

fn draw_task_list<R: TaskRepository, C: Clock>(f: &mut Frame, app: &mut App<R, C>, area: Rect) {
    let rows: Vec<Row> = app
        .tasks
        .iter()
        .map(|task| {
            let status = status_look(task.status);
            let priority = priority_look(task.priority);

            Row::new(vec![
                Span::raw(status.icon),
                Span::styled(priority.short, priority.style),
                Span::raw(task.due.clone()),
                Span::raw(task.status.as_str()),
                Span::raw(task.description.clone()),
            ])
            .style(status.row)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),  // Status icon
            Constraint::Length(3),  // Priority
            Constraint::Length(17), // Due
            Constraint::Length(10), // Status
            Constraint::Min(10),    // Description
        ],
    )
    .header(Row::new(vec!["St", "Pr", "Due", "Status", "Task"]).style(Style::default().fg(THEME.primary)))
    .block(Block::default().title(" Tasks ").borders(Borders::ALL).border_type(BorderType::Rounded))
    .row_highlight_style(Style::default().bg(THEME.selection).add_modifier(Modifier::BOLD))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn draw_status_bar<R: TaskRepository, C: Clock>(f: &mut Frame, app: &App<R, C>, area: Rect) {
    let (text, style) = match &app.notice {
        Notice::Info(text) => (text.as_str(), Style::default().fg(THEME.info)),
        Notice::Error(text) => (text.as_str(), Style::default().fg(THEME.alert)),
    };
    f.render_widget(Paragraph::new(format!(" {}", text)).style(style), area);
}

fn draw_confirm_delete<R: TaskRepository, C: Clock>(f: &mut Frame, app: &App<R, C>, area: Rect) {
    let Some(task) = &app.pending_delete else { return };
    let popup = centered_rect(50, 20, area);

    let text = vec![
        Line::from(format!("Delete task: {}?", task.description)),
        Line::from(""),
        Line::from(Span::styled("[y] Yes   [n] No", Style::default().fg(THEME.muted))),
    ];
    let dialog = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Confirm Delete ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(THEME.alert)),
        );
    f.render_widget(Clear, popup);
    f.render_widget(dialog, popup);
}

fn draw_reminder<R: TaskRepository, C: Clock>(f: &mut Frame, app: &App<R, C>, area: Rect) {
    let Some(batch) = &app.reminder else { return };
    let popup = centered_rect(70, 60, area);

    let mut text = vec![
        Line::from(Span::styled(
            "The following tasks are due:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for entry in &batch.entries {
        let mut spans = vec![
            Span::raw("• "),
            Span::raw(entry.task.description.as_str()),
            Span::styled(format!(" - Due: {}", entry.task.due), Style::default().fg(THEME.muted)),
        ];
        if entry.overdue {
            spans.push(Span::styled(
                " (OVERDUE!)",
                Style::default().fg(THEME.alert).add_modifier(Modifier::BOLD),
            ));
        }
        text.push(Line::from(spans));
    }
    text.push(Line::from(""));

    let buttons: Vec<Span> = ReminderDecision::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, decision)| {
            let label = match decision {
                ReminderDecision::Snooze => format!(" {} ({}) ", decision.label(), app.snooze_label),
                _ => format!(" {} ", decision.label()),
            };
            let style = if i == app.reminder_choice {
                Style::default().fg(THEME.primary).add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                Style::default()
            };
            [Span::styled(label, style), Span::raw("  ")]
        })
        .collect();
    text.push(Line::from(buttons).alignment(Alignment::Center));

    let dialog = Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Task Due Notification ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(THEME.alert)),
    );
    f.render_widget(Clear, popup);
    f.render_widget(dialog, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
