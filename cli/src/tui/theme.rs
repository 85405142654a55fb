use ratatui::style::{Color, Modifier, Style};
use tickler_core::{Priority, Status};

// --- THEME ---
pub struct Theme {
    pub primary: Color,
    pub muted: Color,
    pub alert: Color,
    pub info: Color,
    pub selection: Color,
}

pub const THEME: Theme = Theme {
    primary: Color::Cyan,
    muted: Color::DarkGray,
    alert: Color::Red,
    info: Color::Green,
    selection: Color::DarkGray,
};

/// How a status shows up in the task table.
pub struct StatusLook {
    pub icon: &'static str,
    /// Applied to the whole row.
    pub row: Style,
}

pub fn status_look(status: Status) -> StatusLook {
    match status {
        Status::Pending => StatusLook {
            icon: "☐",
            row: Style::default(),
        },
        Status::Overdue => StatusLook {
            icon: "!",
            row: Style::default().fg(THEME.alert).add_modifier(Modifier::BOLD),
        },
        Status::Done => StatusLook {
            icon: "✔",
            row: Style::default().fg(THEME.muted).add_modifier(Modifier::ITALIC),
        },
        Status::Dismissed => StatusLook {
            icon: "✖",
            row: Style::default().fg(THEME.muted),
        },
    }
}

pub struct PriorityLook {
    pub short: &'static str,
    pub style: Style,
}

pub fn priority_look(priority: Priority) -> PriorityLook {
    match priority {
        Priority::High => PriorityLook {
            short: "H",
            style: Style::default().fg(Color::Red),
        },
        Priority::Medium => PriorityLook {
            short: "M",
            style: Style::default().fg(Color::Yellow),
        },
        Priority::Low => PriorityLook {
            short: "L",
            style: Style::default().fg(Color::Green),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_status_has_a_distinct_icon() {
        let icons: Vec<&str> = Status::ALL.iter().map(|s| status_look(*s).icon).collect();
        for (i, icon) in icons.iter().enumerate() {
            assert!(!icons[i + 1..].contains(icon), "duplicate icon {}", icon);
        }
    }

    #[test]
    fn test_done_is_muted_and_overdue_highlighted() {
        let done = status_look(Status::Done).row;
        assert_eq!(done.fg, Some(THEME.muted));
        assert!(done.add_modifier.contains(Modifier::ITALIC));

        let overdue = status_look(Status::Overdue).row;
        assert_eq!(overdue.fg, Some(THEME.alert));
    }

    #[test]
    fn test_priority_short_names() {
        let shorts: Vec<&str> = Priority::ALL.iter().map(|p| priority_look(*p).short).collect();
        assert_eq!(shorts, vec!["L", "M", "H"]);
    }
}
