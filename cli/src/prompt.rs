use std::io::{BufRead, Write};

use anyhow::Result;
use tickler_core::{NotificationSink, ReminderBatch, ReminderDecision};

/// Reminder prompt for the `remind` command: prints the batch, reads one answer.
pub struct PromptSink<R, W> {
    input: R,
    output: W,
    snooze_label: String,
}

impl<R: BufRead, W: Write> PromptSink<R, W> {
    pub fn new(input: R, output: W, snooze_label: String) -> Self {
        Self {
            input,
            output,
            snooze_label,
        }
    }
}

impl<R: BufRead, W: Write> NotificationSink for PromptSink<R, W> {
    fn notify(&mut self, batch: &ReminderBatch) -> Result<Option<ReminderDecision>> {
        // Terminal bell, then the list.
        write!(self.output, "\x07")?;
        writeln!(self.output, "The following tasks are due:")?;
        for entry in &batch.entries {
            let tag = if entry.overdue { " (OVERDUE!)" } else { "" };
            writeln!(
                self.output,
                "  - {} - Due: {}{}",
                entry.task.description, entry.task.due, tag
            )?;
        }
        write!(
            self.output,
            "[c] Mark Complete  [s] Snooze ({})  [d] Dismiss  [Enter] close: ",
            self.snooze_label
        )?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(parse_decision(&answer))
    }
}

pub fn parse_decision(answer: &str) -> Option<ReminderDecision> {
    match answer.trim().to_lowercase().as_str() {
        "c" | "complete" => Some(ReminderDecision::Complete),
        "s" | "snooze" => Some(ReminderDecision::Snooze),
        "d" | "dismiss" => Some(ReminderDecision::Dismiss),
        _ => None,
    }
}

/// Yes/no question; anything but `y`/`yes` is a no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tickler_core::{Priority, ReminderEntry, Status, Task};

    fn batch() -> ReminderBatch {
        let task = |id, description: &str, due: &str| Task {
            id,
            description: description.to_string(),
            due: due.to_string(),
            priority: Priority::High,
            status: Status::Pending,
            created_at: String::new(),
        };
        ReminderBatch {
            checked_at: tickler_core::parse_due("2024-01-01 10:00").unwrap(),
            entries: vec![
                ReminderEntry { task: task(1, "Pay rent", "2024-01-01 09:00"), overdue: true },
                ReminderEntry { task: task(2, "Call bank", "2024-01-01 10:30"), overdue: false },
            ],
        }
    }

    #[test]
    fn test_prompt_lists_batch_and_reads_decision() {
        let mut out = Vec::new();
        let decision = PromptSink::new(Cursor::new("s\n"), &mut out, "1 hour".to_string())
            .notify(&batch())
            .unwrap();

        assert_eq!(decision, Some(ReminderDecision::Snooze));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Pay rent - Due: 2024-01-01 09:00 (OVERDUE!)"));
        assert!(text.contains("Call bank - Due: 2024-01-01 10:30\n"));
        assert!(text.contains("Snooze (1 hour)"));
    }

    #[test]
    fn test_empty_answer_closes_without_decision() {
        let mut out = Vec::new();
        let decision = PromptSink::new(Cursor::new("\n"), &mut out, "1 hour".to_string())
            .notify(&batch())
            .unwrap();
        assert_eq!(decision, None);
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(parse_decision("C"), Some(ReminderDecision::Complete));
        assert_eq!(parse_decision(" dismiss "), Some(ReminderDecision::Dismiss));
        assert_eq!(parse_decision("later"), None);
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let mut out = Vec::new();
        assert!(confirm(&mut Cursor::new("y\n"), &mut out, "Delete?").unwrap());
        assert!(!confirm(&mut Cursor::new("\n"), &mut out, "Delete?").unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut out, "Delete?").unwrap());
    }
}
