use std::cell::Cell;

use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDateTime, Timelike};

/// Column format of `tasks.due`: local wall-clock time, minute precision.
pub const DUE_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_due(input: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input.trim(), DUE_FORMAT)
        .map_err(|e| anyhow!("'{}' is not a date in format yyyy-MM-dd HH:mm ({})", input.trim(), e))
}

pub fn format_due(due: NaiveDateTime) -> String {
    due.format(DUE_FORMAT).to_string()
}

/// Drops seconds and below, matching what survives a round trip through `DUE_FORMAT`.
pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

pub const MAX_DURATION_WEEKS: i64 = 52;

/// Durations in config and flags: `<n>m`, `<n>h`, `<n>d` or `<n>w`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let unit = input.chars().last().ok_or_else(|| anyhow!("Empty duration string"))?;
    let num_str = &input[..input.len() - unit.len_utf8()];

    let num: i64 = num_str
        .parse()
        .map_err(|_| anyhow!("Invalid duration number in '{}'", input))?;
    if num <= 0 {
        return Err(anyhow!("Duration must be positive: '{}'", input));
    }

    let duration = match unit.to_ascii_lowercase() {
        'm' => Duration::try_minutes(num),
        'h' => Duration::try_hours(num),
        'd' => Duration::try_days(num),
        'w' => Duration::try_weeks(num),
        _ => return Err(anyhow!("Unknown duration unit: {}", unit)),
    };
    match duration {
        Some(d) if d <= Duration::weeks(MAX_DURATION_WEEKS) => Ok(d),
        _ => Err(anyhow!("Duration '{}' is longer than {} weeks", input, MAX_DURATION_WEEKS)),
    }
}

/// "1 hour", "15 minutes", "2 days": the largest unit that divides `d` exactly.
pub fn describe_duration(d: Duration) -> String {
    let minutes = d.num_minutes();
    let (count, unit) = if minutes != 0 && minutes % (60 * 24 * 7) == 0 {
        (minutes / (60 * 24 * 7), "week")
    } else if minutes != 0 && minutes % (60 * 24) == 0 {
        (minutes / (60 * 24), "day")
    } else if minutes != 0 && minutes % 60 == 0 {
        (minutes / 60, "hour")
    } else {
        (minutes, "minute")
    };
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Source of "now" for status resolution, reminders and snoozing.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn at(text: &str) -> Result<Self> {
        Ok(Self::new(parse_due(text)?))
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_due_round_trips_format() {
        let dt = parse_due("2024-01-01 09:00").unwrap();
        assert_eq!(format_due(dt), "2024-01-01 09:00");
        assert_eq!(format_due(parse_due("  2024-03-05 23:59 ").unwrap()), "2024-03-05 23:59");
    }

    #[test]
    fn test_parse_due_rejects_other_formats() {
        assert!(parse_due("").is_err());
        assert!(parse_due("2024-01-01").is_err());
        assert!(parse_due("2024-13-01 09:00").is_err());
        assert!(parse_due("01/02/2024 09:00").is_err());
        assert!(parse_due("tomorrow").is_err());
    }

    #[test]
    fn test_truncate_to_minute() {
        let dt = NaiveDateTime::parse_from_str("2024-01-01 10:00:42", CREATED_AT_FORMAT).unwrap();
        assert_eq!(format_due(truncate_to_minute(dt)), "2024-01-01 10:00");
        assert_eq!(truncate_to_minute(dt).second(), 0);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_duration("2D").unwrap(), Duration::days(2));
        assert_eq!(parse_duration("1w").unwrap(), Duration::weeks(1));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("0m").is_err());
        assert!(parse_duration("5y").is_err());
        assert!(parse_duration("5é").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_huge_values() {
        assert_eq!(parse_duration("52w").unwrap(), Duration::weeks(52));
        assert!(parse_duration("53w").is_err());
        assert!(parse_duration("99999999999999999w").is_err());
        assert!(parse_duration("9223372036854775807m").is_err());
    }

    #[test]
    fn test_describe_duration() {
        assert_eq!(describe_duration(Duration::hours(1)), "1 hour");
        assert_eq!(describe_duration(Duration::minutes(90)), "90 minutes");
        assert_eq!(describe_duration(Duration::minutes(15)), "15 minutes");
        assert_eq!(describe_duration(Duration::days(2)), "2 days");
        assert_eq!(describe_duration(Duration::weeks(1)), "1 week");
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::at("2024-01-01 10:00").unwrap();
        clock.advance(Duration::minutes(90));
        assert_eq!(format_due(clock.now()), "2024-01-01 11:30");
    }
}
