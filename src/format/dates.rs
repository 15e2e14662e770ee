//! Date, relative time and duration formatting.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::timestamp;

pub const DEFAULT_DATE_FORMAT: &str = "%b %d, %Y %H:%M";

/// `May 01, 2024 08:05`, or `-` when absent.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    format_date_with(date, DEFAULT_DATE_FORMAT)
}

pub fn format_date_with(date: Option<DateTime<Utc>>, pattern: &str) -> String {
    match date {
        Some(date) => date.format(pattern).to_string(),
        None => "-".to_string(),
    }
}

/// Format a backend timestamp string; unparseable input renders `-`.
pub fn format_date_str(value: &str) -> String {
    format_date(timestamp::parse(value))
}

/// "5 minutes ago" / "in 2 hours", relative to the current time.
pub fn format_relative_time(date: Option<DateTime<Utc>>) -> String {
    format_relative_time_from(date, Utc::now())
}

pub fn format_relative_time_from(date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(date) = date else {
        return "-".to_string();
    };

    let seconds = (now - date).num_seconds();
    let distance = distance_in_words(seconds.unsigned_abs());
    if seconds >= 0 {
        format!("{} ago", distance)
    } else {
        format!("in {}", distance)
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

fn distance_in_words(seconds: u64) -> String {
    // thresholds in minutes
    const HOUR: u64 = 60;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let minutes = (seconds + 30) / 60;

    match minutes {
        0 => "less than a minute".to_string(),
        m if m < 45 => plural(m, "minute"),
        m if m < 90 => "about 1 hour".to_string(),
        m if m < DAY => format!("about {}", plural((m + HOUR / 2) / HOUR, "hour")),
        m if m < 42 * HOUR => "1 day".to_string(),
        m if m < MONTH => plural((m + DAY / 2) / DAY, "day"),
        m if m < 60 * DAY => format!("about {}", plural((m + MONTH / 2) / MONTH, "month")),
        m if m < YEAR => plural((m + MONTH / 2) / MONTH, "month"),
        m => format!("about {}", plural((m + YEAR / 2) / YEAR, "year")),
    }
}

/// Compact duration: `1d 2h`, `3h 4m`, `5m 6s` or `7s`. Absent or zero renders `-`.
pub fn format_duration(duration_ms: Option<i64>) -> String {
    let ms = match duration_ms {
        Some(ms) if ms != 0 => ms,
        _ => return "-".to_string(),
    };

    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

/// RFC 3339 with millisecond precision, e.g. `2024-05-01T08:05:00.000Z`.
pub fn to_iso_string(value: &str) -> Option<String> {
    timestamp::parse(value).map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true))
}
