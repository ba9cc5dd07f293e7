//! Formatting utilities

use chrono::{DateTime, Local, TimeZone};

/// Countdown display, `MM:SS` (minutes may exceed 59)
pub fn countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Accumulated focus time, `1h 5m` or `5m`
pub fn total_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Wall clock for the dashboard header
pub fn clock(dt: DateTime<Local>, hour24: bool) -> String {
    if hour24 {
        dt.format("%H:%M").to_string()
    } else {
        dt.format("%I:%M %p").to_string()
    }
}

/// Long date line under the clock
pub fn long_date(dt: DateTime<Local>) -> String {
    dt.format("%A, %B %-d, %Y").to_string()
}

/// Format an epoch-millisecond timestamp relative to `now_ms` (e.g., "2m ago")
pub fn relative_time(then_ms: i64, now_ms: i64) -> String {
    let secs = ((now_ms - then_ms) / 1000).max(0);

    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Local date-time for an epoch-millisecond timestamp
pub fn timestamp(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Truncate a string to max length (in chars) with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
