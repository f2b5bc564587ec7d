use chrono::{NaiveDateTime, Timelike};

use crate::alarm::{AlarmTime, DayIndex};

pub const WEEK_DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn twelve_hour(hour: u32) -> (u32, &'static str) {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour % 12 {
        0 => 12,
        hour => hour,
    };
    (display, suffix)
}

/// `"07:05"` in 24-hour mode, `"7:05 AM"` otherwise.
pub fn format_alarm_time(time: &AlarmTime, is_24_hour_format: bool) -> String {
    if is_24_hour_format {
        return time.to_string();
    }

    let (hour, suffix) = twelve_hour(time.hour());
    format!("{}:{:02} {}", hour, time.minute(), suffix)
}

/// Wall clock with seconds, for the status line.
pub fn format_clock(now: &NaiveDateTime, is_24_hour_format: bool) -> String {
    if is_24_hour_format {
        return now.format("%H:%M:%S").to_string();
    }

    let (hour, suffix) = twelve_hour(now.hour());
    format!(
        "{}:{:02}:{:02} {}",
        hour,
        now.minute(),
        now.second(),
        suffix
    )
}

pub fn format_days(days: &[DayIndex]) -> String {
    if days.is_empty() {
        return "Every day".to_owned();
    }

    let mut sorted = days.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    sorted
        .iter()
        .filter_map(|day| WEEK_DAYS.get(usize::from(*day)))
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}
