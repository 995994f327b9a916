//! Worked-hours arithmetic.
//!
//! Times of day are `HH:mm` wall-clock strings. A shift whose end is earlier
//! than its start is taken to end on the following day.

use time::Time;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parse a 24-hour `HH:mm` time of day.
///
/// The hour may be one or two digits, the minute must be two digits.
pub fn parse_time_of_day(input: &str) -> Option<Time> {
    let (hour, minute) = input.trim().split_once(':')?;
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return None;
    }
    if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u8 = hour.parse().ok()?;
    let minute: u8 = minute.parse().ok()?;
    Time::from_hms(hour, minute, 0).ok()
}

/// Coerce free-form break input into whole non-negative minutes.
///
/// Blank, non-numeric, negative and non-finite input all yield 0.
/// Fractional minutes are truncated.
pub fn coerce_break_minutes(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(minutes) if minutes.is_finite() && minutes > 0.0 => minutes.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Net worked hours between `start` and `end`, minus `break_minutes`.
///
/// Malformed times yield `0.0`; the result is never negative.
///
/// ```
/// use hourbook_core::domain::hours::compute_hours;
///
/// assert_eq!(compute_hours("08:00", "16:00", 30), 7.5);
/// assert_eq!(compute_hours("22:00", "06:00", 0), 8.0);
/// ```
pub fn compute_hours(start: &str, end: &str, break_minutes: u32) -> f64 {
    let (Some(start), Some(end)) = (parse_time_of_day(start), parse_time_of_day(end)) else {
        return 0.0;
    };

    let mut minutes = minutes_since_midnight(end) - minutes_since_midnight(start);
    if minutes < 0 {
        minutes += MINUTES_PER_DAY;
    }

    let net = minutes - i64::from(break_minutes);
    (net as f64 / 60.0).max(0.0)
}

/// Hours rendered with two decimals, as shown in lists and reports.
pub fn format_hours(hours: f64) -> String {
    format!("{:.2}", hours)
}

fn minutes_since_midnight(t: Time) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}
