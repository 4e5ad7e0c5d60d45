//! Human-readable "how long ago" labels for recalled memories.

const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Formats `timestamp` (unix seconds) relative to `now` (unix seconds).
///
/// Only past times are meaningful; a timestamp in the future is reported as "just now".
pub fn relative_time_label(timestamp: i64, now: i64) -> String {
    let seconds = now - timestamp;
    if seconds < 0 {
        return "just now".to_string();
    }
    let days = seconds / SECS_PER_DAY;

    if days >= 320 {
        let years = (days as f64 / 365.0).round() as i64;
        return plural(years.max(1), "year");
    }
    if days >= 25 {
        return plural((days as f64 / 30.0).round() as i64, "month");
    }
    if days >= 7 {
        return plural((days as f64 / 7.0).round() as i64, "week");
    }
    match days {
        1 => return "yesterday".to_string(),
        2 => return "the day before yesterday".to_string(),
        d if d >= 3 => return plural(d, "day"),
        _ => {}
    }
    if seconds >= SECS_PER_HOUR {
        return plural((seconds as f64 / SECS_PER_HOUR as f64).round() as i64, "hour");
    }
    if seconds >= 600 {
        return "recently".to_string();
    }
    "just now".to_string()
}
