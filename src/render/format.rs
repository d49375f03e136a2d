//! Text formatting shared by every rendering surface.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Characters of the body shown in a list preview.
pub const PREVIEW_CHARS: usize = 80;

/// Accepted timestamp layouts besides RFC 3339 / RFC 2822.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse an ISO-ish gateway timestamp. Zone-less values are read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Local));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

/// `"1 min"`, `"3 mins"`, ...
fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Relative age of a timestamp as seen at `now`.
///
/// `Just now` under a minute (including clock-skewed future stamps), then
/// minutes, hours, days up to a week, then the plain date.
pub fn time_ago(raw: &str, now: DateTime<Local>) -> String {
    let Some(at) = parse_timestamp(raw) else {
        return "Unknown time".to_string();
    };

    let diff = now - at;
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{} ago", plural(mins, "min"))
    } else if hours < 24 {
        format!("{} ago", plural(hours, "hour"))
    } else if days < 7 {
        format!("{} ago", plural(days, "day"))
    } else {
        at.format("%-m/%-d/%Y").to_string()
    }
}

/// Long form used in the detail view: `Sunday, October 18, 2026 at 02:30 PM`.
///
/// Unparseable values are shown verbatim; missing ones as `Unknown`.
pub fn format_datetime(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "Unknown".to_string();
    }
    match parse_timestamp(raw) {
        Some(at) => at.format("%A, %B %-d, %Y at %I:%M %p").to_string(),
        None => raw.to_string(),
    }
}

/// List preview: the first [`PREVIEW_CHARS`] characters plus `...`.
pub fn preview(body: &str) -> String {
    if body.is_empty() {
        return "No preview available".to_string();
    }
    let head: String = body.chars().take(PREVIEW_CHARS).collect();
    format!("{head}...")
}

/// `"1 email"` / `"N emails"`.
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 email".to_string()
    } else {
        format!("{count} emails")
    }
}
