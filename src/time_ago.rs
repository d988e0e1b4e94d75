use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a backend timestamp
///
/// Accepts RFC 3339 (`2024-03-01T10:00:00Z`) and the SQL `CURRENT_TIMESTAMP`
/// form (`2024-03-01 10:00:00`), which is stored in UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Human readable age of an instant relative to `now`
///
/// Buckets use floor division: under a minute is "Just now", then whole
/// minutes, hours and days. Instants in the future also read "Just now".
pub fn time_ago_between(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "Just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }

    plural(hours / 24, "day")
}

/// Relative-time label for a raw timestamp string
///
/// Returns an empty label when the timestamp cannot be parsed.
pub fn time_ago(raw: &str, now: DateTime<Utc>) -> String {
    match parse_timestamp(raw) {
        Some(then) => time_ago_between(then, now),
        None => String::new(),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {} ago", n, unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
