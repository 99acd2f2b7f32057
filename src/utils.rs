// Utility functions
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses a calendar date from the formats used by the public datasets.
///
/// Accepts `2024-01-31`, `2024-01-31 08:15:00` and RFC 3339 timestamps;
/// only the date part is kept.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Percentage `100 * part / whole`, undefined when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(100.0 * part as f64 / whole as f64)
    }
}
