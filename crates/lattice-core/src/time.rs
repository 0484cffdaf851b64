//! Timestamp helpers shared by the models and the storage layer.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::constants::SECONDS_PER_DAY;

/// Render a timestamp the way it is persisted: RFC 3339, nanosecond precision, `Z` suffix.
///
/// Fixed width, so lexical order in SQLite matches chronological order.
pub fn to_db_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a persisted timestamp.
pub fn from_db_string(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Age in fractional days between `since` and `now`. Never negative.
pub fn age_days(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let delta = now - since;
    let secs = match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    };
    (secs / SECONDS_PER_DAY).max(0.0)
}
