//! Timestamp Parsing for Database Rows
//!
//! Row timestamps arrive as strings whose format depends on the backend:
//! SQLite `CURRENT_TIMESTAMP` produces `"YYYY-MM-DD HH:MM:SS"`, while other
//! drivers (and older data) emit RFC 3339. Both are accepted.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse a timestamp in either SQLite or RFC 3339 format
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    // SQLite format first: "YYYY-MM-DD HH:MM:SS"
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }

    // RFC 3339: "YYYY-MM-DDTHH:MM:SSZ"
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    None
}

/// Serde deserializer for row timestamps (see [`parse_timestamp`])
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "unable to parse timestamp '{raw}' as SQLite or RFC 3339 format"
        ))
    })
}
