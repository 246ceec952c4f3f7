//! Timestamp parsing for the shapes the TrueNAS API returns.
//!
//! The middleware is inconsistent: some fields are `{"$date": <epoch ms>}`
//! objects, some are RFC 3339 strings, some are naive ISO-8601 strings and
//! ZFS `rawvalue`s are epoch seconds. Anything else is `None`, which callers
//! treat as "infinitely old".

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp string. Naive values are interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    }

    None
}

/// Parse a JSON timestamp value (`{"$date": ms}` object or string).
pub fn parse_remote_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => map
            .get("$date")
            .and_then(Value::as_i64)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

/// Parse a `YYYY-MM-DD` date as midnight UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_timestamp("2024-03-01T12:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_naive_iso() {
        let a = parse_timestamp("2024-03-01T12:30:00").unwrap();
        let b = parse_timestamp("2024-03-01 12:30:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.day(), 1);
        assert!(parse_timestamp("2024-03-01T12:30:00.250").is_some());
    }

    #[test]
    fn test_parse_epoch_seconds() {
        let dt = parse_timestamp("1700000000").unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("Mon Jan  1 10:00 2024").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_parse_remote_date_object() {
        let dt = parse_remote_time(&json!({"$date": 1_700_000_000_123i64})).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_123);
        assert!(parse_remote_time(&json!({"other": 1})).is_none());
        assert!(parse_remote_time(&json!(null)).is_none());
        assert!(parse_remote_time(&json!("2024-01-01T00:00:00Z")).is_some());
    }

    #[test]
    fn test_parse_date() {
        let dt = parse_date("2024-05-06").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2024, 5, 6, 0));
        assert!(parse_date("06/05/2024").is_none());
    }
}
