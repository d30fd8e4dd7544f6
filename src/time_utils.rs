// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp, normalizing to UTC.
///
/// Returns `None` for anything unparseable; callers treat that as "no bound".
pub fn parse_rfc3339_lenient(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert epoch milliseconds to a UTC timestamp, dropping sub-second precision.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(millis.div_euclid(1000), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_uses_z_suffix() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2024-03-01T12:30:00Z");
    }

    #[test]
    fn test_parse_normalizes_offset() {
        let parsed = parse_rfc3339_lenient(Some("2024-03-01T14:30:00+02:00")).unwrap();
        assert_eq!(format_utc_rfc3339(parsed), "2024-03-01T12:30:00Z");
    }

    #[test]
    fn test_parse_ignores_garbage() {
        assert!(parse_rfc3339_lenient(None).is_none());
        assert!(parse_rfc3339_lenient(Some("")).is_none());
        assert!(parse_rfc3339_lenient(Some("yesterday")).is_none());
        assert!(parse_rfc3339_lenient(Some("2024-03-01")).is_none());
    }

    #[test]
    fn test_from_epoch_millis_truncates() {
        let date = from_epoch_millis(1_709_296_200_999).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2024-03-01T12:30:00Z");
    }
}
