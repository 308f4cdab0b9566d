//! Timestamp parsing for the observation and encounter inputs.
//!
//! Source exports write timestamps as `YYYY-MM-DD HH:MM:SS`; some tools
//! substitute a `T` separator or append fractional seconds, and bare dates
//! occur in hand-curated files. All of these are accepted; a bare date
//! resolves to midnight.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("empty timestamp")]
    Empty,
    #[error("unparseable timestamp {0:?}")]
    Unparseable(String),
}

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty);
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }
    Err(TimestampError::Unparseable(trimmed.to_string()))
}

/// Canonical rendering used in every output file.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_separated_timestamps() {
        let parsed = parse_timestamp("2125-03-02 08:15:00").unwrap();
        assert_eq!(format_timestamp(parsed), "2125-03-02 08:15:00");
    }

    #[test]
    fn parses_t_separated_and_fractional_timestamps() {
        let a = parse_timestamp("2125-03-02T08:15:00").unwrap();
        let b = parse_timestamp("2125-03-02 08:15:00.250").unwrap();
        assert_eq!(a.date(), b.date());
        assert_eq!(format_timestamp(b), "2125-03-02 08:15:00");
    }

    #[test]
    fn bare_date_resolves_to_midnight() {
        let parsed = parse_timestamp("2125-03-02").unwrap();
        assert_eq!(format_timestamp(parsed), "2125-03-02 00:00:00");
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(parse_timestamp("  "), Err(TimestampError::Empty));
        assert_eq!(
            parse_timestamp("not-a-date"),
            Err(TimestampError::Unparseable("not-a-date".to_string()))
        );
        assert!(parse_timestamp("2125-13-40 08:00:00").is_err());
    }
}
