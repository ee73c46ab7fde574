use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::SessionMode;

pub fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

/// Fixed-width so the text column sorts chronologically.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_mode(value: &str) -> Result<SessionMode> {
    SessionMode::ALL
        .iter()
        .copied()
        .find(|mode| mode.as_str() == value)
        .ok_or_else(|| anyhow!("unknown session mode {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes_only() {
        assert_eq!(parse_mode("barometer").unwrap(), SessionMode::Barometer);
        assert_eq!(parse_mode("altimeter").unwrap(), SessionMode::Altimeter);
        assert!(parse_mode("hygrometer").is_err());
    }

    #[test]
    fn rejects_malformed_timestamps() {
        assert!(parse_datetime("2024-05-01T10:00:00Z", "start_date").is_ok());
        assert!(parse_datetime("yesterday", "start_date").is_err());
    }
}
