use chrono::{DateTime, NaiveDate, Utc};

use crate::error::CoreError;

/// Which end of a range a bound is for. Decides how a bare date widens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// A bare date means its first instant.
    Start,
    /// A bare date means its last instant, so the whole day is included.
    End,
}

/// Parses a range bound given as an RFC 3339 timestamp (any offset,
/// normalized to UTC) or a `YYYY-MM-DD` date taken in UTC.
pub fn parse_bound(field: &str, input: &str, kind: BoundKind) -> Result<DateTime<Utc>, CoreError> {
    let input = input.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let invalid = || {
        CoreError::Validation(
            field.to_string(),
            format!("invalid '{field}' date: '{input}' is not an RFC 3339 timestamp or YYYY-MM-DD date"),
        )
    };
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| invalid())?;
    let datetime = match kind {
        BoundKind::Start => date.and_hms_opt(0, 0, 0),
        BoundKind::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };
    datetime.map(|dt| dt.and_utc()).ok_or_else(invalid)
}
