//! Calendar date text forms used by the two backends.
//!
//! The local record stores dates as ISO-8601 date-times at UTC midnight;
//! the remote tables store bare `YYYY-MM-DD` strings. Parsing accepts both.

use super::ScheduleDomainError;
use chrono::{DateTime, NaiveDate};

const CALENDAR_FORMAT: &str = "%Y-%m-%d";

/// Parses a bare calendar date or an RFC 3339 date-time.
///
/// Date-times keep the calendar day in their own offset, so
/// `2024-01-05T00:00:00.000Z` parses to 5 January 2024.
///
/// # Errors
///
/// Returns [`ScheduleDomainError::InvalidDate`] when the text matches
/// neither form.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, ScheduleDomainError> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, CALENDAR_FORMAT) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| ScheduleDomainError::InvalidDate(value.to_owned()))
}

/// Formats a date as a bare `YYYY-MM-DD` string.
#[must_use]
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format(CALENDAR_FORMAT).to_string()
}

/// Formats a date as an ISO-8601 date-time at UTC midnight.
#[must_use]
pub fn format_timestamp_date(date: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", format_calendar_date(date))
}
