//! Shared utility functions for the avalanche reconciliation crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

    /// Calendar date format used by every wire schema: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Date-time formats seen in forecast and observation records, tried in order.
    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];

    /// First month of a forecast season (September).
    pub const SEASON_START_MONTH: u32 = 9;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|e| DateError(format!("'{}': {}", s, e)))
    }

    /// Parse a date that may carry a time of day.
    ///
    /// Accepts a bare date, a naive date-time (optionally with fractional
    /// seconds) or an RFC 3339 timestamp. Offsets are dropped and the local
    /// wall-clock time is kept, since records are stamped in the time zone
    /// they were issued in. The time is `None` for a bare date.
    pub fn parse_date_time(s: &str) -> Result<(NaiveDate, Option<NaiveTime>), DateError> {
        let trimmed = s.trim();
        if let Ok(date) = parse_date(trimmed) {
            return Ok((date, None));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            let local = dt.naive_local();
            return Ok((local.date(), Some(local.time())));
        }
        for format in DATE_TIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok((dt.date(), Some(dt.time())));
            }
        }
        Err(DateError(format!("'{}' is not a recognised date or date-time", s)))
    }

    /// Get the forecast season a date belongs to.
    /// A season runs Sep 1 to Aug 31 and is named after both years,
    /// e.g. Sep 1 2016 -> "2016-17", Aug 31 2017 -> "2016-17"
    pub fn season_for_date(date: &NaiveDate) -> String {
        let start_year = season_start_year(date);
        format!("{}-{:02}", start_year, (start_year + 1).rem_euclid(100))
    }

    /// Year in which the season containing `date` started.
    pub fn season_start_year(date: &NaiveDate) -> i32 {
        if date.month() >= SEASON_START_MONTH {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// First and last day (inclusive) of a season named like "2016-17".
    pub fn season_dates(season: &str) -> Result<(NaiveDate, NaiveDate), DateError> {
        let invalid = || DateError(format!("'{}' is not a season like 2016-17", season));
        let (first, second) = season.trim().split_once('-').ok_or_else(invalid)?;
        let start_year: i32 = first.parse().map_err(|_| invalid())?;
        let end_suffix: i32 = second.parse().map_err(|_| invalid())?;
        if first.len() != 4 || second.len() != 2 || (start_year + 1).rem_euclid(100) != end_suffix {
            return Err(invalid());
        }
        let start = NaiveDate::from_ymd_opt(start_year, SEASON_START_MONTH, 1).ok_or_else(invalid)?;
        let end = NaiveDate::from_ymd_opt(start_year + 1, SEASON_START_MONTH - 1, 31).ok_or_else(invalid)?;
        Ok((start, end))
    }

}

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    #[error("Date error: {0}")]
    pub struct DateError(pub String);
}
