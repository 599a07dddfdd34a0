use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Search Console exposes at most 16 months of history.
pub const MAX_SPAN_DAYS: i64 = 16 * 30;

/// A validated, inclusive analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidFormat { value: String },

    #[error("end date {end} is later than {cutoff}; search data lags by a day")]
    EndAfterCutoff { end: NaiveDate, cutoff: NaiveDate },

    #[error("date range {start} to {end} exceeds the {MAX_SPAN_DAYS}-day maximum")]
    SpanTooLong { start: NaiveDate, end: NaiveDate },

    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

impl DateRange {
    /// Validate a window against the freshness cutoff and span policy.
    ///
    /// `today` is passed in rather than read from the clock so the policy
    /// stays a pure function.
    ///
    /// # Errors
    ///
    /// Returns a [`DateRangeError`] when the end date is past yesterday, the
    /// span exceeds [`MAX_SPAN_DAYS`], or the start is after the end.
    pub fn new(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<Self, DateRangeError> {
        let cutoff = today - chrono::Duration::days(1);
        if end > cutoff {
            return Err(DateRangeError::EndAfterCutoff { end, cutoff });
        }
        if end.signed_duration_since(start).num_days() > MAX_SPAN_DAYS {
            return Err(DateRangeError::SpanTooLong { start, end });
        }
        if start > end {
            return Err(DateRangeError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` strings and validate the resulting window.
    ///
    /// # Errors
    ///
    /// Returns [`DateRangeError::InvalidFormat`] for unparseable dates, then
    /// the same policy errors as [`DateRange::new`].
    pub fn parse(start: &str, end: &str, today: NaiveDate) -> Result<Self, DateRangeError> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        Self::new(start, end, today)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DateRangeError::InvalidFormat {
        value: value.to_string(),
    })
}
