use thiserror::Error;

use crate::dates::DateRangeError;

/// Errors surfaced by the analysis pipeline.
///
/// Every variant terminates the current request. The engine never returns a
/// partial [`crate::PeriodResult`] or [`crate::ComparisonResult`] alongside
/// an error; the first failure aborts the whole aggregation or comparison.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The brand keyword pattern failed to compile.
    #[error("invalid brand pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The requested analysis window violates the date policy.
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// No authorized Search Console property matches the requested site.
    #[error(
        "no matching property for '{requested}' (cleaned to '{domain}'); available sites: [{}]",
        .available.join(", ")
    )]
    NoMatchingSite {
        requested: String,
        domain: String,
        available: Vec<String>,
    },

    /// A property matched the requested domain but its permission level does
    /// not allow querying search analytics.
    #[error("insufficient permission level '{level}' on property '{site_url}'")]
    InsufficientPermission { site_url: String, level: String },

    /// The unfiltered totals query returned no rows for the window.
    #[error("no data found for the requested period")]
    NoData,

    /// The upstream Search Console query failed. Not retried here.
    #[error("Search Console query failed: {0}")]
    Upstream(String),
}
