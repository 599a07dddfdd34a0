//! Orchestration of the two queries the aggregator needs per window.

use brandlens_core::{AnalysisError, DateRange, RawQueryRow};

use crate::client::GscClient;
use crate::types::ApiRow;

/// Everything the aggregator needs for one analysis window.
#[derive(Debug)]
pub struct FetchedPeriod {
    /// Clicks from the unfiltered totals query.
    pub total_clicks_reported: u64,
    /// Query rows in API order across all pages.
    pub rows: Vec<RawQueryRow>,
}

/// Fetch the totals row and the full query-row listing for one window.
///
/// # Errors
///
/// - [`AnalysisError::NoData`] when the totals query has no rows for the
///   window.
/// - [`AnalysisError::Upstream`] for any client failure; the first failing
///   request aborts the fetch.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub async fn fetch_period(
    client: &GscClient,
    site_url: &str,
    range: &DateRange,
) -> Result<FetchedPeriod, AnalysisError> {
    let Some(totals) = client.fetch_totals(site_url, range).await? else {
        return Err(AnalysisError::NoData);
    };
    let total_clicks_reported = totals.clicks.round() as u64;
    tracing::debug!(total_clicks_reported, "fetched period totals");

    let rows = client.fetch_query_rows(site_url, range).await?;
    tracing::info!(rows = rows.len(), %site_url, "fetched query rows for window");

    Ok(FetchedPeriod {
        total_clicks_reported,
        rows: rows.into_iter().map(ApiRow::into_raw_query_row).collect(),
    })
}
