//! Search Console API request/response types (Webmasters v3 surface).
//!
//! Metric fields are declared as `double` in the API's discovery document,
//! clicks and impressions included, so the wire types keep them as `f64` and
//! conversion to the core row rounds them into counters.

use serde::{Deserialize, Serialize};

use brandlens_core::{DateRange, RawQueryRow, SiteEntry};

/// `GET sites` response: `{ "siteEntry": [...] }`. The key is absent
/// entirely for accounts with no properties.
#[derive(Debug, Deserialize)]
pub struct SitesListResponse {
    #[serde(default, rename = "siteEntry")]
    pub site_entry: Vec<SiteEntry>,
}

/// Body of a `searchAnalytics/query` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalyticsRequest {
    pub start_date: String,
    pub end_date: String,
    pub dimensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u32>,
}

impl SearchAnalyticsRequest {
    /// The no-dimension totals query for a window.
    #[must_use]
    pub fn totals(range: &DateRange) -> Self {
        Self {
            start_date: range.start.to_string(),
            end_date: range.end.to_string(),
            dimensions: Vec::new(),
            row_limit: None,
            start_row: None,
        }
    }

    /// One page of the query-dimension listing.
    #[must_use]
    pub fn queries(range: &DateRange, start_row: u32, row_limit: u32) -> Self {
        Self {
            start_date: range.start.to_string(),
            end_date: range.end.to_string(),
            dimensions: vec!["query".to_string()],
            row_limit: Some(row_limit),
            start_row: Some(start_row),
        }
    }
}

/// `searchAnalytics/query` response envelope. `rows` is absent when the
/// window has no data.
#[derive(Debug, Deserialize)]
pub struct SearchAnalyticsResponse {
    #[serde(default)]
    pub rows: Vec<ApiRow>,
}

/// One row of a search-analytics response. `keys` holds one value per
/// requested dimension; for query-dimension requests that is the query text.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

impl ApiRow {
    /// Convert a query-dimension row into the core row type. The first key
    /// is the query text; rows without keys map to an empty query.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn into_raw_query_row(self) -> RawQueryRow {
        let query = self.keys.into_iter().next().unwrap_or_default();
        RawQueryRow {
            query,
            clicks: self.clicks.round() as u64,
            impressions: self.impressions.round() as u64,
            ctr: self.ctr,
            position: self.position,
        }
    }
}
