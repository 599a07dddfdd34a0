//! HTTP client for the Search Console search-analytics API.
//!
//! Wraps `reqwest` with bearer-token auth, typed request/response handling,
//! and pagination over the query-dimension listing. Obtaining the token
//! (service-account exchange, OAuth) is the operator's concern; this client
//! only attaches it.

use std::time::Duration;

use reqwest::{Client, Url};

use brandlens_core::{DateRange, SiteEntry};

use crate::error::GscError;
use crate::types::{ApiRow, SearchAnalyticsRequest, SearchAnalyticsResponse, SitesListResponse};

const DEFAULT_BASE_URL: &str = "https://searchconsole.googleapis.com/webmasters/v3/";

/// Rows per page for the query-dimension fetch; the API caps requests here.
pub const DEFAULT_ROW_LIMIT: u32 = 25_000;

/// Client for the Search Console REST API.
///
/// Use [`GscClient::new`] for production or [`GscClient::with_base_url`] to
/// point at a mock server in tests.
pub struct GscClient {
    client: Client,
    access_token: String,
    base_url: Url,
    row_limit: u32,
}

impl GscClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`GscError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(access_token: &str, timeout_secs: u64) -> Result<Self, GscError> {
        Self::with_base_url(access_token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GscError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`GscError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        access_token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, GscError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("brandlens/0.1 (search-performance)")
            .build()?;

        // Normalise: exactly one trailing slash so joins keep the full path
        // instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| GscError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            access_token: access_token.to_owned(),
            base_url,
            row_limit: DEFAULT_ROW_LIMIT,
        })
    }

    /// Overrides the page size for the query-dimension fetch. Tests use this
    /// to exercise pagination without 25k-row fixtures.
    #[must_use]
    pub fn with_row_limit(mut self, row_limit: u32) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Lists the properties the token may access, with permission levels.
    ///
    /// # Errors
    ///
    /// - [`GscError::Api`] if the API returns an error body.
    /// - [`GscError::Http`] on network failure.
    /// - [`GscError::Deserialize`] if the response shape is unexpected.
    pub async fn list_sites(&self) -> Result<Vec<SiteEntry>, GscError> {
        let url = self
            .base_url
            .join("sites")
            .map_err(|e| GscError::Api(format!("invalid sites URL: {e}")))?;

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let body = Self::read_json(response, &url).await?;

        let parsed: SitesListResponse =
            serde_json::from_value(body).map_err(|e| GscError::Deserialize {
                context: "sites".to_string(),
                source: e,
            })?;
        Ok(parsed.site_entry)
    }

    /// Runs the no-dimension totals query for the window.
    ///
    /// Returns `None` when the API reports no rows for the period; the
    /// analysis layer decides what that means.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`GscClient::list_sites`].
    pub async fn fetch_totals(
        &self,
        site_url: &str,
        range: &DateRange,
    ) -> Result<Option<ApiRow>, GscError> {
        let request = SearchAnalyticsRequest::totals(range);
        let response = self.query_search_analytics(site_url, &request).await?;
        Ok(response.rows.into_iter().next())
    }

    /// Fetches every query-dimension row for the window, paging until the
    /// API returns a short or empty page. Row order follows the API across
    /// page boundaries.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`GscClient::list_sites`]; the first failing
    /// page aborts the whole fetch.
    pub async fn fetch_query_rows(
        &self,
        site_url: &str,
        range: &DateRange,
    ) -> Result<Vec<ApiRow>, GscError> {
        let mut all_rows = Vec::new();
        let mut start_row = 0_u32;

        loop {
            let request = SearchAnalyticsRequest::queries(range, start_row, self.row_limit);
            let response = self.query_search_analytics(site_url, &request).await?;
            let page_len = response.rows.len();
            tracing::debug!(start_row, rows = page_len, "fetched search analytics page");
            all_rows.extend(response.rows);

            if page_len < self.row_limit as usize {
                break;
            }
            start_row += self.row_limit;
        }

        Ok(all_rows)
    }

    async fn query_search_analytics(
        &self,
        site_url: &str,
        request: &SearchAnalyticsRequest,
    ) -> Result<SearchAnalyticsResponse, GscError> {
        let url = self.analytics_url(site_url)?;
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await?;
        let body = Self::read_json(response, &url).await?;

        serde_json::from_value(body).map_err(|e| GscError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Builds `sites/{siteUrl}/searchAnalytics/query` with the property
    /// identifier pushed as a single path segment, so URL-prefix properties
    /// like `https://example.com/` have their slashes percent-encoded.
    fn analytics_url(&self, site_url: &str) -> Result<Url, GscError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GscError::Api("base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("sites")
            .push(site_url)
            .push("searchAnalytics")
            .push("query");
        Ok(url)
    }

    /// Reads the body as JSON, surfacing the API's structured `error` object
    /// as [`GscError::Api`] regardless of HTTP status.
    async fn read_json(
        response: reqwest::Response,
        url: &Url,
    ) -> Result<serde_json::Value, GscError> {
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(body) => {
                Self::check_api_error(&body)?;
                if status.is_success() {
                    Ok(body)
                } else {
                    Err(GscError::Api(format!("unexpected HTTP status {status}")))
                }
            }
            Err(e) if status.is_success() => Err(GscError::Deserialize {
                context: url.to_string(),
                source: e,
            }),
            Err(_) => Err(GscError::Api(format!("unexpected HTTP status {status}"))),
        }
    }

    fn check_api_error(body: &serde_json::Value) -> Result<(), GscError> {
        if let Some(error) = body.get("error") {
            let msg = error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(GscError::Api(msg));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> GscClient {
        GscClient::with_base_url("test-token", 30, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn analytics_url_encodes_url_prefix_properties() {
        let client = test_client("https://searchconsole.googleapis.com/webmasters/v3/");
        let url = client.analytics_url("https://example.com/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://searchconsole.googleapis.com/webmasters/v3/sites/https:%2F%2Fexample.com%2F/searchAnalytics/query"
        );
    }

    #[test]
    fn analytics_url_keeps_domain_properties_readable() {
        let client = test_client("https://searchconsole.googleapis.com/webmasters/v3");
        let url = client.analytics_url("sc-domain:example.com").unwrap();
        assert!(
            url.path().ends_with("/sites/sc-domain:example.com/searchAnalytics/query"),
            "unexpected path: {}",
            url.path()
        );
    }

    #[test]
    fn check_api_error_surfaces_the_message() {
        let body = serde_json::json!({
            "error": { "code": 403, "message": "User does not have sufficient permission" }
        });
        let err = GscClient::check_api_error(&body).unwrap_err();
        assert!(err.to_string().contains("sufficient permission"));
    }

    #[test]
    fn check_api_error_passes_clean_bodies() {
        let body = serde_json::json!({ "rows": [] });
        assert!(GscClient::check_api_error(&body).is_ok());
    }
}
