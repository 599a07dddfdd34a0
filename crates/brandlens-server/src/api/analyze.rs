use axum::{extract::State, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use brandlens_core::{
    aggregate, aggregate::TOP_QUERIES, resolve_site, AnalysisError, BrandPattern, DateRange,
    PeriodResult, QuerySnapshot,
};
use brandlens_gsc::{fetch_period, GscClient};

use super::{map_analysis_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub site_url: String,
    pub start_date: String,
    pub end_date: String,
    /// `|`-separated brand keywords; empty means everything is non-brand.
    #[serde(default)]
    pub brand_pattern: String,
    /// OAuth bearer token with the webmasters.readonly scope.
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeData {
    pub summary: PeriodResult,
    pub top_brand_queries: Vec<QuerySnapshot>,
    pub top_non_brand_queries: Vec<QuerySnapshot>,
    /// Full per-query export, pre-rendered for download.
    pub csv: String,
}

pub async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let map_err = |e: AnalysisError| map_analysis_error(req_id.0.clone(), &e);

    // Validate the pattern and window before any upstream work.
    let pattern = BrandPattern::compile(&request.brand_pattern).map_err(&map_err)?;
    let today = Utc::now().date_naive();
    let range = DateRange::parse(&request.start_date, &request.end_date, today)
        .map_err(|e| map_err(AnalysisError::DateRange(e)))?;

    let client = GscClient::new(&request.access_token, state.gsc_timeout_secs)
        .map_err(|e| map_err(AnalysisError::from(e)))?;

    let sites = client
        .list_sites()
        .await
        .map_err(|e| map_err(AnalysisError::from(e)))?;
    let property = resolve_site(&request.site_url, &sites).map_err(&map_err)?;
    tracing::info!(%property, start = %range.start, end = %range.end, "running analysis");

    let fetched = fetch_period(&client, &property, &range)
        .await
        .map_err(&map_err)?;
    let summary = aggregate(fetched.rows, &pattern, fetched.total_clicks_reported);

    let csv = brandlens_report::render_period_csv(&request.site_url, &range, Utc::now(), &summary)
        .map_err(|e| {
            tracing::error!(error = %e, "CSV rendering failed");
            ApiError::new(req_id.0.clone(), "internal_error", "report rendering failed")
        })?;

    let data = AnalyzeData {
        top_brand_queries: summary.brand.top_queries(TOP_QUERIES).to_vec(),
        top_non_brand_queries: summary.non_brand.top_queries(TOP_QUERIES).to_vec(),
        csv,
        summary,
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
