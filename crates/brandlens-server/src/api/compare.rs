use axum::{extract::State, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde::Deserialize;

use brandlens_core::{aggregate, resolve_site, AnalysisError, BrandPattern, DateRange};
use brandlens_gsc::{fetch_period, GscClient};

use super::{map_analysis_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub site_url: String,
    pub current_start_date: String,
    pub current_end_date: String,
    pub previous_start_date: String,
    pub previous_end_date: String,
    #[serde(default)]
    pub brand_pattern: String,
    pub access_token: String,
}

pub async fn compare_periods(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CompareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let map_err = |e: AnalysisError| map_analysis_error(req_id.0.clone(), &e);

    let pattern = BrandPattern::compile(&request.brand_pattern).map_err(&map_err)?;
    let today = Utc::now().date_naive();
    let current_range =
        DateRange::parse(&request.current_start_date, &request.current_end_date, today)
            .map_err(|e| map_err(AnalysisError::DateRange(e)))?;
    let previous_range = DateRange::parse(
        &request.previous_start_date,
        &request.previous_end_date,
        today,
    )
    .map_err(|e| map_err(AnalysisError::DateRange(e)))?;

    let client = GscClient::new(&request.access_token, state.gsc_timeout_secs)
        .map_err(|e| map_err(AnalysisError::from(e)))?;

    let sites = client
        .list_sites()
        .await
        .map_err(|e| map_err(AnalysisError::from(e)))?;
    let property = resolve_site(&request.site_url, &sites).map_err(&map_err)?;
    tracing::info!(
        %property,
        current_start = %current_range.start,
        previous_start = %previous_range.start,
        "running period comparison"
    );

    // The two windows are independent fetches; run them concurrently and
    // only compare once both periods are fully materialized.
    let (current_fetch, previous_fetch) = tokio::try_join!(
        fetch_period(&client, &property, &current_range),
        fetch_period(&client, &property, &previous_range),
    )
    .map_err(&map_err)?;

    let current = aggregate(
        current_fetch.rows,
        &pattern,
        current_fetch.total_clicks_reported,
    );
    let previous = aggregate(
        previous_fetch.rows,
        &pattern,
        previous_fetch.total_clicks_reported,
    );
    let result = brandlens_core::compare(previous, current);

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}
