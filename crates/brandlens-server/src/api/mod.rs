mod analyze;
mod compare;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use brandlens_core::AnalysisError;

use crate::middleware::{request_id, require_bearer_auth, ApiKeys, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub gsc_timeout_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "invalid_pattern" | "invalid_date_range" => StatusCode::BAD_REQUEST,
            "insufficient_permission" => StatusCode::FORBIDDEN,
            "no_matching_site" | "no_data" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Map an analysis failure to the wire error envelope.
pub(super) fn map_analysis_error(request_id: String, error: &AnalysisError) -> ApiError {
    let code = match error {
        AnalysisError::InvalidPattern { .. } => "invalid_pattern",
        AnalysisError::DateRange(_) => "invalid_date_range",
        AnalysisError::NoMatchingSite { .. } => "no_matching_site",
        AnalysisError::InsufficientPermission { .. } => "insufficient_permission",
        AnalysisError::NoData => "no_data",
        AnalysisError::Upstream(_) => "upstream_error",
    };
    if matches!(error, AnalysisError::Upstream(_)) {
        tracing::error!(error = %error, "upstream Search Console failure");
    } else {
        tracing::warn!(error = %error, "analysis request rejected");
    }
    ApiError::new(request_id, code, error.to_string())
}

fn build_cors(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = allowed_origin.parse()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ]))
}

fn protected_router(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/api/v1/analyze", post(analyze::analyze))
        .route("/api/v1/compare", post(compare::compare_periods))
        .layer(axum::middleware::from_fn_with_state(
            api_keys,
            require_bearer_auth,
        ))
}

/// Assemble the full application router.
///
/// # Errors
///
/// Fails when `allowed_origin` is not a valid header value.
pub fn build_app(
    state: AppState,
    api_keys: ApiKeys,
    allowed_origin: &str,
) -> anyhow::Result<Router> {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_router(api_keys))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors(allowed_origin)?)
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state))
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData { status: "ok" },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app(api_keys: ApiKeys) -> Router {
        build_app(
            AppState {
                gsc_timeout_secs: 30,
            },
            api_keys,
            "http://localhost:3000",
        )
        .expect("app should build")
    }

    fn analyze_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/analyze")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("invalid_pattern", StatusCode::BAD_REQUEST),
            ("invalid_date_range", StatusCode::BAD_REQUEST),
            ("insufficient_permission", StatusCode::FORBIDDEN),
            ("no_matching_site", StatusCode::NOT_FOUND),
            ("no_data", StatusCode::NOT_FOUND),
            ("upstream_error", StatusCode::BAD_GATEWAY),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "boom").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[tokio::test]
    async fn health_is_public_and_ok() {
        let app = test_app(ApiKeys::parse("secret"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["meta"]["request_id"].is_string());
    }

    #[tokio::test]
    async fn analyze_requires_bearer_auth_when_keys_configured() {
        let app = test_app(ApiKeys::parse("secret"));
        let response = app
            .oneshot(analyze_request(serde_json::json!({
                "site_url": "example.com",
                "start_date": "2026-07-01",
                "end_date": "2026-07-31",
                "brand_pattern": "mybrand",
                "access_token": "ya29.token",
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn analyze_rejects_an_invalid_pattern_before_any_fetch() {
        let app = test_app(ApiKeys::default());
        let response = app
            .oneshot(analyze_request(serde_json::json!({
                "site_url": "example.com",
                "start_date": "2026-07-01",
                "end_date": "2026-07-31",
                "brand_pattern": "mybrand|(",
                "access_token": "ya29.token",
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "invalid_pattern");
    }

    #[tokio::test]
    async fn analyze_rejects_a_backwards_date_range() {
        let app = test_app(ApiKeys::default());
        let response = app
            .oneshot(analyze_request(serde_json::json!({
                "site_url": "example.com",
                "start_date": "2026-07-31",
                "end_date": "2026-07-01",
                "brand_pattern": "mybrand",
                "access_token": "ya29.token",
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "invalid_date_range");
    }

    #[tokio::test]
    async fn compare_validates_both_windows() {
        let app = test_app(ApiKeys::default());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/compare")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "site_url": "example.com",
                            "current_start_date": "2026-07-01",
                            "current_end_date": "2026-07-31",
                            "previous_start_date": "2026-06-30",
                            "previous_end_date": "2026-06-01",
                            "brand_pattern": "mybrand",
                            "access_token": "ya29.token",
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "invalid_date_range");
    }
}
