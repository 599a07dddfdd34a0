use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer tokens accepted on protected routes.
///
/// An empty set disables the check, which is only allowed in development.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    keys: Arc<HashSet<String>>,
}

impl ApiKeys {
    /// Builds the accepted-key set from `BRANDLENS_API_KEYS`
    /// (comma-separated bearer tokens).
    ///
    /// # Errors
    ///
    /// Fails startup when no keys are configured outside development.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("BRANDLENS_API_KEYS").unwrap_or_default();
        let keys = Self::parse(&raw);

        if keys.keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "BRANDLENS_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(keys);
            }
            anyhow::bail!(
                "BRANDLENS_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(keys)
    }

    /// Parses a comma-separated token list; blanks are dropped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Self {
            keys: Arc::new(keys),
        }
    }

    fn enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    fn allows(&self, token: &str) -> bool {
        self.keys.contains(token)
    }
}

#[derive(Debug, Serialize)]
struct UnauthorizedBody {
    error: UnauthorizedError,
}

#[derive(Debug, Serialize)]
struct UnauthorizedError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// An incoming `x-request-id` header is reused; otherwise a fresh `UUIDv4`
/// is generated. The ID is stored as a [`RequestId`] extension and echoed on
/// the response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }
    res
}

/// Middleware enforcing bearer-token auth when any keys are configured.
pub async fn require_bearer_auth(
    State(api_keys): State<ApiKeys>,
    req: Request,
    next: Next,
) -> Response {
    if !api_keys.enabled() {
        return next.run(req).await;
    }

    match bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if api_keys.allows(token) => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(UnauthorizedBody {
                error: UnauthorizedError {
                    code: "unauthorized",
                    message: "missing or invalid bearer token",
                },
            }),
        )
            .into_response(),
    }
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
