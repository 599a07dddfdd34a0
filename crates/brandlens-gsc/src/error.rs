use thiserror::Error;

use brandlens_core::AnalysisError;

/// Errors returned by the Search Console API client.
#[derive(Debug, Error)]
pub enum GscError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error body (quota, auth, bad property, ...).
    #[error("Search Console API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Upstream failures are non-retryable from the analysis layer's point of
/// view; they propagate with the client's detail attached.
impl From<GscError> for AnalysisError {
    fn from(error: GscError) -> Self {
        AnalysisError::Upstream(error.to_string())
    }
}
