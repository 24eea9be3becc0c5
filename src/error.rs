// =============================================================================
// Error taxonomy
// =============================================================================
//
// `ProviderError` covers everything that can go wrong while resolving one
// symbol against the upstream market-data provider. `ApiError` is what a
// request handler returns; it renders itself as a JSON envelope:
//
//   MissingParameter / InvalidParameter => 400 { "error": ... }
//   Provider                            => 500 { "symbol": ..., "error": ... }
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Upstream fetch or parse failure for a single symbol.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("timed out after {secs}s fetching {symbol}")]
    Timeout { symbol: String, secs: u64 },

    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Request-level error, converted into a JSON response at the boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required query parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("invalid query parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("{source}")]
    Provider {
        symbol: String,
        #[source]
        source: ProviderError,
    },
}

impl ApiError {
    pub fn provider(symbol: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            symbol: symbol.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Self::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Provider { symbol, source } => serde_json::json!({
                "symbol": symbol,
                "error": source.to_string(),
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
