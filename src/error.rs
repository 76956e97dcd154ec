//! Gateway error types and their client-facing rendering.
//!
//! Every failure is converted at the request boundary into a JSON body of the
//! form `{"error": "<message>"}` with an explicit status code. Origin responses
//! with status >= 400 are not errors here; they are passed through verbatim by
//! the relay.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to the client by the gateway itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// `/proxy` was called without a `url` parameter.
    #[error("Missing required query parameter 'url'")]
    MissingTarget,

    /// The query string could not be decoded (e.g. `url` given twice).
    #[error("Malformed query string: {0}")]
    MalformedQuery(String),

    /// The target could not be parsed as an absolute http(s) URI.
    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    /// The origin could not be reached or the exchange broke before completion.
    #[error("Failed to connect to upstream server: {0}")]
    Connect(String),

    /// No credentials are configured for the credentialed route.
    #[error("API keys are not configured on the server.")]
    NotConfigured,

    /// Every credential in the pool was rejected by the origin.
    #[error("All {attempts} available API keys have exceeded their quota.")]
    CredentialsExhausted { attempts: usize },

    /// The handler did not produce response headers within the configured bound.
    #[error("Upstream did not respond within {secs}s")]
    HandlerTimeout { secs: u64 },

    /// A middleware layer failed for a reason other than a timeout.
    #[error("Internal middleware error: {0}")]
    Middleware(String),

    /// The upstream HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Status code presented to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingTarget => StatusCode::BAD_REQUEST,
            GatewayError::MalformedQuery(_) => StatusCode::BAD_REQUEST,
            GatewayError::InvalidTarget { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Connect(_) => StatusCode::BAD_GATEWAY,
            GatewayError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::CredentialsExhausted { .. } => StatusCode::FORBIDDEN,
            GatewayError::HandlerTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Middleware(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Gateway error");
        } else {
            tracing::warn!(status = %status, error = %message, "Gateway error");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Render an error together with its full source chain.
///
/// `reqwest` keeps the interesting part (DNS, refused, TLS) in nested sources.
pub fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
