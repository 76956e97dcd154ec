//! Request spans.
//!
//! One span per inbound request carrying the request id, so every log line
//! emitted while relaying can be correlated. The query string is left out
//! because `/proxy` carries full target URLs in it.

use axum::{body::Body, http::Request};
use tracing::Span;

use crate::http::request::X_REQUEST_ID;

/// Build the span for an inbound request. Used as the `TraceLayer` span maker.
pub fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}
