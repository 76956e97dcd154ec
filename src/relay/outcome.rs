//! The single result of relaying one request.

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

use crate::relay::body::UpstreamStream;

/// Body of a successful relay.
#[derive(Debug)]
pub enum RelayBody {
    /// Forwarded chunk by chunk as the origin produces it.
    Stream(UpstreamStream),
    /// Already read in full (credentialed relay).
    Full(Bytes),
}

/// Why the credential pool could not serve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// The pool is empty; nothing was attempted.
    Unconfigured,
    /// Every credential was tried and rejected with 403.
    AllRejected { attempts: usize },
}

impl Exhaustion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exhaustion::Unconfigured => "unconfigured",
            Exhaustion::AllRejected { .. } => "all_rejected",
        }
    }
}

/// Exactly one of these is produced per request and fully determines the
/// client-facing response.
#[derive(Debug)]
pub enum RelayOutcome {
    /// Origin answered below 400.
    Success {
        status: StatusCode,
        headers: HeaderMap,
        body: RelayBody,
    },
    /// Origin answered 400 or above; the body was read in full.
    UpstreamError {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// The origin could not be reached, or the exchange broke before headers
    /// (or before an error body) were complete.
    ConnectError(String),
    /// The credential pool could not serve the request.
    PoolExhausted(Exhaustion),
}

impl RelayOutcome {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayOutcome::Success { .. } => "success",
            RelayOutcome::UpstreamError { .. } => "upstream_error",
            RelayOutcome::ConnectError(_) => "connect_error",
            RelayOutcome::PoolExhausted(_) => "pool_exhausted",
        }
    }
}
