//! Response rendering.
//!
//! Turns a [`RelayOutcome`] into the client response. Streamed bodies are
//! handed to hyper as-is, so each chunk is written as soon as it arrives and
//! dropping the response drops the upstream connection with it. Gateway
//! failures become JSON errors; origin errors pass through verbatim.

use axum::{
    body::Body,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::relay::outcome::{Exhaustion, RelayBody, RelayOutcome};

impl IntoResponse for RelayOutcome {
    fn into_response(self) -> Response {
        match self {
            RelayOutcome::Success { status, headers, body } => {
                let body = match body {
                    RelayBody::Stream(stream) => Body::from_stream(stream),
                    RelayBody::Full(bytes) => Body::from(bytes),
                };
                (status, headers, body).into_response()
            }
            RelayOutcome::UpstreamError { status, headers, body } => {
                (status, headers, Body::from(body)).into_response()
            }
            RelayOutcome::ConnectError(message) => GatewayError::Connect(message).into_response(),
            RelayOutcome::PoolExhausted(Exhaustion::Unconfigured) => {
                GatewayError::NotConfigured.into_response()
            }
            RelayOutcome::PoolExhausted(Exhaustion::AllRejected { attempts }) => {
                GatewayError::CredentialsExhausted { attempts }.into_response()
            }
        }
    }
}
