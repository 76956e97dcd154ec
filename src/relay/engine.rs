//! Direct relay: fetch a target and hand its body back as a live stream.

use std::time::Duration;

use reqwest::Client;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::{describe, GatewayResult};
use crate::relay::body::UpstreamStream;
use crate::relay::headers::relay_response_headers;
use crate::relay::outcome::{RelayBody, RelayOutcome};
use crate::relay::request::ForwardRequest;

/// Opens upstream GETs and relays their responses.
///
/// No read or total timeout is set: media bodies may stream for as long as the
/// client keeps pulling. Only connection setup can be bounded.
#[derive(Clone)]
pub struct RelayEngine {
    client: Client,
}

impl RelayEngine {
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> GatewayResult<Self> {
        let mut builder = Client::builder().user_agent(&upstream.user_agent);
        if let Some(secs) = timeouts.relay_connect_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if !upstream.system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetch `request.target` and classify the response.
    pub async fn relay(&self, request: &ForwardRequest) -> RelayOutcome {
        let mut builder = self
            .client
            .get(request.target.clone())
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = describe(&e);
                tracing::warn!(target_url = %request.target, error = %message, "Upstream connect failed");
                return RelayOutcome::ConnectError(message);
            }
        };

        let status = response.status();
        let headers = relay_response_headers(response.headers());

        if status.as_u16() >= 400 {
            // Error bodies are small; read them whole and let the connection go.
            return match response.bytes().await {
                Ok(body) => {
                    tracing::info!(
                        target_url = %request.target,
                        status = %status,
                        bytes = body.len(),
                        "Upstream returned error status"
                    );
                    RelayOutcome::UpstreamError { status, headers, body }
                }
                Err(e) => {
                    let message = describe(&e);
                    tracing::warn!(target_url = %request.target, error = %message, "Failed reading upstream error body");
                    RelayOutcome::ConnectError(message)
                }
            };
        }

        tracing::debug!(target_url = %request.target, status = %status, "Streaming upstream body");
        RelayOutcome::Success {
            status,
            headers,
            body: RelayBody::Stream(UpstreamStream::from_response(response)),
        }
    }
}
