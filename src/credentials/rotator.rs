//! Credential rotation against a fixed origin.
//!
//! Each request walks a fresh random permutation of the pool. A 403 from the
//! origin means "this key is spent" and moves on to the next key; any other
//! answer, and any network failure, ends the walk immediately.

use std::time::Duration;

use axum::http::StatusCode;
use reqwest::Client;
use url::Url;

use crate::config::{CredentialConfig, TimeoutConfig, UpstreamConfig};
use crate::credentials::pool::{key_hint, CredentialPool};
use crate::error::{describe, GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::relay::headers::buffered_response_headers;
use crate::relay::outcome::{Exhaustion, RelayBody, RelayOutcome};
use crate::relay::request::ForwardRequest;

/// Status the origin uses to signal an exhausted credential.
pub const QUOTA_EXCEEDED: StatusCode = StatusCode::FORBIDDEN;

/// Issues credentialed requests, rotating through a pool on 403.
///
/// `timeouts.credentialed_secs` bounds connecting and, separately, the whole
/// exchange of each attempt including the buffered body. Redirects are
/// followed (up to ten).
#[derive(Clone)]
pub struct CredentialRotator {
    client: Client,
    origin_base: Url,
    key_param: String,
}

impl CredentialRotator {
    pub fn new(
        credentials: &CredentialConfig,
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> GatewayResult<Self> {
        let origin_base = Url::parse(&credentials.origin_base).map_err(|e| {
            GatewayError::InvalidTarget {
                url: credentials.origin_base.clone(),
                reason: e.to_string(),
            }
        })?;

        let timeout = Duration::from_secs(timeouts.credentialed_secs);
        let mut builder = Client::builder()
            .user_agent(&upstream.user_agent)
            .connect_timeout(timeout)
            .timeout(timeout);
        if !upstream.system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            origin_base,
            key_param: credentials.key_param.clone(),
        })
    }

    pub fn origin_base(&self) -> &Url {
        &self.origin_base
    }

    /// Fetch `path` below the origin base, trying each credential at most once.
    pub async fn fetch_with_rotation(
        &self,
        path: &str,
        query: &[(String, String)],
        pool: &CredentialPool,
    ) -> RelayOutcome {
        if pool.is_empty() {
            tracing::error!("No credentials configured; credentialed route is disabled");
            metrics::record_pool_exhausted(Exhaustion::Unconfigured.as_str());
            return RelayOutcome::PoolExhausted(Exhaustion::Unconfigured);
        }

        let mut request = ForwardRequest::credentialed(&self.origin_base, path, query);
        let order = pool.permutation();

        for (attempt, key) in order.iter().enumerate() {
            request.set_query_param(&self.key_param, key);

            let response = match self
                .client
                .get(request.target.clone())
                .query(&request.query)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    let message = describe(&e);
                    tracing::error!(
                        target_url = %request.target,
                        attempt = attempt + 1,
                        error = %message,
                        "Error contacting origin"
                    );
                    return RelayOutcome::ConnectError(message);
                }
            };

            let status = response.status();
            if status == QUOTA_EXCEEDED {
                tracing::warn!(
                    key = %key_hint(key),
                    attempt = attempt + 1,
                    remaining = order.len() - attempt - 1,
                    "Credential rejected with 403, trying next"
                );
                metrics::record_rotation();
                continue;
            }

            let headers = buffered_response_headers(response.headers());
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    let message = describe(&e);
                    tracing::error!(target_url = %request.target, error = %message, "Failed reading origin body");
                    return RelayOutcome::ConnectError(message);
                }
            };

            tracing::debug!(
                target_url = %request.target,
                status = %status,
                attempt = attempt + 1,
                key = %key_hint(key),
                "Credentialed request answered"
            );

            return if status.as_u16() >= 400 {
                RelayOutcome::UpstreamError { status, headers, body }
            } else {
                RelayOutcome::Success {
                    status,
                    headers,
                    body: RelayBody::Full(body),
                }
            };
        }

        let exhaustion = Exhaustion::AllRejected { attempts: order.len() };
        tracing::error!(attempts = order.len(), "Every credential was rejected with 403");
        metrics::record_pool_exhausted(exhaustion.as_str());
        RelayOutcome::PoolExhausted(exhaustion)
    }
}
