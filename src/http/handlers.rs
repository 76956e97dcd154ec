//! Route handlers.

use std::time::Instant;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, RawQuery, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::request::ForwardRequest;

/// Query accepted by the direct relay.
#[derive(Debug, Deserialize)]
pub struct RelayParams {
    pub url: Option<String>,
}

/// `GET /proxy?url=<absolute-URI>`
pub async fn relay_handler(
    State(state): State<AppState>,
    params: Result<Query<RelayParams>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();

    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            let response = GatewayError::MalformedQuery(rejection.body_text()).into_response();
            metrics::record_request("relay", response.status().as_u16(), start_time);
            return response;
        }
    };

    let response = match params.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        None => GatewayError::MissingTarget.into_response(),
        Some(raw_url) => match ForwardRequest::direct(raw_url, &headers) {
            Ok(request) => {
                tracing::debug!(
                    target_url = %request.target,
                    ranged = !request.headers.is_empty(),
                    "Relaying request"
                );
                let outcome = state.relay.relay(&request).await;
                tracing::debug!(outcome = outcome.kind(), "Relay finished headers");
                outcome.into_response()
            }
            Err(e) => e.into_response(),
        },
    };

    metrics::record_request("relay", response.status().as_u16(), start_time);
    response
}

/// `GET <route_prefix>/{*path}`
pub async fn credentialed_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(raw_query): RawQuery,
) -> Response {
    fetch_credentialed(&state, &path, raw_query.as_deref()).await
}

/// `GET <route_prefix>/`, which targets the origin base itself.
pub async fn credentialed_root_handler(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Response {
    fetch_credentialed(&state, "", raw_query.as_deref()).await
}

async fn fetch_credentialed(state: &AppState, path: &str, raw_query: Option<&str>) -> Response {
    let start_time = Instant::now();

    let key_param: &str = &state.key_param;
    let query: Vec<(String, String)> = raw_query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .filter(|(name, _)| name != key_param)
                .collect()
        })
        .unwrap_or_default();

    tracing::debug!(path = %path, params = query.len(), "Credentialed request");

    let outcome = state
        .rotator
        .fetch_with_rotation(path, &query, &state.pool)
        .await;
    let response = outcome.into_response();

    metrics::record_request("credentialed", response.status().as_u16(), start_time);
    response
}

/// `GET /healthz`
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "credentials": state.pool.len(),
    }))
}
