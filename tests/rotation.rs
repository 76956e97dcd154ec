//! Credential rotation tests against a mock quota-enforcing API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};

use relay_gateway::config::CredentialConfig;
use relay_gateway::relay::{Exhaustion, RelayBody, RelayOutcome};
use relay_gateway::{CredentialPool, CredentialRotator};

mod common;

/// Keys the origin received, in arrival order.
#[derive(Clone, Default)]
struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    fn keys(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Keys starting with `spent` are over quota, `broken` hit a server fault,
/// `good` succeed and echo the request back.
async fn api(
    State(calls): State<Calls>,
    Path(endpoint): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    answer(&calls, endpoint, params)
}

async fn api_root(
    State(calls): State<Calls>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    answer(&calls, String::new(), params)
}

fn answer(calls: &Calls, endpoint: String, params: HashMap<String, String>) -> Response {
    let key = params.get("key").cloned().unwrap_or_default();
    calls.0.lock().unwrap().push(key.clone());

    if key.starts_with("spent") {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "reason": "quotaExceeded" } })),
        )
            .into_response()
    } else if key.starts_with("broken") {
        (StatusCode::INTERNAL_SERVER_ERROR, "backend error").into_response()
    } else if key.starts_with("good") {
        Json(json!({ "endpoint": endpoint, "params": params })).into_response()
    } else {
        (StatusCode::BAD_REQUEST, "unknown key").into_response()
    }
}

async fn start_api_origin() -> (SocketAddr, Calls) {
    let calls = Calls::default();
    let app = Router::new()
        .route("/youtube/v3", get(api_root))
        .route("/youtube/v3/{*endpoint}", get(api))
        .with_state(calls.clone());
    (common::start_origin(app).await, calls)
}

fn rotator_for(origin: SocketAddr) -> CredentialRotator {
    let config = common::test_config();
    let credentials = CredentialConfig {
        origin_base: format!("http://{origin}/youtube/v3"),
        ..config.credentials.clone()
    };
    CredentialRotator::new(&credentials, &config.upstream, &config.timeouts).unwrap()
}

fn full_body(outcome: &RelayOutcome) -> Value {
    match outcome {
        RelayOutcome::Success {
            body: RelayBody::Full(bytes),
            ..
        } => serde_json::from_slice(bytes).unwrap(),
        other => panic!("Expected buffered success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rotates_past_spent_keys() {
    let (origin, calls) = start_api_origin().await;
    let rotator = rotator_for(origin);
    let pool = CredentialPool::new(["spent-1", "spent-2", "good-3"]);
    let query = vec![("part".to_string(), "snippet".to_string())];

    // Order is random; repeat to cover several permutations.
    for _ in 0..20 {
        calls.0.lock().unwrap().clear();

        let outcome = rotator.fetch_with_rotation("videos", &query, &pool).await;
        let body = full_body(&outcome);
        assert_eq!(body["endpoint"], "videos");
        assert_eq!(body["params"]["part"], "snippet");

        let keys = calls.keys();
        assert!(keys.len() <= 3, "Tried {} times", keys.len());
        assert_eq!(keys.last().map(String::as_str), Some("good-3"));
        assert_eq!(keys.iter().filter(|k| *k == "good-3").count(), 1);
        assert!(keys[..keys.len() - 1].iter().all(|k| k.starts_with("spent")));
    }
}

#[tokio::test]
async fn test_all_spent_exhausts_pool() {
    let (origin, calls) = start_api_origin().await;
    let rotator = rotator_for(origin);
    let pool = CredentialPool::new(["spent-a", "spent-b"]);

    let outcome = rotator.fetch_with_rotation("search", &[], &pool).await;
    assert!(matches!(
        outcome,
        RelayOutcome::PoolExhausted(Exhaustion::AllRejected { attempts: 2 })
    ));

    let mut keys = calls.keys();
    keys.sort();
    assert_eq!(keys, vec!["spent-a", "spent-b"]);
}

#[tokio::test]
async fn test_empty_pool_makes_no_calls() {
    let (origin, calls) = start_api_origin().await;
    let rotator = rotator_for(origin);

    let outcome = rotator
        .fetch_with_rotation("videos", &[], &CredentialPool::default())
        .await;
    assert!(matches!(outcome, RelayOutcome::PoolExhausted(Exhaustion::Unconfigured)));
    assert_eq!(calls.keys().len(), 0);
}

#[tokio::test]
async fn test_other_errors_stop_rotation() {
    let (origin, calls) = start_api_origin().await;
    let rotator = rotator_for(origin);
    let pool = CredentialPool::new(["broken-1", "broken-2", "broken-3"]);

    let outcome = rotator.fetch_with_rotation("videos", &[], &pool).await;
    match outcome {
        RelayOutcome::UpstreamError { status, body, .. } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(&body[..], b"backend error");
        }
        other => panic!("Expected upstream error, got {other:?}"),
    }
    assert_eq!(calls.keys().len(), 1);
}

#[tokio::test]
async fn test_unreachable_origin_is_not_rotated() {
    let dead = common::unused_addr().await;
    let rotator = rotator_for(dead);
    let pool = CredentialPool::new(["good-1", "good-2", "good-3"]);

    let outcome = rotator.fetch_with_rotation("videos", &[], &pool).await;
    assert!(matches!(outcome, RelayOutcome::ConnectError(_)));
}

#[tokio::test]
async fn test_gateway_injects_key_over_client_value() {
    let (origin, calls) = start_api_origin().await;
    let mut config = common::test_config();
    config.credentials.origin_base = format!("http://{origin}/youtube/v3");
    let (gateway, shutdown) = common::start_gateway(config, CredentialPool::new(["good-only"])).await;

    let res = common::client()
        .get(format!("http://{gateway}/youtube/v3/search"))
        .query(&[("part", "snippet"), ("q", "rust lang"), ("key", "client-key")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["endpoint"], "search");
    assert_eq!(body["params"]["q"], "rust lang");
    assert_eq!(body["params"]["key"], "good-only");
    assert_eq!(calls.keys(), vec!["good-only"]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_gateway_reports_exhaustion_as_forbidden() {
    let (origin, calls) = start_api_origin().await;
    let mut config = common::test_config();
    config.credentials.origin_base = format!("http://{origin}/youtube/v3");
    let (gateway, shutdown) =
        common::start_gateway(config, CredentialPool::new(["spent-1", "spent-2"])).await;

    let res = common::client()
        .get(format!("http://{gateway}/youtube/v3/videos?part=id"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("exceeded their quota"));
    assert_eq!(calls.keys().len(), 2);

    shutdown.trigger();
}

#[tokio::test]
async fn test_gateway_unconfigured_makes_no_calls() {
    let (origin, calls) = start_api_origin().await;
    let mut config = common::test_config();
    config.credentials.origin_base = format!("http://{origin}/youtube/v3");
    let (gateway, shutdown) = common::start_gateway(config, CredentialPool::default()).await;

    let res = common::client()
        .get(format!("http://{gateway}/youtube/v3/videos"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not configured"));
    assert!(calls.keys().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_gateway_bare_prefix_targets_origin_base() {
    let (origin, calls) = start_api_origin().await;
    let mut config = common::test_config();
    config.credentials.origin_base = format!("http://{origin}/youtube/v3");
    let (gateway, shutdown) = common::start_gateway(config, CredentialPool::new(["good-root"])).await;

    let res = common::client()
        .get(format!("http://{gateway}/youtube/v3/?part=id"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["endpoint"], "");
    assert_eq!(body["params"]["part"], "id");
    assert_eq!(body["params"]["key"], "good-root");
    assert_eq!(calls.keys(), vec!["good-root"]);

    shutdown.trigger();
}
