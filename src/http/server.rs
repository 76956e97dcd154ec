//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay, credentialed and health routes
//! - Wire up middleware (request ID, tracing, CORS, optional handler timeout)
//! - Bind server to listener
//! - Serve until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Router,
};
use tokio::net::TcpListener;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::credentials::{CredentialPool, CredentialRotator};
use crate::error::{GatewayError, GatewayResult};
use crate::http::handlers::{
    credentialed_handler, credentialed_root_handler, health_handler, relay_handler,
};
use crate::http::request::MakeRequestUuidV4;
use crate::observability::tracing::request_span;
use crate::relay::RelayEngine;

/// Path of the direct relay route.
pub const RELAY_PATH: &str = "/proxy";

/// Path of the liveness probe.
pub const HEALTH_PATH: &str = "/healthz";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayEngine>,
    pub rotator: Arc<CredentialRotator>,
    pub pool: CredentialPool,
    pub key_param: Arc<str>,
}

/// HTTP server for the relay gateway.
pub struct HttpServer {
    router: Router,
    route_prefix: String,
}

impl HttpServer {
    /// Create a new HTTP server. `pool` is the process-wide credential pool.
    pub fn new(config: GatewayConfig, pool: CredentialPool) -> GatewayResult<Self> {
        let relay = RelayEngine::new(&config.upstream, &config.timeouts)?;
        let rotator = CredentialRotator::new(&config.credentials, &config.upstream, &config.timeouts)?;

        if pool.is_empty() {
            tracing::warn!(
                env_var = %config.credentials.env_var,
                "No credentials loaded; credentialed route will answer 500"
            );
        } else {
            tracing::info!(
                credentials = pool.len(),
                origin = %rotator.origin_base(),
                "Credential pool loaded"
            );
        }

        let state = AppState {
            relay: Arc::new(relay),
            rotator: Arc::new(rotator),
            pool,
            key_param: config.credentials.key_param.as_str().into(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            route_prefix: config.credentials.route_prefix,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let prefix = config.credentials.route_prefix.trim_end_matches('/');
        let credentialed_root = format!("{prefix}/");
        let credentialed_route = format!("{prefix}/{{*path}}");

        let mut router = Router::new()
            .route(RELAY_PATH, get(relay_handler))
            .route(&credentialed_root, get(credentialed_root_handler))
            .route(&credentialed_route, get(credentialed_handler))
            .route(HEALTH_PATH, get(health_handler))
            .with_state(state);

        // Bounds the time to response headers only; bodies stream unbounded.
        if let Some(secs) = config.timeouts.handler_secs {
            router = router.layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                        handle_middleware_error(err, secs)
                    }))
                    .layer(TimeoutLayer::new(Duration::from_secs(secs))),
            );
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);

        router.layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                ))
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves, then drain in-flight responses.
    ///
    /// Production passes [`wait_for_termination`](crate::lifecycle::signals::wait_for_termination);
    /// tests pass any future they control.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route_prefix = %self.route_prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Render a failure from the handler timeout stack as a JSON error.
fn handle_middleware_error(err: BoxError, secs: u64) -> Response {
    if err.is::<Elapsed>() {
        GatewayError::HandlerTimeout { secs }.into_response()
    } else {
        GatewayError::Middleware(err.to_string()).into_response()
    }
}
