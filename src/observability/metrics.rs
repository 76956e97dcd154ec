//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): time to response headers
//! - `gateway_active_streams` (gauge): relayed bodies still holding an upstream connection
//! - `gateway_streams_released_total` (counter): releases by reason
//! - `gateway_stream_bytes_total` (counter): bytes forwarded from streamed bodies
//! - `gateway_credential_rotations_total` (counter): credentials skipped after a 403
//! - `gateway_pool_exhausted_total` (counter): pool failures by kind
//!
//! Without an installed recorder every call is a no-op, which keeps tests quiet.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!("gateway_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn stream_opened() {
    gauge!("gateway_active_streams").increment(1.0);
}

pub fn stream_released(reason: &'static str, bytes: u64) {
    gauge!("gateway_active_streams").decrement(1.0);
    counter!("gateway_streams_released_total", "reason" => reason).increment(1);
    counter!("gateway_stream_bytes_total").increment(bytes);
}

pub fn record_rotation() {
    counter!("gateway_credential_rotations_total").increment(1);
}

pub fn record_pool_exhausted(kind: &'static str) {
    counter!("gateway_pool_exhausted_total", "kind" => kind).increment(1);
}
