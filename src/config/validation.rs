//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks the values make sense
//! together. All problems are collected rather than stopping at the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::http::server::{HEALTH_PATH, RELAY_PATH};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("credentials.origin_base '{0}' must be an absolute http(s) URL")]
    OriginBase(String),

    #[error("credentials.route_prefix '{0}' must start with '/' and name a path")]
    RoutePrefix(String),

    #[error("credentials.route_prefix '{0}' collides with a built-in route")]
    RouteCollision(String),

    #[error("credentials.key_param must not be empty")]
    KeyParam,

    #[error("credentials.env_var must not be empty")]
    EnvVar,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    let credentials = &config.credentials;
    match Url::parse(&credentials.origin_base) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::OriginBase(credentials.origin_base.clone())),
    }

    let prefix = credentials.route_prefix.trim_end_matches('/');
    if !credentials.route_prefix.starts_with('/') || prefix.is_empty() || prefix.contains('{') {
        errors.push(ValidationError::RoutePrefix(credentials.route_prefix.clone()));
    } else if prefix == RELAY_PATH || prefix == HEALTH_PATH {
        errors.push(ValidationError::RouteCollision(credentials.route_prefix.clone()));
    }

    if credentials.key_param.trim().is_empty() {
        errors.push(ValidationError::KeyParam);
    }
    if credentials.env_var.trim().is_empty() {
        errors.push(ValidationError::EnvVar);
    }

    let timeouts = &config.timeouts;
    if timeouts.credentialed_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("credentialed_secs"));
    }
    if timeouts.relay_connect_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("relay_connect_secs"));
    }
    if timeouts.handler_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("handler_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
