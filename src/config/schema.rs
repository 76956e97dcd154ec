//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Credentialed route and credential source.
    pub credentials: CredentialConfig,

    /// Outbound HTTP client settings.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Credentialed relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Environment variable holding the comma-separated credential list.
    pub env_var: String,

    /// Origin base URL the request path is appended to.
    pub origin_base: String,

    /// Inbound path prefix served by the credentialed route.
    pub route_prefix: String,

    /// Query parameter the credential is injected under.
    pub key_param: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            env_var: "YOUTUBE_API_KEYS".to_string(),
            origin_base: "https://www.googleapis.com/youtube/v3".to_string(),
            route_prefix: "/youtube/v3".to_string(),
            key_param: "key".to_string(),
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Honor `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub system_proxy: bool,

    /// User-Agent sent to origins.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            system_proxy: true,
            user_agent: concat!("relay-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Timeout configuration for upstream calls and handlers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connect timeout for the direct relay, in seconds. Unbounded when unset.
    pub relay_connect_secs: Option<u64>,

    /// Connect and total timeout for each credentialed attempt, in seconds.
    pub credentialed_secs: u64,

    /// Upper bound on the time until a handler produces response headers.
    /// Never applies to body streaming.
    pub handler_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            relay_connect_secs: None,
            credentialed_secs: 10,
            handler_secs: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
