//! Structured logging.
//!
//! `RUST_LOG` takes precedence; otherwise the configured level applies to this
//! crate and to tower-http. JSON output is meant for production log shipping.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Default filter directive for a given level.
pub fn default_directive(level: &str) -> String {
    format!("relay_gateway={level},tower_http={level}")
}

/// Initialize the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}
