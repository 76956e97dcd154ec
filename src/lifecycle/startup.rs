//! Startup orchestration.
//!
//! Order: resolve config → logging → metrics → credentials → listener → serve.
//! Any error before the listener is bound is fatal.

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;

use crate::config::{load_config, validation::validate_config, ConfigError, GatewayConfig};
use crate::credentials::CredentialPool;
use crate::http::HttpServer;
use crate::lifecycle::signals;
use crate::observability::{logging, metrics};

/// Resolve the effective configuration: file (or defaults), then CLI overrides.
pub fn resolve_config(path: Option<&Path>, bind: Option<&str>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    if let Some(bind) = bind {
        config.listener.bind_address = bind.to_string();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Bring the gateway up and serve until a termination signal.
pub async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "relay-gateway starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let pool = CredentialPool::from_env(&config.credentials.env_var);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, pool)?;
    server.run(listener, signals::wait_for_termination()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
