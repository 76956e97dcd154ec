//! Streaming HTTP relay gateway library.

pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::schema::GatewayConfig;
pub use credentials::{CredentialPool, CredentialRotator};
pub use error::{GatewayError, GatewayResult};
pub use http::HttpServer;
pub use relay::{RelayEngine, RelayOutcome};
