//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! environment ($YOUTUBE_API_KEYS by default)
//!     → credentials::CredentialPool (loaded once at startup)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CredentialConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    TimeoutConfig, UpstreamConfig,
};
