//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → handlers.rs (/proxy, credentialed prefix, /healthz)
//!     → relay / credentials (RelayOutcome)
//!     → response.rs (outcome → streamed or JSON response)
//!     → CORS header added → client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
