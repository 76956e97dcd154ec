//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → request.rs (ForwardRequest: target + range header)
//!     → engine.rs (upstream GET, status classification)
//!     → headers.rs (origin → client header selection)
//!     → body.rs (UpstreamStream, released exactly once)
//!     → outcome.rs (RelayOutcome handed to the HTTP layer)
//! ```
//!
//! # Design Decisions
//! - Success bodies are never buffered; errors (>= 400) always are
//! - Only `range` travels upstream
//! - The engine never retries; rotation lives in `credentials`

pub mod body;
pub mod engine;
pub mod headers;
pub mod outcome;
pub mod request;

pub use body::{Release, UpstreamStream};
pub use engine::RelayEngine;
pub use outcome::{Exhaustion, RelayBody, RelayOutcome};
pub use request::ForwardRequest;
