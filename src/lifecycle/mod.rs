//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Logging/metrics → Credential pool → Bind → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain in-flight responses → Exit
//! ```

pub mod signals;
pub mod startup;
