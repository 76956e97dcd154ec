//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, relay engine and rotator produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (per-request spans with request IDs)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every span
//! - Credentials never appear in logs beyond a masked trailing fragment

pub mod logging;
pub mod metrics;
pub mod tracing;
