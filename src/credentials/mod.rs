//! Credential subsystem.
//!
//! # Data Flow
//! ```text
//! $YOUTUBE_API_KEYS (comma-separated, read once in main)
//!     → pool.rs (CredentialPool, immutable, shared)
//!     → rotator.rs (random permutation per request, 403 → next key)
//!     → RelayOutcome (buffered success/error, connect error, or exhaustion)
//! ```
//!
//! # Design Decisions
//! - The pool is passed in explicitly, never read from globals
//! - Only 403 rotates; network failures are terminal
//! - Keys are logged as a masked tail only

pub mod pool;
pub mod rotator;

pub use pool::{key_hint, CredentialPool};
pub use rotator::CredentialRotator;
