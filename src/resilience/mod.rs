//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fallback fetch:
//!     → retries.rs (check if retryable, bounded attempt budget)
//!     → backoff.rs (exponential delay with jitter between attempts)
//! ```
//!
//! # Design Decisions
//! - Retries only for idempotent requests (GET, HEAD, etc.)
//! - The fallback fetch is the only retried call; prerender requests are
//!   declined and throttled instead

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{is_retryable, RetryPolicy};
