//! Retry logic.
//!
//! # Responsibilities
//! - Determine if an outbound attempt is retryable
//! - Bound attempts by a fixed budget per call
//!
//! # Design Decisions
//! - Never retry POST/PUT/DELETE/PATCH (non-idempotent)
//! - Connection errors always retryable; only 5xx statuses are
//! - Jittered backoff (see backoff.rs) between attempts

use axum::http::{Method, StatusCode};

/// Returns true if an attempt with this outcome may be repeated.
pub fn is_retryable(method: &Method, status: Option<StatusCode>, network_error: bool) -> bool {
    if !method.is_idempotent() {
        return false;
    }
    if network_error {
        return true;
    }
    status.map(|s| s.is_server_error()).unwrap_or(false)
}

/// Fixed attempt budget for a single outbound call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Returns true if another attempt is allowed after `attempt` attempts.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
