//! Routing rule evaluator.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, user-agent)
//!     → router.rs (rewrite rules, applied as middleware)
//!     → matcher.rs (evaluate match conditions)
//!     → matched:   URI rewritten to the adapter mount path
//!     → unmatched: request continues to the origin untouched
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (substring and suffix matching only)
//! - Deterministic: same input always gets the same decision

pub mod matcher;
pub mod router;

pub use router::{bot_rewrite, PrerenderTarget, RewriteRules};
