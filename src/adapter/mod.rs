//! Request/response protocol adapter.
//!
//! Bridges the gateway's axum handlers and a [`RenderingClient`]: the inbound
//! request is projected to an [`AdapterRequest`], the client writes into an
//! [`AdapterResponse`], and the outer handler waits on a one-shot
//! [`CompletionHandle`] for the final response.
//!
//! # Invariants
//! - Exactly one completion per request on every exit path
//! - The adapter's own mount path is never prerendered
//! - Successful non-redirect responses always carry the configured
//!   `Cache-Control`, replacing anything set upstream
//!
//! [`RenderingClient`]: crate::render::RenderingClient

pub mod completion;
pub mod error;
pub mod fallback;
pub mod handler;
pub mod request;
pub mod response;

pub use completion::{completion, Completion, CompletionHandle};
pub use error::{AdapterError, AdapterSetupError};
pub use fallback::{FallbackError, FallbackFetcher, FallbackOutcome};
pub use handler::PrerenderAdapter;
pub use request::AdapterRequest;
pub use response::AdapterResponse;
