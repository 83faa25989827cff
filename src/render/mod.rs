//! Rendering client subsystem.
//!
//! # Data Flow
//! ```text
//! AdapterRequest (method, url, host, user-agent)
//!     → RenderingClient::render
//!     → service.rs (prerender service HTTP call)
//!     → Rendered: status, headers and body written to the AdapterResponse
//!     → Declined: the adapter runs its fallback continuation
//! ```
//!
//! # Design Decisions
//! - The client only sees the narrow request/response views
//! - Declining is a value, not an error; errors are reserved for failures
//!   the caller cannot route around
//! - Failed URLs are throttled so a struggling service is not hammered

pub mod service;
pub mod throttle;

use async_trait::async_trait;
use thiserror::Error;

use crate::adapter::{AdapterError, AdapterRequest, AdapterResponse};

pub use service::PrerenderServiceClient;
pub use throttle::FailureThrottle;

/// What the rendering client did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The response view was finished.
    Rendered,
    /// The client declined; the caller must produce a response.
    Declined,
}

/// Errors raised by a rendering client.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("request has no host header")]
    MissingHost,

    #[error("invalid prerender service url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Adapter(Box<AdapterError>),
}

impl From<AdapterError> for RenderError {
    fn from(err: AdapterError) -> Self {
        RenderError::Adapter(Box::new(err))
    }
}

/// A component that writes prerendered output for a request.
#[async_trait]
pub trait RenderingClient: Send + Sync {
    async fn render(
        &self,
        req: &AdapterRequest,
        res: &mut AdapterResponse,
    ) -> Result<RenderOutcome, RenderError>;
}
