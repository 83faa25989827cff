//! Adapter error definitions.

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::adapter::fallback::FallbackError;
use crate::render::RenderError;

/// Errors building the adapter from configuration.
#[derive(Debug, Error)]
pub enum AdapterSetupError {
    #[error("cache policy is not a valid header value: {0}")]
    CachePolicy(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Fallback(#[from] FallbackError),
}

/// Errors raised while driving a single request through the adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A 301 was finished without a `location` header. Fatal, never recovered.
    #[error("redirect status 301 without a location header")]
    MissingRedirectLocation,

    /// `begin` was called after the status was already recorded.
    #[error("response head already written")]
    HeadAlreadyWritten,

    /// The completion signal was already resolved.
    #[error("response already finished")]
    AlreadyFinished,

    /// The response view was dropped without ever being finished.
    #[error("rendering client returned without completing the response")]
    Abandoned,

    /// The rendering client failed.
    #[error("rendering client failed: {0}")]
    Render(#[from] RenderError),
}

impl AdapterError {
    /// Status surfaced to the caller when this error ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            AdapterError::Render(RenderError::Adapter(inner)) => inner.status(),
            AdapterError::Render(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        let body = match self.status() {
            StatusCode::BAD_GATEWAY => "prerender failed",
            _ => "internal server error",
        };
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AdapterError::MissingRedirectLocation.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AdapterError::Render(RenderError::Adapter(Box::new(
                AdapterError::MissingRedirectLocation
            )))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AdapterError::Render(RenderError::MissingHost).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
