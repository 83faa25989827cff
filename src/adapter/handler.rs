//! The prerender adapter endpoint.
//!
//! # Flow
//! ```text
//! request
//!     → self-endpoint guard (own mount path → 404 "not found")
//!     → AdapterRequest::project
//!     → RenderingClient::render(req, &mut AdapterResponse)
//!         → Rendered: response view finished by the client
//!         → Declined: FallbackFetcher::next
//!     → CompletionHandle::wait → HTTP response
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapter::fallback::{FallbackFetcher, FallbackOutcome};
use crate::adapter::request::inbound_uri;
use crate::adapter::{AdapterError, AdapterRequest, AdapterResponse, AdapterSetupError};
use crate::config::{AdapterConfig, FallbackConfig};
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::render::{RenderOutcome, RenderingClient};

/// How a request left the adapter, used as log field and metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    SelfEndpoint,
    Rendered,
    Redirect,
    Fallback,
    FallbackError,
}

impl Exit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exit::SelfEndpoint => "self_endpoint",
            Exit::Rendered => "rendered",
            Exit::Redirect => "redirect",
            Exit::Fallback => "fallback",
            Exit::FallbackError => "fallback_error",
        }
    }
}

/// Translates inbound requests into rendering client calls.
pub struct PrerenderAdapter {
    config: AdapterConfig,
    cache_control: HeaderValue,
    client: Arc<dyn RenderingClient>,
    fallback: FallbackFetcher,
}

impl PrerenderAdapter {
    pub fn new(
        config: AdapterConfig,
        fallback: &FallbackConfig,
        client: Arc<dyn RenderingClient>,
    ) -> Result<Self, AdapterSetupError> {
        let cache_control = HeaderValue::try_from(config.cache_control())?;

        Ok(Self {
            config,
            cache_control,
            client,
            fallback: FallbackFetcher::new(fallback)?,
        })
    }

    pub fn mount_path(&self) -> &str {
        &self.config.mount_path
    }

    /// The `Cache-Control` value written on finished responses.
    pub fn cache_control(&self) -> &HeaderValue {
        &self.cache_control
    }

    /// Handle one request. Every path resolves the completion signal once.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let (parts, _body) = request.into_parts();
        let request_id = request_id(&parts.headers).unwrap_or("unknown").to_string();
        let path = inbound_uri(&parts).path().to_string();

        let (mut res, handle) = AdapterResponse::channel(self.cache_control.clone());
        let result = self.dispatch(&parts, &mut res).await;
        drop(res);

        let response = match (result, handle.wait().await) {
            (Ok(exit), Ok(response)) => {
                tracing::info!(
                    request_id = %request_id,
                    path = %path,
                    status = %response.status(),
                    outcome = exit.as_str(),
                    "Prerender request complete"
                );
                metrics::record_request(exit.as_str(), response.status().as_u16(), start);
                return response;
            }
            (Err(e), Ok(response)) => {
                tracing::warn!(
                    request_id = %request_id,
                    path = %path,
                    error = %e,
                    "Rendering client failed after completing the response"
                );
                response
            }
            (Ok(exit), Err(e)) => {
                tracing::error!(
                    request_id = %request_id,
                    path = %path,
                    outcome = exit.as_str(),
                    error = %e,
                    "Request finished without a response"
                );
                e.into_response()
            }
            (Err(e), Err(_)) => {
                tracing::error!(
                    request_id = %request_id,
                    path = %path,
                    error = %e,
                    "Prerender request failed"
                );
                e.into_response()
            }
        };

        metrics::record_request("error", response.status().as_u16(), start);
        response
    }

    async fn dispatch(&self, parts: &Parts, res: &mut AdapterResponse) -> Result<Exit, AdapterError> {
        if inbound_uri(parts).path() == self.config.mount_path {
            res.send((StatusCode::NOT_FOUND, "not found").into_response())?;
            return Ok(Exit::SelfEndpoint);
        }

        let req = AdapterRequest::project(parts, &self.config);

        match self.client.render(&req, res).await? {
            RenderOutcome::Rendered if res.status() == Some(StatusCode::MOVED_PERMANENTLY) => {
                Ok(Exit::Redirect)
            }
            RenderOutcome::Rendered => Ok(Exit::Rendered),
            RenderOutcome::Declined => {
                if res.is_finished() {
                    tracing::warn!(url = %req.url, "Rendering client declined after finishing, keeping its response");
                    return Ok(Exit::Rendered);
                }
                match self.fallback.next(&req, res).await? {
                    FallbackOutcome::Served => Ok(Exit::Fallback),
                    FallbackOutcome::Failed => Ok(Exit::FallbackError),
                }
            }
        }
    }
}
