//! Fallback continuation.
//!
//! Runs when the rendering client declines. The original URL is fetched
//! again with the gateway's own user agent, which the bot rules never
//! rewrite, so the origin answers with its client-rendered page.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::adapter::{AdapterError, AdapterRequest, AdapterResponse};
use crate::config::FallbackConfig;
use crate::observability::metrics;
use crate::resilience::{calculate_backoff, is_retryable, RetryPolicy};

/// Errors from the fallback fetch. The display text becomes the 500 body.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("cannot reconstruct original url: request has no host")]
    MissingHost,

    #[error("fallback fetch failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("fallback fetch returned {0}")]
    Status(StatusCode),
}

/// A page fetched by the fallback path.
#[derive(Debug)]
pub struct FetchedPage {
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Which write the fallback performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackOutcome {
    Served,
    Failed,
}

/// Fetches the original URL when prerendering is skipped.
pub struct FallbackFetcher {
    http: reqwest::Client,
    policy: RetryPolicy,
    user_agent: String,
}

impl FallbackFetcher {
    pub fn new(config: &FallbackConfig) -> Result<Self, FallbackError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            policy: RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                base_delay_ms: config.base_delay_ms,
                max_delay_ms: config.max_delay_ms,
            },
            user_agent: config.user_agent.clone(),
        })
    }

    /// GET the original URL, retrying network errors and 5xx within the budget.
    pub async fn fetch(&self, req: &AdapterRequest) -> Result<FetchedPage, FallbackError> {
        let url = req.original_url().ok_or(FallbackError::MissingHost)?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            metrics::record_fallback_attempt();

            let result = self
                .http
                .get(&url)
                .header(header::USER_AGENT, &self.user_agent)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
                    let body = response.bytes().await?;
                    return Ok(FetchedPage { content_type, body });
                }
                Ok(response) => {
                    let status = response.status();
                    if !self.policy.allows(attempt)
                        || !is_retryable(&Method::GET, Some(status), false)
                    {
                        return Err(FallbackError::Status(status));
                    }
                    tracing::info!(url = %url, attempt, status = %status, "Retrying fallback fetch");
                }
                Err(e) => {
                    if !self.policy.allows(attempt) || !is_retryable(&Method::GET, None, true) {
                        return Err(e.into());
                    }
                    tracing::info!(url = %url, attempt, error = %e, "Retrying fallback fetch after network error");
                }
            }

            tokio::time::sleep(calculate_backoff(attempt, &self.policy)).await;
        }
    }

    /// Produce the response for a declined request. Exactly one of the
    /// success body or the 500 error is written.
    pub async fn next(
        &self,
        req: &AdapterRequest,
        res: &mut AdapterResponse,
    ) -> Result<FallbackOutcome, AdapterError> {
        let (response, outcome) = match self.fetch(req).await {
            Ok(page) => {
                let mut response = Response::new(Body::from(page.body));
                if let Some(content_type) = page.content_type {
                    response
                        .headers_mut()
                        .insert(header::CONTENT_TYPE, content_type);
                }
                (response, FallbackOutcome::Served)
            }
            Err(e) => {
                tracing::warn!(url = %req.url, error = %e, "Fallback fetch failed");
                (
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
                    FallbackOutcome::Failed,
                )
            }
        };

        res.send(response)?;
        Ok(outcome)
    }
}
