//! Adapter response view.
//!
//! The narrow write interface handed to the rendering client. Headers are
//! stored directly in the head of the outgoing response, so anything set
//! here is visible through [`AdapterResponse::headers`] before `finish`.
//!
//! # Finish policy
//! - 301: reissued as a redirect to the stored `location`; a missing
//!   location is fatal.
//! - anything else: `Cache-Control` is overwritten with the configured
//!   shared-cache policy, then the body is written.

use axum::body::Body;
use axum::http::header::{self, AsHeaderName};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapter::completion::{completion, Completion, CompletionHandle};
use crate::adapter::AdapterError;

/// Mutable response accumulator for a single in-flight request.
#[derive(Debug)]
pub struct AdapterResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    cache_control: HeaderValue,
    completion: Completion,
}

impl AdapterResponse {
    /// Create a response view and the handle that observes its completion.
    pub fn channel(cache_control: HeaderValue) -> (Self, CompletionHandle) {
        let (done, handle) = completion();
        let response = Self {
            status: None,
            headers: HeaderMap::new(),
            cache_control,
            completion: done,
        };
        (response, handle)
    }

    pub fn get_header<K: AsHeaderName>(&self, name: K) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Store a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Headers written so far.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.completion.is_resolved()
    }

    /// Record the status and apply each header.
    ///
    /// Repeated names in `headers` are appended rather than replaced, so
    /// multi-valued headers such as `set-cookie` survive.
    pub fn begin(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), AdapterError> {
        if self.status.is_some() {
            return Err(AdapterError::HeadAlreadyWritten);
        }
        self.status = Some(status);

        let mut current: Option<HeaderName> = None;
        for (name, value) in headers {
            match name {
                Some(name) => {
                    self.set_header(name.clone(), value);
                    current = Some(name);
                }
                None => {
                    if let Some(name) = &current {
                        self.headers.append(name.clone(), value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Terminal write. Resolves the completion signal exactly once.
    pub fn finish(&mut self, body: impl Into<Body>) -> Result<(), AdapterError> {
        if self.is_finished() {
            return Err(AdapterError::AlreadyFinished);
        }

        let status = self.status.unwrap_or(StatusCode::OK);
        if status == StatusCode::MOVED_PERMANENTLY {
            let location = self
                .get_header(header::LOCATION)
                .cloned()
                .ok_or(AdapterError::MissingRedirectLocation)?;
            let redirect = (status, [(header::LOCATION, location)]).into_response();
            return self.completion.resolve(redirect);
        }

        self.set_header(header::CACHE_CONTROL, self.cache_control.clone());

        let mut response = Response::new(body.into());
        *response.status_mut() = status;
        *response.headers_mut() = std::mem::take(&mut self.headers);
        self.completion.resolve(response)
    }

    /// Write a complete response as-is, bypassing the finish policy.
    /// Used by the fallback continuation.
    pub fn send(&mut self, response: Response) -> Result<(), AdapterError> {
        self.completion.resolve(response)
    }
}
