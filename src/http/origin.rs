//! Origin forwarding for non-bot traffic.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the origin's scheme and authority
//! - Forward method, headers and body unchanged
//! - Map connection failures to 502 Bad Gateway

use axum::body::Body;
use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::{Request, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::OriginConfig;

#[derive(Debug, Error)]
pub enum OriginError {
    #[error("invalid origin url: {0}")]
    InvalidUri(#[from] InvalidUri),

    #[error("origin url `{0}` needs a scheme and a host")]
    Incomplete(String),
}

/// Forwards requests to the client-rendered application.
pub struct OriginForwarder {
    client: Client<HttpConnector, Body>,
    scheme: Scheme,
    authority: Authority,
}

impl OriginForwarder {
    pub fn new(config: &OriginConfig) -> Result<Self, OriginError> {
        let uri: Uri = config.url.parse()?;
        let (scheme, authority) = match (uri.scheme(), uri.authority()) {
            (Some(scheme), Some(authority)) => (scheme.clone(), authority.clone()),
            _ => return Err(OriginError::Incomplete(config.url.clone())),
        };

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            scheme,
            authority,
        })
    }

    /// Point a request URI at the origin, keeping path and query.
    pub fn origin_uri(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Ok(Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?)
    }

    pub async fn forward(&self, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();

        parts.uri = match self.origin_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build origin uri");
                return (StatusCode::BAD_REQUEST, "Bad request").into_response();
            }
        };
        parts.version = Version::HTTP_11;

        tracing::debug!(uri = %parts.uri, method = %parts.method, "Forwarding to origin");

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (parts, body): (_, hyper::body::Incoming) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(error = %e, "Origin request failed");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_uri() {
        let origin = OriginForwarder::new(&OriginConfig {
            url: "http://127.0.0.1:3000".into(),
        })
        .unwrap();

        let uri = origin
            .origin_uri(&Uri::from_static("/asset/bitcoin?x=1"))
            .unwrap();
        assert_eq!(uri, "http://127.0.0.1:3000/asset/bitcoin?x=1");
    }

    #[test]
    fn test_incomplete_origin() {
        assert!(matches!(
            OriginForwarder::new(&OriginConfig { url: "/relative".into() }),
            Err(OriginError::Incomplete(_))
        ));
    }
}
