//! HTTP client for a hosted prerender service.
//!
//! # Responsibilities
//! - Build the service URL for the original page URL
//! - Translate `PrerenderOptions` into request headers
//! - Write the service response through the adapter response view
//! - Decline (so the adapter falls back) on failures and throttled URLs
//!
//! # Design Decisions
//! - Redirects are not followed; a 301 from the service is handed to the adapter
//! - 5xx declines unless `bubble_up_5xx_errors` is set
//! - Hop-by-hop headers and `content-length` are not forwarded

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::adapter::request::retain_query_params;
use crate::adapter::{AdapterRequest, AdapterResponse};
use crate::config::PrerenderOptions;
use crate::observability::metrics;
use crate::render::{FailureThrottle, RenderError, RenderOutcome, RenderingClient};

pub const TOKEN_HEADER: HeaderName = HeaderName::from_static("x-prerender-token");
pub const META_ONLY_HEADER: HeaderName = HeaderName::from_static("prerendercloud-meta-only");
pub const DISABLE_AJAX_BYPASS_HEADER: HeaderName =
    HeaderName::from_static("prerendercloud-disable-ajax-bypass");
pub const DISABLE_HEAD_DEDUPE_HEADER: HeaderName =
    HeaderName::from_static("prerendercloud-disable-head-dedupe");

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Rendering client backed by a prerender service reachable over HTTP.
pub struct PrerenderServiceClient {
    http: reqwest::Client,
    service_url: String,
    options: PrerenderOptions,
    throttle: FailureThrottle,
}

impl PrerenderServiceClient {
    pub fn new(options: PrerenderOptions) -> Result<Self, RenderError> {
        let service_url = Url::parse(&options.service_url)?
            .as_str()
            .trim_end_matches('/')
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let throttle = FailureThrottle::new(Duration::from_secs(options.throttle_on_fail_secs));

        Ok(Self {
            http,
            service_url,
            options,
            throttle,
        })
    }

    /// Service URL for a request: `<service>/<scheme>://<host><url>`.
    pub fn service_url(&self, req: &AdapterRequest) -> Result<String, RenderError> {
        let host = req.host.as_deref().ok_or(RenderError::MissingHost)?;
        let url = match &self.options.whitelist_query_params {
            Some(allowed) => {
                retain_query_params(&req.url, |key| allowed.iter().any(|a| a == key))
            }
            None => req.url.clone(),
        };
        Ok(format!(
            "{}/{}://{}{}",
            self.service_url,
            req.scheme(),
            host,
            url
        ))
    }

    /// Headers sent to the service for a request.
    pub fn request_headers(&self, req: &AdapterRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(ua) = req
            .user_agent
            .as_deref()
            .and_then(|ua| HeaderValue::from_str(ua).ok())
        {
            headers.insert(header::USER_AGENT, ua);
        }

        if let Some(token) = &self.options.token {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(TOKEN_HEADER, value);
                }
                Err(_) => tracing::warn!("Prerender token is not a valid header value, not sent"),
            }
        }

        let flags = [
            (META_ONLY_HEADER, self.options.meta_only),
            (DISABLE_AJAX_BYPASS_HEADER, self.options.disable_ajax_bypass),
            (DISABLE_HEAD_DEDUPE_HEADER, self.options.disable_head_dedupe),
        ];
        for (name, enabled) in flags {
            if enabled {
                headers.insert(name, HeaderValue::from_static("true"));
            }
        }

        headers
    }

    pub fn throttle(&self) -> &FailureThrottle {
        &self.throttle
    }

    fn decline(&self, target: &str, reason: &'static str) -> RenderOutcome {
        self.throttle.record_failure(target);
        metrics::record_render_declined(reason);
        RenderOutcome::Declined
    }
}

fn forwardable_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if !HOP_BY_HOP.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

#[async_trait]
impl RenderingClient for PrerenderServiceClient {
    async fn render(
        &self,
        req: &AdapterRequest,
        res: &mut AdapterResponse,
    ) -> Result<RenderOutcome, RenderError> {
        if req.method != Method::GET && req.method != Method::HEAD {
            metrics::record_render_declined("method");
            return Ok(RenderOutcome::Declined);
        }

        let target = match self.service_url(req) {
            Ok(target) => target,
            Err(RenderError::MissingHost) => {
                tracing::warn!(url = %req.url, "No host header, cannot prerender");
                metrics::record_render_declined("no_host");
                return Ok(RenderOutcome::Declined);
            }
            Err(e) => return Err(e),
        };

        if self.throttle.is_throttled(&target) {
            tracing::debug!(target = %target, "Recently failed, skipping prerender");
            metrics::record_render_declined("throttled");
            return Ok(RenderOutcome::Declined);
        }

        let response = match self
            .http
            .get(&target)
            .headers(self.request_headers(req))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "Prerender service request failed");
                return Ok(self.decline(&target, "network"));
            }
        };

        let status = response.status();
        if status.is_server_error() && !self.options.bubble_up_5xx_errors {
            tracing::warn!(target = %target, status = %status, "Prerender service returned an error");
            return Ok(self.decline(&target, "upstream_5xx"));
        }

        let headers = forwardable_headers(response.headers());
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "Failed to read prerender body");
                return Ok(self.decline(&target, "body"));
            }
        };

        tracing::debug!(target = %target, status = %status, bytes = body.len(), "Prerendered");
        res.begin(status, headers)?;
        res.finish(body)?;
        Ok(RenderOutcome::Rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, host: Option<&str>) -> AdapterRequest {
        AdapterRequest {
            method: Method::GET,
            url: url.to_string(),
            host: host.map(str::to_string),
            user_agent: Some("twitterbot".to_string()),
            encrypted: true,
        }
    }

    #[test]
    fn test_service_url() {
        let client = PrerenderServiceClient::new(PrerenderOptions {
            service_url: "https://service.prerender.cloud/".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client
                .service_url(&request("/asset/bitcoin?a=1", Some("example.com")))
                .unwrap(),
            "https://service.prerender.cloud/https://example.com/asset/bitcoin?a=1"
        );
        assert!(matches!(
            client.service_url(&request("/", None)),
            Err(RenderError::MissingHost)
        ));
    }

    #[test]
    fn test_query_whitelist() {
        let client = PrerenderServiceClient::new(PrerenderOptions {
            whitelist_query_params: Some(vec!["page".into()]),
            ..Default::default()
        })
        .unwrap();

        let url = client
            .service_url(&request("/list?page=2&utm_source=x", Some("example.com")))
            .unwrap();
        assert!(url.ends_with("https://example.com/list?page=2"));

        let url = client
            .service_url(&request("/list?utm_source=x", Some("example.com")))
            .unwrap();
        assert!(url.ends_with("https://example.com/list"));
    }

    #[test]
    fn test_option_headers() {
        let client = PrerenderServiceClient::new(PrerenderOptions {
            token: Some("secret".into()),
            meta_only: true,
            disable_head_dedupe: true,
            ..Default::default()
        })
        .unwrap();

        let headers = client.request_headers(&request("/", Some("example.com")));
        assert_eq!(headers[header::USER_AGENT], "twitterbot");
        assert_eq!(headers[TOKEN_HEADER], "secret");
        assert_eq!(headers[META_ONLY_HEADER], "true");
        assert_eq!(headers[DISABLE_HEAD_DEDUPE_HEADER], "true");
        assert!(headers.get(DISABLE_AJAX_BYPASS_HEADER).is_none());
    }

    #[test]
    fn test_forwardable_headers() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        upstream.insert(header::CONNECTION, HeaderValue::from_static("close"));

        let headers = forwardable_headers(&upstream);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }
}
