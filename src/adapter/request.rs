//! Adapter request projection.
//!
//! Reduces an inbound request to the handful of fields the rendering client
//! reads. Missing headers stay `None`; nothing is validated here.

use axum::http::request::Parts;
use axum::http::{header, Method, Uri};
use url::form_urlencoded;

use crate::config::AdapterConfig;
use crate::routing::PrerenderTarget;

/// Read-only view of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterRequest {
    pub method: Method,
    /// Path plus optional query of the pre-rewrite URL.
    pub url: String,
    pub host: Option<String>,
    pub user_agent: Option<String>,
    /// Whether the original request is assumed to have arrived over TLS.
    pub encrypted: bool,
}

impl AdapterRequest {
    /// Project the request parts into an adapter view.
    pub fn project(parts: &Parts, config: &AdapterConfig) -> Self {
        let uri = inbound_uri(parts);
        let raw_url = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = if config.strip_path_query_param {
            strip_query_param(raw_url, &config.path_query_param)
        } else {
            raw_url.to_string()
        };

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.to_string()));

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        let encrypted = host.as_deref().map(is_public_host).unwrap_or(false);

        Self {
            method: parts.method.clone(),
            url,
            host,
            user_agent,
            encrypted,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.encrypted {
            "https"
        } else {
            "http"
        }
    }

    /// Absolute URL of the original request, if the host is known.
    pub fn original_url(&self) -> Option<String> {
        self.host
            .as_ref()
            .map(|host| format!("{}://{}{}", self.scheme(), host, self.url))
    }
}

/// The URI the client originally asked for, before any bot rewrite.
pub fn inbound_uri(parts: &Parts) -> &Uri {
    parts
        .extensions
        .get::<PrerenderTarget>()
        .map(|target| &target.0)
        .unwrap_or(&parts.uri)
}

/// Loopback hosts are served over plain HTTP; everything else over TLS.
fn is_public_host(host: &str) -> bool {
    let name = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.rsplit_once(':').map(|(name, _)| name).unwrap_or(host)
    };
    !matches!(
        name.to_ascii_lowercase().as_str(),
        "localhost" | "127.0.0.1" | "::1"
    )
}

/// Remove every occurrence of `name` from the query of `path_and_query`.
pub fn strip_query_param(path_and_query: &str, name: &str) -> String {
    retain_query_params(path_and_query, |key| key != name)
}

/// Keep only the query parameters whose key satisfies `keep`.
/// A query left empty is dropped together with its `?`.
pub fn retain_query_params<F>(path_and_query: &str, keep: F) -> String
where
    F: Fn(&str) -> bool,
{
    let Some((path, query)) = path_and_query.split_once('?') else {
        return path_and_query.to_string();
    };

    let kept: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| keep(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        return path.to_string();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(kept)
        .finish();
    format!("{}?{}", path, query)
}
