//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, paths and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::Uri;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("{field} `{value}` is not a supported URL")]
    Url { field: &'static str, value: String },

    #[error("adapter.mount_path `{0}` must be a literal path starting with '/' and not be the root")]
    MountPath(String),

    #[error("adapter.s_maxage_secs must be greater than zero")]
    MaxAge,

    #[error("fallback.max_attempts must be at least 1")]
    MaxAttempts,

    #[error("bots.user_agents must not be empty")]
    NoBots,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    // The origin is reached through a plain HTTP connector.
    check_url("origin.url", &config.origin.url, &["http"], &mut errors);
    check_url(
        "prerender.service_url",
        &config.prerender.service_url,
        &["http", "https"],
        &mut errors,
    );

    if let Err(e) = validate_mount_path(&config.adapter.mount_path) {
        errors.push(e);
    }

    if config.adapter.s_maxage_secs == 0 {
        errors.push(ValidationError::MaxAge);
    }

    if config.fallback.max_attempts == 0 {
        errors.push(ValidationError::MaxAttempts);
    }

    if config.bots.user_agents.iter().all(|ua| ua.trim().is_empty()) {
        errors.push(ValidationError::NoBots);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that `path` is a literal route path and return it as a URI.
///
/// Route captures (`:`, `*`, `{`, `}`), queries and fragments are rejected.
pub fn validate_mount_path(path: &str) -> Result<Uri, ValidationError> {
    let invalid = || ValidationError::MountPath(path.to_string());

    if !path.starts_with('/') || path == "/" {
        return Err(invalid());
    }
    if path
        .chars()
        .any(|c| matches!(c, ':' | '*' | '{' | '}' | '?' | '#') || c.is_whitespace())
    {
        return Err(invalid());
    }

    let uri: Uri = path.parse().map_err(|_| invalid())?;
    if uri.path() != path {
        return Err(invalid());
    }
    Ok(uri)
}

fn check_url(
    field: &'static str,
    value: &str,
    schemes: &[&str],
    errors: &mut Vec<ValidationError>,
) {
    let ok = Url::parse(value)
        .map(|u| schemes.contains(&u.scheme()) && u.host().is_some())
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::Url {
            field,
            value: value.to_string(),
        });
    }
}
