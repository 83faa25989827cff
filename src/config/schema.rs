//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the prerender gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The client-rendered application that serves non-bot traffic.
    pub origin: OriginConfig,

    /// Protocol adapter settings.
    pub adapter: AdapterConfig,

    /// Bot traffic detection rules.
    pub bots: BotFilterConfig,

    /// Options handed to the rendering client.
    pub prerender: PrerenderOptions,

    /// Fallback fetch used when the rendering client declines.
    pub fallback: FallbackConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Origin application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL of the origin (e.g., "http://127.0.0.1:3000").
    pub url: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// Protocol adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Path the adapter is mounted at. Requests for this path are never prerendered.
    pub mount_path: String,

    /// Shared-cache lifetime emitted in `s-maxage` on prerendered responses.
    pub s_maxage_secs: u64,

    /// Strip the routing query parameter from the url before it is used
    /// as fetch target and cache key.
    pub strip_path_query_param: bool,

    /// Name of the query parameter the routing layer may append.
    pub path_query_param: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            mount_path: "/api/prerender".to_string(),
            s_maxage_secs: 86_400,
            strip_path_query_param: false,
            path_query_param: "path".to_string(),
        }
    }
}

impl AdapterConfig {
    /// The `Cache-Control` value written on every non-redirect completion.
    pub fn cache_control(&self) -> String {
        format!(
            "max-age=0, s-maxage={}, stale-while-revalidate",
            self.s_maxage_secs
        )
    }
}

/// Bot traffic detection rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotFilterConfig {
    /// User-agent signatures (case-insensitive substrings).
    pub user_agents: Vec<String>,

    /// Static asset extensions that are never prerendered.
    pub ignored_extensions: Vec<String>,
}

impl Default for BotFilterConfig {
    fn default() -> Self {
        let user_agents = [
            "googlebot",
            "bingbot",
            "yandex",
            "baiduspider",
            "duckduckbot",
            "applebot",
            "twitterbot",
            "facebookexternalhit",
            "linkedinbot",
            "embedly",
            "pinterest",
            "slackbot",
            "discordbot",
            "telegrambot",
            "whatsapp",
            "redditbot",
            "skypeuripreview",
            "vkshare",
            "quora link preview",
            "w3c_validator",
        ];
        let ignored_extensions = [
            ".js", ".css", ".xml", ".json", ".txt", ".ico", ".png", ".jpg", ".jpeg", ".gif",
            ".svg", ".webp", ".avif", ".woff", ".woff2", ".ttf", ".eot", ".mp4", ".webm",
            ".mp3", ".pdf", ".zip", ".map",
        ];
        Self {
            user_agents: user_agents.iter().map(|s| s.to_string()).collect(),
            ignored_extensions: ignored_extensions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Options for the rendering client, set once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrerenderOptions {
    /// Base URL of the prerender service.
    pub service_url: String,

    /// API token sent as `x-prerender-token`.
    pub token: Option<String>,

    /// Only extract `<title>` and `<meta>` head content.
    pub meta_only: bool,

    /// Query parameters kept in the URL sent to the service. `None` keeps all.
    pub whitelist_query_params: Option<Vec<String>>,

    /// Disable the service's ajax bypass (XHR responses are not inlined).
    pub disable_ajax_bypass: bool,

    /// Disable deduplication of head tags.
    pub disable_head_dedupe: bool,

    /// Write 5xx responses from the service through instead of declining.
    pub bubble_up_5xx_errors: bool,

    /// After a failure, decline the same URL for this many seconds (0 disables).
    pub throttle_on_fail_secs: u64,

    /// Timeout for a single service request in seconds.
    pub timeout_secs: u64,
}

impl Default for PrerenderOptions {
    fn default() -> Self {
        Self {
            service_url: "https://service.prerender.cloud".to_string(),
            token: None,
            meta_only: false,
            whitelist_query_params: None,
            disable_ajax_bypass: false,
            disable_head_dedupe: false,
            bubble_up_5xx_errors: false,
            throttle_on_fail_secs: 300,
            timeout_secs: 20,
        }
    }
}

/// Fallback fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// User agent identifying the gateway on the fallback fetch.
    pub user_agent: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            user_agent: "prerender-gateway-fallback".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.adapter.mount_path, "/api/prerender");
        assert_eq!(config.adapter.s_maxage_secs, 86_400);
        assert_eq!(config.fallback.max_attempts, 3);
        assert!(config.bots.user_agents.iter().any(|ua| ua == "twitterbot"));
    }

    #[test]
    fn test_partial_sections() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [adapter]
            s_maxage_secs = 600

            [prerender]
            meta_only = true
            whitelist_query_params = ["page"]
            "#,
        )
        .unwrap();
        assert_eq!(config.adapter.s_maxage_secs, 600);
        assert_eq!(config.adapter.mount_path, "/api/prerender");
        assert!(config.prerender.meta_only);
        assert_eq!(
            config.prerender.whitelist_query_params,
            Some(vec!["page".to_string()])
        );
    }

    #[test]
    fn test_cache_control_value() {
        let adapter = AdapterConfig::default();
        assert_eq!(
            adapter.cache_control(),
            "max-age=0, s-maxage=86400, stale-while-revalidate"
        );
    }
}
