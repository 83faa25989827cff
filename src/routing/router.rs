//! Bot rewrite rules.
//!
//! # Responsibilities
//! - Compile the bot filter configuration into a matcher
//! - Decide whether a request is rewritten to the adapter endpoint
//! - Rewrite the request, keeping the original URI for the adapter
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Only GET/HEAD requests are rewritten
//! - Static assets are never rewritten
//! - The fallback fetch's own user agent is never rewritten

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Uri};
use axum::middleware::Next;
use axum::response::Response;

use crate::config::validation::{validate_mount_path, ValidationError};
use crate::config::{AdapterConfig, BotFilterConfig, FallbackConfig};
use crate::routing::matcher::{
    AndMatcher, ExtensionMatcher, Matcher, MethodMatcher, NotMatcher, UserAgentMatcher,
};

/// The pre-rewrite URI of a request that was routed to the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerenderTarget(pub Uri);

/// Compiled rewrite rules.
#[derive(Debug)]
pub struct RewriteRules {
    mount_uri: Uri,
    matcher: AndMatcher,
}

impl RewriteRules {
    /// Compile rules from configuration. Fails on a mount path that is not
    /// a literal route path.
    pub fn from_config(
        bots: &BotFilterConfig,
        adapter: &AdapterConfig,
        fallback: &FallbackConfig,
    ) -> Result<Self, ValidationError> {
        let mount_uri = validate_mount_path(&adapter.mount_path)?;

        let matcher = AndMatcher::new(vec![
            Box::new(MethodMatcher::safe()),
            Box::new(UserAgentMatcher::new(&bots.user_agents)),
            Box::new(NotMatcher::new(Box::new(UserAgentMatcher::new([
                &fallback.user_agent,
            ])))),
            Box::new(NotMatcher::new(Box::new(ExtensionMatcher::new(
                &bots.ignored_extensions,
            )))),
        ]);

        Ok(Self { mount_uri, matcher })
    }

    /// Returns true if the request should be served by the adapter.
    pub fn should_rewrite(&self, req: &Request<Body>) -> bool {
        self.matcher.matches(req)
    }

    /// Point the request at the adapter, remembering where it was going.
    pub fn rewrite_request(&self, req: &mut Request<Body>) {
        let original = std::mem::replace(req.uri_mut(), self.mount_uri.clone());
        req.extensions_mut().insert(PrerenderTarget(original));
    }
}

/// Middleware applying the rewrite rules ahead of routing.
pub async fn bot_rewrite(
    State(rules): State<Arc<RewriteRules>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if rules.should_rewrite(&req) {
        tracing::debug!(
            path = %req.uri().path(),
            "Bot user agent matched, rewriting to prerender adapter"
        );
        rules.rewrite_request(&mut req);
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RewriteRules {
        RewriteRules::from_config(
            &BotFilterConfig::default(),
            &AdapterConfig::default(),
            &FallbackConfig::default(),
        )
        .unwrap()
    }

    fn request(uri: &str, user_agent: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("user-agent", user_agent)
            .body(Body::default())
            .unwrap()
    }

    #[test]
    fn test_bot_is_rewritten() {
        let rules = rules();
        let mut req = request("/asset/bitcoin?ref=x", "twitterbot");

        assert!(rules.should_rewrite(&req));
        rules.rewrite_request(&mut req);

        assert_eq!(req.uri().path(), "/api/prerender");
        let target = req.extensions().get::<PrerenderTarget>().unwrap();
        assert_eq!(target.0, "/asset/bitcoin?ref=x");
    }

    #[test]
    fn test_browser_and_assets_pass_through() {
        let rules = rules();
        assert!(!rules.should_rewrite(&request("/asset/bitcoin", "Mozilla/5.0 Safari/605.1.15")));
        assert!(!rules.should_rewrite(&request("/static/main.js", "Googlebot/2.1")));
    }

    #[test]
    fn test_fallback_agent_is_never_rewritten() {
        let mut bots = BotFilterConfig::default();
        bots.user_agents.push("gateway".into());
        let rules = RewriteRules::from_config(
            &bots,
            &AdapterConfig::default(),
            &FallbackConfig::default(),
        )
        .unwrap();
        assert!(!rules.should_rewrite(&request("/page", "prerender-gateway-fallback")));
    }

    #[test]
    fn test_custom_mount_path_is_the_rewrite_target() {
        let adapter = AdapterConfig {
            mount_path: "/_prerender".into(),
            ..AdapterConfig::default()
        };
        let rules = RewriteRules::from_config(
            &BotFilterConfig::default(),
            &adapter,
            &FallbackConfig::default(),
        )
        .unwrap();

        let mut req = request("/page", "bingbot");
        rules.rewrite_request(&mut req);
        assert_eq!(req.uri().path(), "/_prerender");
    }

    #[test]
    fn test_unusable_mount_path_is_rejected() {
        let adapter = AdapterConfig {
            mount_path: "/api/:prerender".into(),
            ..AdapterConfig::default()
        };
        let err = RewriteRules::from_config(
            &BotFilterConfig::default(),
            &adapter,
            &FallbackConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MountPath("/api/:prerender".into()));
    }
}
