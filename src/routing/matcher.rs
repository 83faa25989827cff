//! Request matching logic.
//!
//! # Responsibilities
//! - Match the user-agent header against bot signatures
//! - Match static asset extensions on the request path
//! - Combine conditions with AND / NOT semantics
//!
//! # Design Decisions
//! - User-agent matching is case-insensitive substring matching
//! - Extension matching only looks at the last path segment
//! - Missing header = never matches
//! - No regex to guarantee O(n) matching

use axum::body::Body;
use axum::http::{header, Method, Request};

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches the User-Agent header against a list of signatures.
#[derive(Debug, Clone)]
pub struct UserAgentMatcher {
    signatures: Vec<String>,
}

impl UserAgentMatcher {
    /// Create a new user-agent matcher.
    /// Signatures are normalized to lowercase; blank entries are dropped.
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            signatures: signatures
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Returns true if the raw user-agent string contains any signature.
    pub fn matches_user_agent(&self, user_agent: &str) -> bool {
        let ua = user_agent.to_lowercase();
        self.signatures.iter().any(|sig| ua.contains(sig.as_str()))
    }
}

impl Matcher for UserAgentMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.headers()
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(|ua| self.matches_user_agent(ua))
            .unwrap_or(false)
    }
}

/// Matches request paths that end in one of the given file extensions.
#[derive(Debug, Clone)]
pub struct ExtensionMatcher {
    extensions: Vec<String>,
}

impl ExtensionMatcher {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| {
                    let e = e.as_ref().trim().to_lowercase();
                    if e.starts_with('.') {
                        e
                    } else {
                        format!(".{}", e)
                    }
                })
                .filter(|e| e.len() > 1)
                .collect(),
        }
    }
}

impl Matcher for ExtensionMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        let segment = req
            .uri()
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        self.extensions.iter().any(|ext| segment.ends_with(ext.as_str()))
    }
}

/// Matches a fixed set of methods.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }

    /// GET and HEAD, the only methods a crawler renders.
    pub fn safe() -> Self {
        Self::new(vec![Method::GET, Method::HEAD])
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.methods.contains(req.method())
    }
}

/// Inverts another matcher.
#[derive(Debug)]
pub struct NotMatcher {
    inner: Box<dyn Matcher>,
}

impl NotMatcher {
    pub fn new(inner: Box<dyn Matcher>) -> Self {
        Self { inner }
    }
}

impl Matcher for NotMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        !self.inner.matches(req)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, user_agent: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(ua) = user_agent {
            builder = builder.header("User-Agent", ua);
        }
        builder.body(Body::default()).unwrap()
    }

    #[test]
    fn test_user_agent_matcher() {
        let matcher = UserAgentMatcher::new(["twitterbot", "Googlebot"]);

        assert!(matcher.matches(&request("/", Some("Twitterbot/1.0"))));
        assert!(matcher.matches(&request(
            "/",
            Some("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)")
        )));
        assert!(!matcher.matches(&request("/", Some("Mozilla/5.0 Firefox/120.0"))));
        assert!(!matcher.matches(&request("/", None)));
    }

    #[test]
    fn test_blank_signature_matches_nothing() {
        let matcher = UserAgentMatcher::new(["", "  "]);
        assert!(!matcher.matches(&request("/", Some("anything"))));
    }

    #[test]
    fn test_extension_matcher() {
        let matcher = ExtensionMatcher::new([".js", "PNG"]);

        assert!(matcher.matches(&request("/static/app.js", None)));
        assert!(matcher.matches(&request("/logo.png?v=2", None)));
        assert!(matcher.matches(&request("/LOGO.PNG", None)));
        assert!(!matcher.matches(&request("/asset/bitcoin", None)));
        assert!(!matcher.matches(&request("/js/page", None)));
    }

    #[test]
    fn test_and_not_matchers() {
        let matcher = AndMatcher::new(vec![
            Box::new(MethodMatcher::safe()),
            Box::new(UserAgentMatcher::new(["slackbot"])),
            Box::new(NotMatcher::new(Box::new(ExtensionMatcher::new([".css"])))),
        ]);

        assert!(matcher.matches(&request("/page", Some("Slackbot-LinkExpanding 1.0"))));
        assert!(!matcher.matches(&request("/site.css", Some("Slackbot-LinkExpanding 1.0"))));

        let post = Request::builder()
            .method(Method::POST)
            .uri("/page")
            .header("User-Agent", "Slackbot")
            .body(Body::default())
            .unwrap();
        assert!(!matcher.matches(&post));
    }
}
