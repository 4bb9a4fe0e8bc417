//! Route matching logic.
//!
//! # Responsibilities
//! - Match host header against a host glob (case-insensitive)
//! - Match path against an ant-style pattern or a raw prefix (case-sensitive)
//! - Restrict by HTTP method
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive (per HTTP spec)
//! - Path matching is case-sensitive
//! - Empty condition = always matches (wildcard)
//! - No regex, patterns are pre-split into segments at registration

use axum::http::Method;

use crate::http::GatewayRequest;
use crate::routing::pattern::{HostPattern, PathPattern};

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &GatewayRequest) -> bool;
}

/// Matches the Host header against a glob.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    pattern: HostPattern,
}

impl HostMatcher {
    pub fn new(pattern: HostPattern) -> Self {
        Self { pattern }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &GatewayRequest) -> bool {
        self.pattern.matches(req.host())
    }
}

/// Matches the request path against an ant-style pattern.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: PathPattern,
}

impl PathMatcher {
    pub fn new(pattern: PathPattern) -> Self {
        Self { pattern }
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, req: &GatewayRequest) -> bool {
        self.pattern.matches(req.path())
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &GatewayRequest) -> bool {
        req.path().starts_with(&self.prefix)
    }
}

/// Matches any of a set of methods.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &GatewayRequest) -> bool {
        self.methods.iter().any(|m| m == req.method())
    }
}

/// Combines multiple matchers with AND semantics. Empty = match all.
#[derive(Debug, Default)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    pub fn push(&mut self, matcher: impl Matcher + 'static) {
        self.matchers.push(Box::new(matcher));
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &GatewayRequest) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    fn request(method: Method, uri: &str, host: &str) -> GatewayRequest {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Host", host)
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new(HostPattern::parse("example.com").unwrap());

        assert!(matcher.matches(&request(Method::GET, "/", "example.com")));
        assert!(matcher.matches(&request(Method::GET, "/", "EXAMPLE.COM"))); // Case insensitive
        assert!(!matcher.matches(&request(Method::GET, "/", "other.com")));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathMatcher::new(PathPattern::parse("/api/**").unwrap());

        assert!(matcher.matches(&request(Method::GET, "/api/v1", "h")));
        assert!(!matcher.matches(&request(Method::GET, "/images", "h")));
    }

    #[test]
    fn test_path_prefix_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        assert!(matcher.matches(&request(Method::GET, "/api/v1", "h")));
        assert!(matcher.matches(&request(Method::GET, "/apiary", "h")));
        assert!(!matcher.matches(&request(Method::GET, "/images", "h")));
    }

    #[test]
    fn test_method_matcher() {
        let matcher = MethodMatcher::new(vec![Method::GET, Method::HEAD]);

        assert!(matcher.matches(&request(Method::HEAD, "/", "h")));
        assert!(!matcher.matches(&request(Method::POST, "/", "h")));
    }

    #[test]
    fn test_and_matcher() {
        let mut matcher = AndMatcher::default();
        assert!(matcher.matches(&request(Method::GET, "/anything", "any.host")));

        matcher.push(HostMatcher::new(HostPattern::parse("**.baeldung.com").unwrap()));
        matcher.push(PathMatcher::new(PathPattern::parse("/baeldung").unwrap()));

        assert!(matcher.matches(&request(Method::GET, "/baeldung", "www.baeldung.com")));
        assert!(!matcher.matches(&request(Method::GET, "/other", "www.baeldung.com")));
        assert!(!matcher.matches(&request(Method::GET, "/baeldung", "www.example.com")));
    }
}
