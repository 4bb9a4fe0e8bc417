//! Route registration and lookup.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the first route matching a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks); a reload
//!   builds a whole new `Router` and swaps it in
//! - O(n) scan in registration order, first match wins
//! - Overlapping routes are not detected; earlier registration shadows later
//! - Explicit `None` rather than silent default

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::http::uri::{Authority, Scheme};
use axum::http::{Method, Uri};
use thiserror::Error;

use crate::config::RouteConfig;
use crate::filter::{self, Filter, FilterChain, FilterError};
use crate::http::GatewayRequest;
use crate::routing::matcher::{
    AndMatcher, HostMatcher, Matcher, MethodMatcher, PathMatcher, PathPrefixMatcher,
};
use crate::routing::pattern::{HostPattern, PathPattern, PatternError};

/// Route registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("duplicate route id {0:?}")]
    DuplicateId(String),

    #[error("route {route:?}: invalid host pattern: {source}")]
    Host {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("route {route:?}: invalid path pattern: {source}")]
    Path {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("route {route:?}: path and path_prefix are mutually exclusive")]
    ConflictingPath { route: String },

    #[error("route {route:?}: invalid target uri {uri:?}: {reason}")]
    Target {
        route: String,
        uri: String,
        reason: String,
    },

    #[error("route {route:?}: invalid method {method:?}")]
    Method { route: String, method: String },

    #[error("route {route:?}: {source}")]
    Filter {
        route: String,
        #[source]
        source: FilterError,
    },
}

/// Where a route forwards to: an optional scheme plus an authority.
///
/// Any path on the target URI is ignored; the (filtered) request path is
/// forwarded as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUri {
    raw: String,
    scheme: Option<Scheme>,
    authority: Authority,
}

impl TargetUri {
    /// Scheme to use when the target names none: the request's own.
    pub fn scheme(&self) -> Option<&Scheme> {
        self.scheme.as_ref()
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for TargetUri {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let uri: Uri = raw.trim().parse().map_err(|e: axum::http::uri::InvalidUri| e.to_string())?;
        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| "missing host".to_string())?;
        let scheme = match uri.scheme() {
            None => None,
            Some(s) if *s == Scheme::HTTP || *s == Scheme::HTTPS => Some(s.clone()),
            Some(s) => return Err(format!("unsupported scheme {:?}", s.as_str())),
        };
        Ok(Self {
            raw: raw.trim().to_string(),
            scheme,
            authority,
        })
    }
}

impl fmt::Display for TargetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

pub fn default_route_id(index: usize) -> String {
    format!("route-{}", index)
}

/// A compiled route: predicates, target and filter chain.
#[derive(Debug)]
pub struct Route {
    id: String,
    host: Option<HostPattern>,
    path: Option<String>,
    predicate: AndMatcher,
    target: TargetUri,
    filters: FilterChain,
}

impl Route {
    pub fn builder(id: impl Into<String>, target_uri: impl Into<String>) -> RouteBuilder {
        RouteBuilder {
            id: id.into(),
            target_uri: target_uri.into(),
            host: None,
            path: None,
            path_prefix: None,
            methods: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Compile the route at `index` of the config's route list. Routes
    /// without an id are named `route-<index>`, so recompiling the same file
    /// yields the same ids.
    pub fn from_config(config: &RouteConfig, index: usize) -> Result<Self, RouteError> {
        let id = config
            .id
            .clone()
            .unwrap_or_else(|| default_route_id(index));

        let mut filters = Vec::new();
        for filter_config in &config.filters {
            let built = filter::from_config(filter_config).map_err(|source| RouteError::Filter {
                route: id.clone(),
                source,
            })?;
            filters.extend(built);
        }

        let mut builder = Route::builder(id, config.uri.clone())
            .methods(config.methods.iter().cloned())
            .filters(filters);
        if let Some(host) = &config.host {
            builder = builder.host(host.clone());
        }
        if let Some(path) = &config.path {
            builder = builder.path(path.clone());
        }
        if let Some(prefix) = &config.path_prefix {
            builder = builder.path_prefix(prefix.clone());
        }
        builder.build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host_pattern(&self) -> Option<&HostPattern> {
        self.host.as_ref()
    }

    /// Path pattern or prefix, as configured.
    pub fn path_pattern(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn target(&self) -> &TargetUri {
        &self.target
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn matches(&self, request: &GatewayRequest) -> bool {
        self.predicate.matches(request)
    }
}

/// Builder mirroring the fluent route DSL: `host(..).path(..).filter(..)`.
#[derive(Debug)]
pub struct RouteBuilder {
    id: String,
    target_uri: String,
    host: Option<String>,
    path: Option<String>,
    path_prefix: Option<String>,
    methods: Vec<String>,
    filters: Vec<Arc<dyn Filter>>,
}

impl RouteBuilder {
    pub fn host(mut self, pattern: impl Into<String>) -> Self {
        self.host = Some(pattern.into());
        self
    }

    pub fn path(mut self, pattern: impl Into<String>) -> Self {
        self.path = Some(pattern.into());
        self
    }

    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.extend(methods.into_iter().map(Into::into));
        self
    }

    pub fn filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Arc<dyn Filter>>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn build(self) -> Result<Route, RouteError> {
        let id = self.id;
        let mut predicate = AndMatcher::default();

        let host = match self.host.as_deref() {
            None => None,
            Some(raw) => {
                let pattern = HostPattern::parse(raw).map_err(|source| RouteError::Host {
                    route: id.clone(),
                    source,
                })?;
                predicate.push(HostMatcher::new(pattern.clone()));
                Some(pattern)
            }
        };

        let path = match (self.path, self.path_prefix) {
            (Some(_), Some(_)) => return Err(RouteError::ConflictingPath { route: id }),
            (Some(raw), None) => {
                let pattern = PathPattern::parse(&raw).map_err(|source| RouteError::Path {
                    route: id.clone(),
                    source,
                })?;
                predicate.push(PathMatcher::new(pattern));
                Some(raw)
            }
            (None, Some(prefix)) => {
                if !prefix.starts_with('/') {
                    return Err(RouteError::Path {
                        route: id,
                        source: PatternError::MissingLeadingSlash(prefix),
                    });
                }
                predicate.push(PathPrefixMatcher::new(prefix.clone()));
                Some(prefix)
            }
            (None, None) => None,
        };

        if !self.methods.is_empty() {
            let mut methods = Vec::with_capacity(self.methods.len());
            for raw in &self.methods {
                let method = Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| RouteError::Method {
                        route: id.clone(),
                        method: raw.clone(),
                    })?;
                methods.push(method);
            }
            predicate.push(MethodMatcher::new(methods));
        }

        let target = self
            .target_uri
            .parse::<TargetUri>()
            .map_err(|reason| RouteError::Target {
                route: id.clone(),
                uri: self.target_uri.clone(),
                reason,
            })?;

        Ok(Route {
            id,
            host,
            path,
            predicate,
            target,
            filters: FilterChain::new(self.filters),
        })
    }
}

/// Ordered route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
    ids: HashSet<String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pre-compiled routes, keeping their order.
    pub fn with_routes(routes: impl IntoIterator<Item = Route>) -> Result<Self, RouteError> {
        let mut router = Self::new();
        for route in routes {
            router.push(route)?;
        }
        Ok(router)
    }

    /// Compile every configured route, in file order.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut router = Self::new();
        for (index, config) in configs.iter().enumerate() {
            router.push(Route::from_config(config, index)?)?;
        }
        Ok(router)
    }

    /// Register a route after all existing ones.
    pub fn add_route(
        &mut self,
        id: impl Into<String>,
        host_pattern: &str,
        path_pattern: &str,
        target_uri: &str,
        filters: Vec<Arc<dyn Filter>>,
    ) -> Result<Arc<Route>, RouteError> {
        let route = Route::builder(id, target_uri)
            .host(host_pattern)
            .path(path_pattern)
            .filters(filters)
            .build()?;
        self.push(route)
    }

    pub fn push(&mut self, route: Route) -> Result<Arc<Route>, RouteError> {
        if !self.ids.insert(route.id.clone()) {
            return Err(RouteError::DuplicateId(route.id));
        }
        let route = Arc::new(route);
        self.routes.push(Arc::clone(&route));
        Ok(route)
    }

    /// First route, in registration order, whose predicates all hold.
    pub fn match_request(&self, request: &GatewayRequest) -> Option<&Arc<Route>> {
        self.routes.iter().find(|route| route.matches(request))
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    use crate::config::FilterConfig;

    fn request(host: &str, path: &str) -> GatewayRequest {
        Request::builder()
            .uri(path)
            .header("Host", host)
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    fn baeldung_router() -> Router {
        let mut router = Router::new();
        router
            .add_route("r1", "**.baeldung.com", "/baeldung", "http://baeldung.com", vec![])
            .unwrap();
        router
            .add_route("r2", "**.baeldung.com", "/myOtherRouting", "http://othersite.com", vec![])
            .unwrap();
        router
    }

    #[test]
    fn test_match_by_host_and_path() {
        let router = baeldung_router();

        let r = router.match_request(&request("www.baeldung.com", "/baeldung")).unwrap();
        assert_eq!(r.id(), "r1");
        assert_eq!(r.target().authority().as_str(), "baeldung.com");

        let r = router
            .match_request(&request("api.baeldung.com", "/myOtherRouting"))
            .unwrap();
        assert_eq!(r.id(), "r2");
    }

    #[test]
    fn test_no_match() {
        let router = baeldung_router();
        assert!(router.match_request(&request("www.example.com", "/baeldung")).is_none());
        assert!(router.match_request(&request("www.baeldung.com", "/unknown")).is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let mut router = Router::new();
        router
            .add_route("wide", "**", "/**", "http://first", vec![])
            .unwrap();
        router
            .add_route("narrow", "www.example.com", "/exact", "http://second", vec![])
            .unwrap();

        let r = router.match_request(&request("www.example.com", "/exact")).unwrap();
        assert_eq!(r.id(), "wide");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut router = baeldung_router();
        let err = router
            .add_route("r1", "**", "/**", "http://x", vec![])
            .unwrap_err();
        assert_eq!(err, RouteError::DuplicateId("r1".into()));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_route_without_predicates_matches_everything() {
        let route = Route::builder("catch-all", "http://fallback:8080").build().unwrap();
        assert!(route.matches(&request("anything", "/at/all")));
    }

    #[test]
    fn test_methods_and_prefix() {
        let route = Route::builder("reads", "http://backend")
            .path_prefix("/api")
            .methods(["get", "HEAD"])
            .build()
            .unwrap();

        assert!(route.matches(&request("h", "/api/items")));

        let post: GatewayRequest = Request::builder()
            .method("POST")
            .uri("/api/items")
            .body(Bytes::new())
            .unwrap()
            .into();
        assert!(!route.matches(&post));
    }

    #[test]
    fn test_target_uri_parsing() {
        let target: TargetUri = "http://othersite.com".parse().unwrap();
        assert_eq!(target.scheme(), Some(&Scheme::HTTP));
        assert_eq!(target.authority().as_str(), "othersite.com");

        let bare: TargetUri = "backend:9000".parse().unwrap();
        assert_eq!(bare.scheme(), None);
        assert_eq!(bare.authority().port_u16(), Some(9000));

        assert!("/only/a/path".parse::<TargetUri>().is_err());
        assert!("ftp://files.example.com".parse::<TargetUri>().is_err());
    }

    #[test]
    fn test_builder_errors() {
        assert!(matches!(
            Route::builder("r", "http://x").path("/a").path_prefix("/b").build(),
            Err(RouteError::ConflictingPath { .. })
        ));
        assert!(matches!(
            Route::builder("r", "http://x").host("a..b").build(),
            Err(RouteError::Host { .. })
        ));
        assert!(matches!(
            Route::builder("r", "http://x").methods(["GE T"]).build(),
            Err(RouteError::Method { .. })
        ));
        assert!(matches!(
            Route::builder("r", "not a uri").build(),
            Err(RouteError::Target { .. })
        ));
    }

    #[test]
    fn test_from_config_generates_id_and_filters() {
        let config = RouteConfig {
            id: None,
            host: Some("**.baeldung.com".into()),
            path: Some("/myOtherRouting".into()),
            path_prefix: None,
            methods: vec![],
            uri: "http://othersite.com".into(),
            filters: vec![FilterConfig::PrefixPath {
                prefix: "/myPrefix".into(),
            }],
        };

        let route = Route::from_config(&config, 1).unwrap();
        assert_eq!(route.id(), "route-1");
        assert_eq!(route.filters().names(), vec!["prefix_path"]);
        assert_eq!(route.path_pattern(), Some("/myOtherRouting"));
    }

    #[test]
    fn test_unnamed_route_ids_are_stable_across_compiles() {
        let unnamed = RouteConfig {
            id: None,
            host: None,
            path: Some("/a".into()),
            path_prefix: None,
            methods: vec![],
            uri: "http://backend".into(),
            filters: vec![],
        };
        let named = RouteConfig {
            id: Some("named".into()),
            ..unnamed.clone()
        };
        let configs = vec![named, unnamed.clone(), unnamed];

        let ids = |router: &Router| -> Vec<String> {
            router.routes().iter().map(|r| r.id().to_string()).collect()
        };
        let first = Router::from_config(&configs).unwrap();
        let second = Router::from_config(&configs).unwrap();
        assert_eq!(ids(&first), vec!["named", "route-1", "route-2"]);
        assert_eq!(ids(&first), ids(&second));
    }
}
