//! Path rewriting filters.

use axum::http::uri::PathAndQuery;

use crate::filter::{Filter, FilterError, FilterOutcome};
use crate::http::GatewayRequest;

/// Prepends a fixed prefix: `/myPrefix` + `/orders` → `/myPrefix/orders`.
#[derive(Debug, Clone)]
pub struct PrefixPath {
    prefix: String,
}

impl PrefixPath {
    pub fn new(prefix: &str) -> Result<Self, FilterError> {
        if !prefix.starts_with('/') {
            return Err(FilterError::InvalidConfig {
                filter: "prefix_path",
                reason: format!("prefix {:?} must start with '/'", prefix),
            });
        }
        if prefix.contains(['?', '#']) {
            return Err(FilterError::InvalidConfig {
                filter: "prefix_path",
                reason: format!("prefix {:?} must not contain a query or fragment", prefix),
            });
        }
        if let Err(e) = prefix.parse::<PathAndQuery>() {
            return Err(FilterError::InvalidConfig {
                filter: "prefix_path",
                reason: format!("prefix {:?} is not a valid URI path: {}", prefix, e),
            });
        }
        Ok(Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        })
    }
}

impl Filter for PrefixPath {
    fn name(&self) -> &'static str {
        "prefix_path"
    }

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
        let path = format!("{}{}", self.prefix, request.path());
        let path = if path.is_empty() { "/".to_string() } else { path };
        Ok(FilterOutcome::Continue(request.clone().with_path(path)))
    }
}

/// Removes the first `parts` path segments: with 2, `/api/v1/users` → `/users`.
#[derive(Debug, Clone, Copy)]
pub struct StripPrefix {
    parts: usize,
}

impl StripPrefix {
    pub fn new(parts: usize) -> Result<Self, FilterError> {
        if parts == 0 {
            return Err(FilterError::InvalidConfig {
                filter: "strip_prefix",
                reason: "parts must be at least 1".into(),
            });
        }
        Ok(Self { parts })
    }
}

impl Filter for StripPrefix {
    fn name(&self) -> &'static str {
        "strip_prefix"
    }

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
        let original = request.path();
        let remaining: Vec<&str> = original
            .split('/')
            .filter(|s| !s.is_empty())
            .skip(self.parts)
            .collect();

        let mut path = format!("/{}", remaining.join("/"));
        if !remaining.is_empty() && original.ends_with('/') {
            path.push('/');
        }
        Ok(FilterOutcome::Continue(request.clone().with_path(path)))
    }
}
