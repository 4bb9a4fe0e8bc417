//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every route so pattern, target and filter errors surface at load
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::uri::Scheme;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::GatewayConfig;
use crate::routing::{Route, RouteError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.request_secs ({request_secs}) must exceed timeouts.upstream_secs ({upstream_secs})")]
    RequestTimeoutNotAboveUpstream { request_secs: u64, upstream_secs: u64 },

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.log_level {0:?} is not a log level")]
    LogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("route {route:?}: https upstream {uri:?} is not supported, use http")]
    HttpsUpstream { route: String, uri: String },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for (name, value) in [
        ("connect_secs", config.timeouts.connect_secs),
        ("upstream_secs", config.timeouts.upstream_secs),
        ("request_secs", config.timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    // request_secs bounds the whole exchange, upstream_secs only the forward.
    let timeouts = &config.timeouts;
    if timeouts.upstream_secs > 0 && timeouts.request_secs <= timeouts.upstream_secs {
        errors.push(ValidationError::RequestTimeoutNotAboveUpstream {
            request_secs: timeouts.request_secs,
            upstream_secs: timeouts.upstream_secs,
        });
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let observability = &config.observability;
    if observability.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    let mut ids = HashSet::new();
    for (index, route_config) in config.routes.iter().enumerate() {
        match Route::from_config(route_config, index) {
            Ok(route) => {
                if !ids.insert(route.id().to_string()) {
                    errors.push(RouteError::DuplicateId(route.id().to_string()).into());
                }
                if route.target().scheme() == Some(&Scheme::HTTPS) {
                    errors.push(ValidationError::HttpsUpstream {
                        route: route.id().to_string(),
                        uri: route.target().to_string(),
                    });
                }
            }
            Err(e) => errors.push(e.into()),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{FilterConfig, RouteConfig};

    fn route(id: &str, uri: &str) -> RouteConfig {
        RouteConfig {
            id: Some(id.into()),
            host: None,
            path: Some("/**".into()),
            path_prefix: None,
            methods: vec![],
            uri: uri.into(),
            filters: vec![],
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.upstream_secs = 0;
        config.observability.log_level = "loud".into();
        config.routes.push(route("a", "http://one"));
        config.routes.push(route("a", "http://two"));
        config.routes.push(route("b", "https://secure"));
        let mut bad_filter = route("c", "http://three");
        bad_filter.filters.push(FilterConfig::StripPrefix { parts: 0 });
        config.routes.push(bad_filter);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6, "{errors:?}");
        assert!(errors.contains(&ValidationError::BindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::ZeroTimeout("upstream_secs")));
        assert!(errors.contains(&ValidationError::LogLevel("loud".into())));
        assert!(errors.contains(&ValidationError::Route(RouteError::DuplicateId("a".into()))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::HttpsUpstream { route, .. } if route == "b")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Route(RouteError::Filter { route, .. }) if route == "c")));
    }

    #[test]
    fn test_request_timeout_must_exceed_upstream_timeout() {
        let mut config = GatewayConfig::default();
        config.timeouts.upstream_secs = 2;
        config.timeouts.request_secs = 1;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::RequestTimeoutNotAboveUpstream {
                request_secs: 1,
                upstream_secs: 2,
            }]
        );

        config.timeouts.request_secs = 2;
        assert!(validate_config(&config).is_err());

        config.timeouts.request_secs = 3;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MetricsAddress("nowhere".into())]
        );
    }
}
