//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions, evaluated in file order.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
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

/// A single route: predicates, target and filters.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics. Generated when omitted.
    #[serde(default)]
    pub id: Option<String>,

    /// Host glob, e.g. `**.example.com`. Omitted = any host.
    #[serde(default)]
    pub host: Option<String>,

    /// Ant-style path pattern, e.g. `/api/**`.
    #[serde(default)]
    pub path: Option<String>,

    /// Raw path prefix; alternative to `path`.
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// Allowed methods. Empty = any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Target URI the request is forwarded to.
    pub uri: String,

    /// Filters, applied in order.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

/// Filter declarations, tagged by `kind`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterConfig {
    /// Inject Accept-Language from `?locale=` or the default.
    Locale {
        #[serde(default = "default_locale")]
        default_locale: String,
    },

    /// Remove every query parameter.
    StripQuery,

    /// `locale` followed by `strip_query`.
    ModifyRequest {
        #[serde(default = "default_locale")]
        default_locale: String,
    },

    PrefixPath {
        prefix: String,
    },

    StripPrefix {
        #[serde(default = "default_strip_parts")]
        parts: usize,
    },

    AddRequestHeader {
        name: String,
        value: String,
    },

    SetRequestHeader {
        name: String,
        value: String,
    },

    RemoveRequestHeader {
        name: String,
    },

    /// Reject requests larger than `max_bytes` with 413.
    RequestSize {
        max_bytes: u64,
    },
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_strip_parts() -> usize {
    1
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to answer, in seconds.
    pub upstream_secs: u64,

    /// Whole-request timeout enforced by the server, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
