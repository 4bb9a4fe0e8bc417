//! Request filter subsystem.
//!
//! # Data Flow
//! ```text
//! Matched Route
//!     → chain.rs (run filters in declaration order)
//!     → each Filter: &GatewayRequest → Continue(new request) | Respond(response)
//!     → Return: final request to forward, or a terminal response
//!
//! Filter Construction (at startup / reload):
//!     FilterConfig[]
//!     → from_config (validate parameters)
//!     → Arc<dyn Filter> (immutable, shared by every request)
//! ```
//!
//! # Design Decisions
//! - Filters are pure: they read a borrowed request and return a new value
//! - Configuration is fixed at construction; filters hold no runtime state
//! - A filter error aborts the chain (fail-fast, surfaced as 500)

pub mod chain;
pub mod headers;
pub mod locale;
pub mod path;
pub mod query;
pub mod size;

use std::sync::Arc;

use thiserror::Error;

use crate::config::FilterConfig;
use crate::http::{GatewayRequest, GatewayResponse};

pub use chain::FilterChain;
pub use headers::{AddRequestHeader, RemoveRequestHeader, SetRequestHeader};
pub use locale::{LanguageTag, LocaleNormalizer};
pub use path::{PrefixPath, StripPrefix};
pub use query::QueryStripper;
pub use size::RequestSize;

/// Result of running a single filter.
#[derive(Debug, Clone)]
pub enum FilterOutcome {
    /// Pass this (possibly modified) request to the next filter.
    Continue(GatewayRequest),
    /// Stop the chain and answer with this response.
    Respond(GatewayResponse),
}

/// Filter construction and execution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid {filter} configuration: {reason}")]
    InvalidConfig { filter: &'static str, reason: String },

    #[error("filter {filter} failed: {reason}")]
    Failed { filter: &'static str, reason: String },
}

/// A request transformer in a route's chain.
pub trait Filter: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs and metrics.
    fn name(&self) -> &'static str;

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError>;
}

/// Build the filters described by one config entry.
///
/// `modify_request` expands to a locale normalizer followed by a query
/// stripper; every other kind yields exactly one filter.
pub fn from_config(config: &FilterConfig) -> Result<Vec<Arc<dyn Filter>>, FilterError> {
    let filters: Vec<Arc<dyn Filter>> = match config {
        FilterConfig::Locale { default_locale } => {
            vec![Arc::new(LocaleNormalizer::with_default(default_locale)?)]
        }
        FilterConfig::StripQuery => vec![Arc::new(QueryStripper)],
        FilterConfig::ModifyRequest { default_locale } => vec![
            Arc::new(LocaleNormalizer::with_default(default_locale)?),
            Arc::new(QueryStripper),
        ],
        FilterConfig::PrefixPath { prefix } => vec![Arc::new(PrefixPath::new(prefix)?)],
        FilterConfig::StripPrefix { parts } => vec![Arc::new(StripPrefix::new(*parts)?)],
        FilterConfig::AddRequestHeader { name, value } => {
            vec![Arc::new(AddRequestHeader::new(name, value)?)]
        }
        FilterConfig::SetRequestHeader { name, value } => {
            vec![Arc::new(SetRequestHeader::new(name, value)?)]
        }
        FilterConfig::RemoveRequestHeader { name } => {
            vec![Arc::new(RemoveRequestHeader::new(name)?)]
        }
        FilterConfig::RequestSize { max_bytes } => vec![Arc::new(RequestSize::new(*max_bytes)?)],
    };
    Ok(filters)
}
