//! Ordered filter execution.

use std::sync::Arc;

use crate::filter::{Filter, FilterError, FilterOutcome};
use crate::http::GatewayRequest;

/// Run `filters` in order, feeding each the previous filter's output.
///
/// Stops at the first filter that responds or fails; later filters are
/// never invoked.
pub fn apply(
    filters: &[Arc<dyn Filter>],
    request: GatewayRequest,
) -> Result<FilterOutcome, FilterError> {
    let mut current = request;
    for filter in filters {
        match filter.apply(&current)? {
            FilterOutcome::Continue(next) => current = next,
            FilterOutcome::Respond(response) => {
                tracing::debug!(
                    filter = filter.name(),
                    status = %response.status(),
                    "Filter short-circuited chain"
                );
                return Ok(FilterOutcome::Respond(response));
            }
        }
    }
    Ok(FilterOutcome::Continue(current))
}

/// An immutable, ordered list of filters attached to a route.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Arc<dyn Filter>>) -> Self {
        Self { filters }
    }

    pub fn apply(&self, request: GatewayRequest) -> Result<FilterOutcome, FilterError> {
        apply(&self.filters, request)
    }

    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
