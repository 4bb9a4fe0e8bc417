//! Query string removal.

use crate::filter::{Filter, FilterError, FilterOutcome};
use crate::http::{GatewayRequest, QueryParams};

/// Drops every query parameter from the forwarded request.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStripper;

impl Filter for QueryStripper {
    fn name(&self) -> &'static str {
        "strip_query"
    }

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
        if request.query().is_empty() {
            return Ok(FilterOutcome::Continue(request.clone()));
        }

        tracing::debug!(
            request_id = %request.request_id(),
            removed = request.query().len(),
            path = %request.path(),
            "Removed all query params"
        );
        Ok(FilterOutcome::Continue(
            request.clone().with_query(QueryParams::default()),
        ))
    }
}
