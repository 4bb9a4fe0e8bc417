//! Request size guard.
//!
//! Rejects requests whose declared `Content-Length` or buffered body exceeds
//! the route's limit with 413 Payload Too Large. The explanation travels in
//! an `errormessage` response header so the body stays empty.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};

use crate::filter::{Filter, FilterError, FilterOutcome};
use crate::http::{GatewayRequest, GatewayResponse};

pub const ERROR_MESSAGE: HeaderName = HeaderName::from_static("errormessage");

#[derive(Debug, Clone, Copy)]
pub struct RequestSize {
    max_bytes: u64,
}

impl RequestSize {
    pub fn new(max_bytes: u64) -> Result<Self, FilterError> {
        if max_bytes == 0 {
            return Err(FilterError::InvalidConfig {
                filter: "request_size",
                reason: "max_bytes must be greater than zero".into(),
            });
        }
        Ok(Self { max_bytes })
    }

    fn request_size(request: &GatewayRequest) -> u64 {
        let declared = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        declared.max(request.body().len() as u64)
    }
}

impl Filter for RequestSize {
    fn name(&self) -> &'static str {
        "request_size"
    }

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
        let size = Self::request_size(request);
        if size <= self.max_bytes {
            return Ok(FilterOutcome::Continue(request.clone()));
        }

        tracing::warn!(
            request_id = %request.request_id(),
            size,
            limit = self.max_bytes,
            "Request exceeds size limit"
        );

        let message = format!(
            "Request size is larger than permissible limit. Request size is {} bytes where permissible limit is {} bytes",
            size, self.max_bytes
        );
        let mut response = GatewayResponse::new(StatusCode::PAYLOAD_TOO_LARGE);
        if let Ok(value) = HeaderValue::from_str(&message) {
            response = response.with_header(ERROR_MESSAGE, value);
        }
        Ok(FilterOutcome::Respond(response))
    }
}
