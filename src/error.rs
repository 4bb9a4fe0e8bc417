//! Request-level gateway errors and their HTTP mapping.
//!
//! | error            | status |
//! |------------------|--------|
//! | no route         | 404    |
//! | unreadable body  | 400    |
//! | body too large   | 413    |
//! | filter failure   | 500    |
//! | upstream timeout | 504    |
//! | other upstream   | 502    |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::filter::FilterError;
use crate::http::ForwardError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no route matches host {host:?} path {path:?}")]
    NoRoute { host: String, path: String },

    #[error("request body larger than {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("request body could not be read: {reason}")]
    BodyUnreadable { reason: String },

    #[error("route {route}: {source}")]
    Filter {
        route: String,
        #[source]
        source: FilterError,
    },

    #[error("route {route}: {source}")]
    Forward {
        route: String,
        #[source]
        source: ForwardError,
    },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoRoute { .. } => StatusCode::NOT_FOUND,
            GatewayError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BodyUnreadable { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Filter { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Forward {
                source: ForwardError::Timeout(_),
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Forward { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Client-facing body. Internal details stay in the logs.
    fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "Malformed request body",
            StatusCode::NOT_FOUND => "No matching route found",
            StatusCode::PAYLOAD_TOO_LARGE => "Request body too large",
            StatusCode::GATEWAY_TIMEOUT => "Upstream timed out",
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            _ => "Internal gateway error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
