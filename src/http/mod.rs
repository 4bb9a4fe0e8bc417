//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, body buffering)
//!     → request.rs (GatewayRequest: host, path, query, headers, body)
//!     → [gateway: route match + filter chain]
//!     → forward.rs (outbound request, upstream call)
//!     → response.rs / upstream response
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardError, Forwarder, HttpForwarder};
pub use request::{GatewayRequest, QueryParams, X_REQUEST_ID};
pub use response::GatewayResponse;
pub use server::HttpServer;
