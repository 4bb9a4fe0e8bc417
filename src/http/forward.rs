//! Upstream forwarding.
//!
//! # Responsibilities
//! - Turn the filtered `GatewayRequest` into an outbound request for the
//!   route's target
//! - Send it with a bounded timeout and return the upstream response as-is
//!
//! # Design Decisions
//! - Scheme comes from the target URI, falling back to the request's scheme
//! - The inbound `Host` header is dropped; the client derives it from the
//!   target authority
//! - No retries: a failed forward is reported once (502 / 504)
//! - Dropping the returned future cancels the upstream call

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::Scheme;
use axum::http::{header, Request, Response, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::http::headers;
use crate::http::GatewayRequest;
use crate::routing::TargetUri;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream uri: {0}")]
    InvalidUri(#[from] axum::http::Error),

    #[error("upstream scheme {0:?} is not supported")]
    UnsupportedScheme(String),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ForwardError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidUri(_) => "invalid_uri",
            ForwardError::UnsupportedScheme(_) => "unsupported_scheme",
            ForwardError::Timeout(_) => "timeout",
            ForwardError::Upstream(_) => "connect",
        }
    }
}

/// Sends a prepared request to its upstream.
pub trait Forwarder: Send + Sync + 'static {
    fn forward(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, ForwardError>> + Send;
}

/// Build the outbound request for `target` from a filtered request.
pub fn upstream_request(
    request: &GatewayRequest,
    target: &TargetUri,
) -> Result<Request<Body>, ForwardError> {
    let scheme = target.scheme().unwrap_or(request.scheme()).clone();

    let mut path_and_query = request.path().to_string();
    if !request.query().is_empty() {
        path_and_query.push('?');
        path_and_query.push_str(&request.query().to_query_string());
    }

    let uri = Uri::builder()
        .scheme(scheme)
        .authority(target.authority().clone())
        .path_and_query(path_and_query)
        .build()?;

    let mut outbound_headers = request.headers().clone();
    headers::strip_hop_by_hop(&mut outbound_headers);
    outbound_headers.remove(header::HOST);
    headers::append_forwarded(
        &mut outbound_headers,
        request.remote_addr(),
        request.scheme(),
        request.host(),
    );

    let mut outbound = Request::new(Body::from(request.body().clone()));
    *outbound.method_mut() = request.method().clone();
    *outbound.uri_mut() = uri;
    *outbound.headers_mut() = outbound_headers;
    Ok(outbound)
}

/// Plain-HTTP forwarder backed by the hyper-util pooled client.
#[derive(Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Forwarder for HttpForwarder {
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        if request.uri().scheme() != Some(&Scheme::HTTP) {
            let scheme = request.uri().scheme_str().unwrap_or_default().to_string();
            return Err(ForwardError::UnsupportedScheme(scheme));
        }

        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
            Ok(Err(e)) => Err(ForwardError::Upstream(Box::new(e))),
            Ok(Ok(response)) => {
                let (parts, body): (_, hyper::body::Incoming) = response.into_parts();
                Ok(Response::from_parts(parts, Body::new(body)))
            }
        }
    }
}
