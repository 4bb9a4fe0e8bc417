//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Buffer the request body and hand it to the gateway
//! - Swap in new route tables as configuration updates arrive
//! - Stop accepting and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::{GatewayRequest, HttpForwarder};
use crate::routing::{RouteError, Router as RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub max_body_bytes: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    gateway: Arc<Gateway>,
}

impl HttpServer {
    /// Compile the configured routes and build the server.
    pub fn new(config: GatewayConfig) -> Result<Self, RouteError> {
        let routes = RouteTable::from_config(&config.routes)?;
        let forwarder = HttpForwarder::new(
            Duration::from_secs(config.timeouts.connect_secs),
            Duration::from_secs(config.timeouts.upstream_secs),
        );
        let gateway = Arc::new(Gateway::new(routes, forwarder));

        let state = AppState {
            gateway: Arc::clone(&gateway),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, gateway })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Each config received on `config_updates` replaces the route table;
    /// a config whose routes fail to compile is logged and ignored.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.gateway.routes().len(),
            "HTTP server starting"
        );

        let gateway = Arc::clone(&self.gateway);
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match RouteTable::from_config(&config.routes) {
                    Ok(routes) => gateway.replace_routes(routes),
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected route update, keeping current routes")
                    }
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: resolve the route, buffer the body, then dispatch
/// through the gateway.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    // Unroutable requests get their 404 without the body being read.
    let head = GatewayRequest::from_parts(&parts, Bytes::new(), Some(remote_addr));
    if state.gateway.routes().match_request(&head).is_none() {
        return state.gateway.handle(head).await;
    }

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = body_error(e, state.max_body_bytes);
            tracing::warn!(
                request_id = %head.request_id(),
                error = %err,
                "Failed to buffer request body"
            );
            return err.into_response();
        }
    };

    let request = GatewayRequest::from_parts(&parts, body, Some(remote_addr));
    state.gateway.handle(request).await
}

/// 413 for the length limit, 400 for anything else that broke the body.
fn body_error(error: axum::Error, limit: usize) -> GatewayError {
    let mut source = Some(&error as &(dyn std::error::Error + 'static));
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return GatewayError::BodyTooLarge { limit };
        }
        source = e.source();
    }
    GatewayError::BodyUnreadable {
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_oversized_body_is_too_large() {
        let err = axum::body::to_bytes(Body::from("more than four"), 4)
            .await
            .unwrap_err();
        assert!(matches!(
            body_error(err, 4),
            GatewayError::BodyTooLarge { limit: 4 }
        ));
    }

    #[test]
    fn test_broken_body_is_bad_request() {
        let err = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        ));
        let mapped = body_error(err, 1024);
        assert!(matches!(mapped, GatewayError::BodyUnreadable { .. }));
        assert_eq!(mapped.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
