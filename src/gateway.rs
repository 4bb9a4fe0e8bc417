//! Request dispatch: route match, filter chain, upstream forward.
//!
//! # Data Flow
//! ```text
//! GatewayRequest
//!     → Router::match_request        (none → 404, no filter runs)
//!     → route.filters().apply        (Respond → returned as-is, Err → 500)
//!     → upstream_request + Forwarder (timeout → 504, other failure → 502)
//!     → upstream Response, unchanged
//! ```
//!
//! # Design Decisions
//! - The route table sits behind `ArcSwap`; a request keeps the snapshot it
//!   started with even if a reload lands mid-flight
//! - The forwarder is a type parameter so tests can substitute a recorder

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::filter::FilterOutcome;
use crate::http::forward::upstream_request;
use crate::http::{Forwarder, GatewayRequest, HttpForwarder};
use crate::observability::metrics;
use crate::routing::Router;

/// Metric label for requests that matched no route.
const NO_ROUTE: &str = "none";

pub struct Gateway<F = HttpForwarder> {
    routes: ArcSwap<Router>,
    forwarder: F,
}

impl<F: Forwarder> Gateway<F> {
    pub fn new(router: Router, forwarder: F) -> Self {
        metrics::record_routes_loaded(router.len());
        Self {
            routes: ArcSwap::from_pointee(router),
            forwarder,
        }
    }

    /// Snapshot of the active route table.
    pub fn routes(&self) -> Arc<Router> {
        self.routes.load_full()
    }

    /// Atomically install a new route table. In-flight requests finish
    /// against the table they matched.
    pub fn replace_routes(&self, router: Router) {
        metrics::record_routes_loaded(router.len());
        tracing::info!(routes = router.len(), "Route table replaced");
        self.routes.store(Arc::new(router));
    }

    pub fn forwarder(&self) -> &F {
        &self.forwarder
    }

    /// Dispatch one request, returning gateway failures as errors.
    pub async fn route(&self, request: GatewayRequest) -> Result<Response, GatewayError> {
        self.dispatch(request).await.1
    }

    /// Dispatch one request and render any failure as its HTTP status.
    pub async fn handle(&self, request: GatewayRequest) -> Response {
        let start = Instant::now();
        let request_id = request.request_id().to_string();
        let method = request.method().to_string();

        let (route_id, result) = self.dispatch(request).await;
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    GatewayError::NoRoute { .. } => {
                        tracing::warn!(request_id = %request_id, error = %err, "No route matched")
                    }
                    _ => tracing::error!(
                        request_id = %request_id,
                        route = %route_id,
                        error = %err,
                        "Request failed"
                    ),
                }
                err.into_response()
            }
        };

        let status = response.status().as_u16();
        metrics::record_request(&route_id, &method, status, start);
        tracing::debug!(
            request_id = %request_id,
            route = %route_id,
            status,
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }

    async fn dispatch(&self, request: GatewayRequest) -> (String, Result<Response, GatewayError>) {
        let router = self.routes.load_full();
        let Some(route) = router.match_request(&request) else {
            metrics::record_no_route();
            let err = GatewayError::NoRoute {
                host: request.host().to_string(),
                path: request.path().to_string(),
            };
            return (NO_ROUTE.to_string(), Err(err));
        };
        let route_id = route.id().to_string();

        tracing::debug!(
            request_id = %request.request_id(),
            route = %route_id,
            host = %request.host(),
            path = %request.path(),
            "Route matched"
        );

        let request = match route.filters().apply(request) {
            Ok(FilterOutcome::Continue(request)) => request,
            Ok(FilterOutcome::Respond(response)) => {
                metrics::record_short_circuit(&route_id, response.status().as_u16());
                return (route_id, Ok(response.into_response()));
            }
            Err(source) => {
                let err = GatewayError::Filter {
                    route: route_id.clone(),
                    source,
                };
                return (route_id, Err(err));
            }
        };

        let outbound = match upstream_request(&request, route.target()) {
            Ok(outbound) => outbound,
            Err(source) => {
                metrics::record_upstream_error(&route_id, source.kind());
                let err = GatewayError::Forward {
                    route: route_id.clone(),
                    source,
                };
                return (route_id, Err(err));
            }
        };

        let result = self.forwarder.forward(outbound).await.map_err(|source| {
            metrics::record_upstream_error(&route_id, source.kind());
            GatewayError::Forward {
                route: route_id.clone(),
                source,
            }
        });
        (route_id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::body::{Body, Bytes};
    use axum::http::{header, Request, StatusCode};

    use crate::filter::{Filter, FilterError, LocaleNormalizer, PrefixPath, QueryStripper};
    use crate::http::{ForwardError, GatewayResponse};

    /// Records what would have been sent upstream and answers 200.
    #[derive(Default)]
    struct RecordingForwarder {
        seen: Mutex<Vec<Request<Body>>>,
        fail_with_timeout: bool,
    }

    impl RecordingForwarder {
        fn take(&self) -> Vec<Request<Body>> {
            std::mem::take(&mut *self.seen.lock().unwrap())
        }
    }

    impl Forwarder for RecordingForwarder {
        async fn forward(&self, request: Request<Body>) -> Result<Response, ForwardError> {
            self.seen.lock().unwrap().push(request);
            if self.fail_with_timeout {
                return Err(ForwardError::Timeout(Duration::from_secs(1)));
            }
            Ok(Response::new(Body::from("upstream")))
        }
    }

    #[derive(Debug, Default)]
    struct Counting(AtomicUsize);

    impl Filter for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(FilterOutcome::Continue(request.clone()))
        }
    }

    #[derive(Debug)]
    struct Unauthorized;

    impl Filter for Unauthorized {
        fn name(&self) -> &'static str {
            "unauthorized"
        }

        fn apply(&self, _request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
            Ok(FilterOutcome::Respond(
                GatewayResponse::new(StatusCode::UNAUTHORIZED).with_body("denied"),
            ))
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Filter for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn apply(&self, _request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
            Err(FilterError::Failed {
                filter: "broken",
                reason: "boom".into(),
            })
        }
    }

    fn request(host: &str, uri: &str) -> GatewayRequest {
        Request::builder()
            .uri(uri)
            .header(header::HOST, host)
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    fn gateway(filters: Vec<Arc<dyn Filter>>) -> Gateway<RecordingForwarder> {
        let mut router = Router::new();
        router
            .add_route("r1", "**.baeldung.com", "/baeldung", "http://baeldung.com", filters)
            .unwrap();
        Gateway::new(router, RecordingForwarder::default())
    }

    fn locale_filters() -> Vec<Arc<dyn Filter>> {
        vec![
            Arc::new(LocaleNormalizer::with_default("en-US").unwrap()),
            Arc::new(QueryStripper),
        ]
    }

    #[tokio::test]
    async fn test_no_match_is_404_and_runs_no_filter() {
        let counting = Arc::new(Counting::default());
        let gw = gateway(vec![counting.clone()]);

        let err = gw
            .route(request("www.example.org", "/baeldung"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(counting.0.load(Ordering::SeqCst), 0);
        assert!(gw.forwarder().take().is_empty());
    }

    #[tokio::test]
    async fn test_locale_param_becomes_header_and_query_is_dropped() {
        let gw = gateway(locale_filters());

        let response = gw
            .route(request("www.baeldung.com", "/baeldung?locale=fr-FR"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let sent = gw.forwarder().take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].uri().to_string(), "http://baeldung.com/baeldung");
        assert_eq!(sent[0].headers()[header::ACCEPT_LANGUAGE], "fr-FR");
    }

    #[tokio::test]
    async fn test_default_locale_applied_without_param() {
        let gw = gateway(locale_filters());

        gw.route(request("api.baeldung.com", "/baeldung?x=1"))
            .await
            .unwrap();

        let sent = gw.forwarder().take();
        assert_eq!(sent[0].headers()[header::ACCEPT_LANGUAGE], "en-US");
        assert_eq!(sent[0].uri().query(), None);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_upstream_and_later_filters() {
        let counting = Arc::new(Counting::default());
        let gw = gateway(vec![Arc::new(Unauthorized), counting.clone()]);

        let response = gw
            .route(request("www.baeldung.com", "/baeldung"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(counting.0.load(Ordering::SeqCst), 0);
        assert!(gw.forwarder().take().is_empty());
    }

    #[tokio::test]
    async fn test_filter_failure_is_500_and_not_forwarded() {
        let gw = gateway(vec![Arc::new(Broken)]);

        let response = gw.handle(request("www.baeldung.com", "/baeldung")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(gw.forwarder().take().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_timeout_is_504() {
        let mut router = Router::new();
        router
            .add_route("slow", "**", "/**", "http://backend", vec![])
            .unwrap();
        let forwarder = RecordingForwarder {
            fail_with_timeout: true,
            ..Default::default()
        };
        let gw = Gateway::new(router, forwarder);

        let response = gw.handle(request("any.host", "/x")).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_prefix_path_rewrites_forwarded_path() {
        let mut router = Router::new();
        router
            .add_route(
                "other",
                "**.baeldung.com",
                "/myOtherRouting",
                "http://othersite.com",
                vec![Arc::new(PrefixPath::new("/myPrefix").unwrap())],
            )
            .unwrap();
        let gw = Gateway::new(router, RecordingForwarder::default());

        gw.route(request("www.baeldung.com", "/myOtherRouting?a=b"))
            .await
            .unwrap();

        let sent = gw.forwarder().take();
        assert_eq!(
            sent[0].uri().to_string(),
            "http://othersite.com/myPrefix/myOtherRouting?a=b"
        );
    }

    #[tokio::test]
    async fn test_replace_routes_takes_effect_for_next_request() {
        let gw = gateway(vec![]);
        assert!(gw.route(request("h", "/new")).await.is_err());

        let mut router = Router::new();
        router.add_route("new", "**", "/new", "http://new", vec![]).unwrap();
        gw.replace_routes(router);

        assert!(gw.route(request("h", "/new")).await.is_ok());
        assert_eq!(gw.routes().len(), 1);
        assert_eq!(gw.routes().routes()[0].id(), "new");
    }
}
