//! Gateway request model.
//!
//! # Responsibilities
//! - Capture the routing-relevant view of an inbound request (host, path,
//!   query parameters, headers) together with the buffered body
//! - Provide copy-on-write transformations for filters
//! - Carry the request ID assigned by the server middleware
//!
//! # Design Decisions
//! - `with_*` methods consume `self` and return the modified value; filters
//!   only ever see `&GatewayRequest` so the caller's copy is never touched
//! - Query parameters keep their raw encoding until a filter rewrites them,
//!   so an untouched query string is forwarded byte-for-byte
//! - Body bytes are reference counted, cloning a request does not copy them

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::uri::Scheme;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Ordered multi-valued query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
    raw: Option<String>,
}

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string.
    pub fn parse(query: &str) -> Self {
        if query.is_empty() {
            return Self::default();
        }
        Self {
            pairs: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            raw: Some(query.to_string()),
        }
    }

    /// First value for `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in request order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode back into a query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
            raw: None,
        }
    }
}

/// An inbound request as seen by the route matcher and the filter chain.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    method: Method,
    scheme: Scheme,
    host: String,
    path: String,
    query: QueryParams,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl GatewayRequest {
    /// Build from the parts of an inbound HTTP request.
    ///
    /// The host comes from the `Host` header, falling back to the URI
    /// authority (HTTP/2 `:authority` or absolute-form request targets).
    pub fn from_parts(
        parts: &axum::http::request::Parts,
        body: Bytes,
        remote_addr: Option<SocketAddr>,
    ) -> Self {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
            .unwrap_or_default();

        let path = match parts.uri.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        Self {
            method: parts.method.clone(),
            scheme: parts.uri.scheme().cloned().unwrap_or(Scheme::HTTP),
            host,
            path,
            query: QueryParams::parse(parts.uri.query().unwrap_or_default()),
            headers: parts.headers.clone(),
            body,
            remote_addr,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Host as received, possibly including a port.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Correlation ID set by the request ID middleware, or `"unknown"`.
    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Replace every value of `name` with `value`.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Append `value` to the values of `name`.
    pub fn with_appended_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn without_header(mut self, name: &HeaderName) -> Self {
        self.headers.remove(name);
        self
    }
}

impl From<Request<Bytes>> for GatewayRequest {
    fn from(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::from_parts(&parts, body, None)
    }
}

/// Layer assigning a UUID v4 `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer copying the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> GatewayRequest {
        Request::builder()
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    #[test]
    fn test_host_from_header_wins_over_authority() {
        let req: GatewayRequest = Request::builder()
            .uri("http://internal:8080/a")
            .header("Host", "www.example.com")
            .body(Bytes::new())
            .unwrap()
            .into();
        assert_eq!(req.host(), "www.example.com");
    }

    #[test]
    fn test_host_falls_back_to_authority() {
        let req = request("http://www.example.com:8080/a");
        assert_eq!(req.host(), "www.example.com:8080");
        assert_eq!(req.path(), "/a");
    }

    #[test]
    fn test_query_params_keep_order_and_duplicates() {
        let req = request("http://h/p?locale=fr-FR&tag=a&tag=b");
        assert_eq!(req.query().first("locale"), Some("fr-FR"));
        assert_eq!(req.query().all("tag").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(req.query().len(), 3);
    }

    #[test]
    fn test_untouched_query_keeps_raw_encoding() {
        let query = QueryParams::parse("q=a%20b&x=1");
        assert_eq!(query.to_query_string(), "q=a%20b&x=1");

        let rebuilt: QueryParams = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(rebuilt.to_query_string(), "q=a+b&x=1");
    }

    #[test]
    fn test_with_methods_leave_original_untouched() {
        let original = request("http://h/p?x=1");
        let modified = original
            .clone()
            .with_path("/other")
            .with_query(QueryParams::default())
            .with_header(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));

        assert_eq!(original.path(), "/p");
        assert_eq!(original.query().len(), 1);
        assert!(original.headers().get(header::ACCEPT_LANGUAGE).is_none());

        assert_eq!(modified.path(), "/other");
        assert!(modified.query().is_empty());
        assert_eq!(modified.headers()[header::ACCEPT_LANGUAGE], "en-US");
    }

    #[test]
    fn test_request_id_defaults_to_unknown() {
        assert_eq!(request("http://h/").request_id(), "unknown");
    }
}
