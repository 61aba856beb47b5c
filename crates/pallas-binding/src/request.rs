//! Request data seen by binders and formatters.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use http_body_util::{BodyExt, Full};
use pallas_core::{RouteValues, Services};
use std::sync::Arc;

/// Everything binding may read from a request.
///
/// The body is buffered before binding starts, so formatters read it
/// synchronously and any number of times.
///
/// # Example
///
/// ```
/// use pallas_binding::RequestContext;
/// use pallas_core::RouteValues;
/// use http::Method;
///
/// let request = RequestContext::builder()
///     .method(Method::POST)
///     .uri("/orders/7?expand=lines".parse().unwrap())
///     .header("content-type", "application/json")
///     .body(r#"{"Total": 10}"#)
///     .route_values(RouteValues::new().with("id", "7"))
///     .build();
///
/// assert_eq!(request.content_type(), Some("application/json"));
/// assert_eq!(request.query_string(), Some("expand=lines"));
/// assert_eq!(request.route_values().get("id"), Some("7"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    route_values: RouteValues,
    services: Arc<Services>,
}

impl RequestContext {
    /// Creates a request context.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        route_values: RouteValues,
        services: Arc<Services>,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            route_values,
            services,
        }
    }

    /// Buffers an HTTP request into a request context.
    pub async fn from_http(
        request: http::Request<Full<Bytes>>,
        route_values: RouteValues,
        services: Arc<Services>,
    ) -> Self {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self::new(
            parts.method,
            parts.uri,
            parts.headers,
            body,
            route_values,
            services,
        )
    }

    /// Starts building a request context.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the buffered body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Route values supplied by the router.
    #[must_use]
    pub fn route_values(&self) -> &RouteValues {
        &self.route_values
    }

    /// The service registry.
    #[must_use]
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }
}

/// Builder for [`RequestContext`], mostly for tests.
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    route_values: RouteValues,
    services: Option<Arc<Services>>,
}

impl RequestContextBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header. Invalid values are ignored.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the route values.
    #[must_use]
    pub fn route_values(mut self, route_values: RouteValues) -> Self {
        self.route_values = route_values;
        self
    }

    /// Sets the service registry.
    #[must_use]
    pub fn services(mut self, services: Arc<Services>) -> Self {
        self.services = Some(services);
        self
    }

    /// Builds the context. Defaults to `GET /`.
    #[must_use]
    pub fn build(self) -> RequestContext {
        RequestContext::new(
            self.method.unwrap_or(Method::GET),
            self.uri.unwrap_or_else(|| Uri::from_static("/")),
            self.headers,
            self.body,
            self.route_values,
            self.services.unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_http_buffers_body() {
        let request = http::Request::builder()
            .method(Method::PUT)
            .uri("/items/3")
            .header("x-tenant", "acme")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();

        let ctx = RequestContext::from_http(request, RouteValues::new(), Arc::default()).await;
        assert_eq!(ctx.method(), &Method::PUT);
        assert_eq!(ctx.header("x-tenant"), Some("acme"));
        assert_eq!(ctx.body().as_ref(), b"payload");
        assert!(ctx.query_string().is_none());
    }

    #[test]
    fn test_builder_defaults() {
        let ctx = RequestContext::builder().build();
        assert_eq!(ctx.method(), &Method::GET);
        assert_eq!(ctx.uri().path(), "/");
        assert!(ctx.body().is_empty());
        assert!(ctx.content_type().is_none());
    }
}
