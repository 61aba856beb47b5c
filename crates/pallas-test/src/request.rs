//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use http_body_util::Full;
use pallas::core::RouteValues;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// A request addressed to one action.
///
/// Routing is not simulated: the action id and the route values are given
/// directly, as a router would hand them to [`pallas::Mvc::handle`].
#[derive(Debug)]
pub struct TestRequest {
    /// Id of the action to run.
    pub action_id: String,
    /// The HTTP request.
    pub request: http::Request<Full<Bytes>>,
    /// Route values the request matched.
    pub route_values: RouteValues,
    /// Token the pipeline observes.
    pub cancellation: CancellationToken,
}

/// Builder for [`TestRequest`].
///
/// Invalid headers or bodies do not panic here; the first problem is
/// reported by [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    action_id: String,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    route_values: RouteValues,
    cancellation: CancellationToken,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Starts a request for `action_id`.
    pub fn new(method: Method, action_id: impl Into<String>, uri: impl AsRef<str>) -> Self {
        Self {
            action_id: action_id.into(),
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            route_values: RouteValues::new(),
            cancellation: CancellationToken::new(),
            error: None,
        }
    }

    fn fail(mut self, error: TestError) -> Self {
        self.error.get_or_insert(error);
        self
    }

    /// Sets a header, replacing earlier values.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = match HeaderName::try_from(name.as_ref()) {
            Ok(name) => name,
            Err(e) => return self.fail(TestError::InvalidHeader(format!("{}: {e}", name.as_ref()))),
        };
        let value = match HeaderValue::try_from(value.as_ref()) {
            Ok(value) => value,
            Err(e) => return self.fail(TestError::InvalidHeader(format!("{name}: {e}"))),
        };
        self.headers.insert(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the body and sets `Content-Type: application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.content_type("application/json")
            }
            Err(e) => self.fail(TestError::Json(e)),
        }
    }

    /// Form-encodes `value` as the body.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => {
                self.body = Bytes::from(encoded);
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(e) => self.fail(TestError::RequestBuild(format!("form encoding: {e}"))),
        }
    }

    /// Adds a route value.
    pub fn route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(key, value);
        self
    }

    /// Replaces the route values.
    pub fn route_values(mut self, route_values: RouteValues) -> Self {
        self.route_values = route_values;
        self
    }

    /// Uses `token` as the request's cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builds the request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("Invalid URI '{}': {e}", self.uri)))?;

        let mut request = http::Request::new(Full::new(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers;

        Ok(TestRequest {
            action_id: self.action_id,
            request,
            route_values: self.route_values,
            cancellation: self.cancellation,
        })
    }
}
