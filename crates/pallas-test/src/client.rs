//! Test client running requests through a compiled application.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use bytes::Bytes;
use http::Method;
use pallas::core::RouteValues;
use pallas::Mvc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Sends in-memory requests to an [`Mvc`] application.
///
/// Every request runs the full pipeline (filters, binding, validation and
/// result execution) without a server or a socket.
///
/// # Example
///
/// ```
/// use pallas::prelude::*;
/// use pallas_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let application = ApplicationModel::new().controller(
///     ControllerModel::new(ControllerTypeInfo::unit("PingController"), vec![]).action(
///         ActionModel::new("Get", vec![]).with_method(ActionMethod::from_fn(|_| async {
///             Ok(ContentResult::new("pong"))
///         })),
///     ),
/// );
/// let client = TestClient::new(Mvc::builder(application).build().unwrap());
///
/// let response = client.get("Ping.Get", "/ping").send().await;
/// assert_eq!(response.text().unwrap(), "pong");
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    mvc: Mvc,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `mvc`.
    pub fn new(mvc: Mvc) -> Self {
        Self {
            mvc,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The application under test.
    pub fn mvc(&self) -> &Mvc {
        &self.mvc
    }

    /// A GET request to `action_id`.
    pub fn get(&self, action_id: &str, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, action_id, uri)
    }

    /// A POST request to `action_id`.
    pub fn post(&self, action_id: &str, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, action_id, uri)
    }

    /// A PUT request to `action_id`.
    pub fn put(&self, action_id: &str, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, action_id, uri)
    }

    /// A PATCH request to `action_id`.
    pub fn patch(&self, action_id: &str, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, action_id, uri)
    }

    /// A DELETE request to `action_id`.
    pub fn delete(&self, action_id: &str, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, action_id, uri)
    }

    /// A request with any method.
    pub fn request(
        &self,
        method: Method,
        action_id: &str,
        uri: impl AsRef<str>,
    ) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, action_id, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }

    /// Runs a built request.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self
            .mvc
            .handle(
                &request.action_id,
                request.request,
                request.route_values,
                request.cancellation,
            )
            .await?;
        TestResponse::from_http(response).await
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets a form-encoded body.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Adds a route value.
    pub fn route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.route_value(key, value);
        self
    }

    /// Replaces the route values.
    pub fn route_values(mut self, route_values: RouteValues) -> Self {
        self.builder = self.builder.route_values(route_values);
        self
    }

    /// Uses `token` as the cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.builder = self.builder.cancellation(token);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request is invalid or the application returns an
    /// error instead of a response. Use [`try_send`](Self::try_send) to
    /// inspect errors.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request, returning errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.execute(request).await
    }
}
