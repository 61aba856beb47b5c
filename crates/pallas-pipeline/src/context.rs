//! Per-request state shared by every pipeline stage.

use crate::descriptor::ActionDescriptor;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use indexmap::IndexMap;
use pallas_binding::{BoundModel, RequestContext};
use pallas_core::{ModelStateDictionary, RequestId, RouteValues, Services};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything the pipeline knows about one request.
///
/// Filter contexts borrow the action context mutably and dereference to it,
/// so filters read model state and write the response through it.
#[derive(Debug)]
pub struct ActionContext {
    request_id: RequestId,
    action: Arc<ActionDescriptor>,
    request: RequestContext,
    model_state: ModelStateDictionary,
    response: ActionResponse,
    cancellation: CancellationToken,
}

impl ActionContext {
    /// Creates the context for invoking `action` on `request`.
    #[must_use]
    pub fn new(action: Arc<ActionDescriptor>, request: RequestContext) -> Self {
        Self {
            request_id: RequestId::new(),
            action,
            request,
            model_state: ModelStateDictionary::new(),
            response: ActionResponse::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Uses a caller-provided request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Uses a caller-provided cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Starts from a preconfigured model state, e.g. one with a custom error cap.
    #[must_use]
    pub fn with_model_state(mut self, model_state: ModelStateDictionary) -> Self {
        self.model_state = model_state;
        self
    }

    /// The request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The action being invoked.
    #[must_use]
    pub fn action(&self) -> &Arc<ActionDescriptor> {
        &self.action
    }

    /// The buffered request.
    #[must_use]
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// The request's service registry.
    #[must_use]
    pub fn services(&self) -> &Arc<Services> {
        self.request.services()
    }

    /// Route values handed over by the router.
    #[must_use]
    pub fn route_values(&self) -> &RouteValues {
        self.request.route_values()
    }

    /// Binding and validation state.
    #[must_use]
    pub fn model_state(&self) -> &ModelStateDictionary {
        &self.model_state
    }

    /// Mutable binding and validation state.
    pub fn model_state_mut(&mut self) -> &mut ModelStateDictionary {
        &mut self.model_state
    }

    /// The response under construction.
    #[must_use]
    pub fn response(&self) -> &ActionResponse {
        &self.response
    }

    /// Mutable response.
    pub fn response_mut(&mut self) -> &mut ActionResponse {
        &mut self.response
    }

    /// The request's cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the request was canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Consumes the context, returning the response.
    #[must_use]
    pub fn into_response(self) -> ActionResponse {
        self.response
    }

    pub(crate) fn binding_parts(&mut self) -> (&RequestContext, &mut ModelStateDictionary) {
        (&self.request, &mut self.model_state)
    }
}

/// Response status, headers and body written by action results.
#[derive(Debug, Clone, Default)]
pub struct ActionResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ActionResponse {
    /// The status code (200 until a result sets it).
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets `Content-Type`. Values that are not valid header text are ignored.
    pub fn set_content_type(&mut self, content_type: &str) {
        match HeaderValue::from_str(content_type) {
            Ok(value) => {
                self.headers.insert(CONTENT_TYPE, value);
            }
            Err(_) => tracing::warn!(content_type, "ignoring invalid content type"),
        }
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Converts into an HTTP response.
    #[must_use]
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Bound action arguments, keyed by parameter name in declaration order.
///
/// Parameters that were not bound are absent; the action sees their
/// type default through [`ActionArguments::get_or_default`].
#[derive(Debug, Clone, Default)]
pub struct ActionArguments(IndexMap<String, BoundModel>);

impl ActionArguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an argument.
    pub fn insert(&mut self, name: impl Into<String>, model: BoundModel) -> Option<BoundModel> {
        self.0.insert(name.into(), model)
    }

    /// Removes an argument.
    pub fn remove(&mut self, name: &str) -> Option<BoundModel> {
        self.0.shift_remove(name)
    }

    /// The bound model of a parameter.
    #[must_use]
    pub fn bound(&self, name: &str) -> Option<&BoundModel> {
        self.0.get(name)
    }

    /// The JSON value of a request-bound parameter.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.bound(name).and_then(BoundModel::as_value)
    }

    /// Deserializes a request-bound parameter.
    ///
    /// Returns `None` when the parameter is unbound or does not deserialize
    /// into `T`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.value(name)?;
        match T::deserialize(value) {
            Ok(model) => Some(model),
            Err(error) => {
                tracing::debug!(parameter = name, %error, "argument did not deserialize");
                None
            }
        }
    }

    /// Deserializes a parameter, falling back to `T::default()`.
    #[must_use]
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        self.get(name).unwrap_or_default()
    }

    /// A service-bound parameter.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.bound(name).and_then(BoundModel::service::<T>)
    }

    /// Returns `true` if the parameter was bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates arguments in parameter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundModel)> {
        self.0.iter().map(|(name, model)| (name.as_str(), model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_into_http() {
        let mut response = ActionResponse::default();
        assert_eq!(response.status(), StatusCode::OK);
        response.set_status(StatusCode::CREATED);
        response.set_content_type("text/plain; charset=utf-8");
        response.set_body("done");

        let http = response.into_http();
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(
            http.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_invalid_content_type_is_ignored() {
        let mut response = ActionResponse::default();
        response.set_content_type("text/plain\n");
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_arguments_typed_access() {
        let mut arguments = ActionArguments::new();
        arguments.insert("id", BoundModel::Value(json!(42)));
        arguments.insert("name", BoundModel::Value(json!("widget")));
        arguments.insert("clock", BoundModel::Service(Arc::new(7_u64)));

        assert_eq!(arguments.get::<i32>("id"), Some(42));
        assert_eq!(arguments.get::<String>("name").as_deref(), Some("widget"));
        assert_eq!(arguments.get::<i32>("name"), None);
        assert_eq!(arguments.get_or_default::<i32>("missing"), 0);
        assert_eq!(arguments.service::<u64>("clock").as_deref(), Some(&7));
        assert!(arguments.service::<u64>("id").is_none());

        let names: Vec<_> = arguments.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["id", "name", "clock"]);
    }
}
