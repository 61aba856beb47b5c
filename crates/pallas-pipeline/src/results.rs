//! Action results: what an action (or a short-circuiting filter) asks the
//! pipeline to write to the response.

use crate::context::ActionContext;
use crate::error::PipelineError;
use http::StatusCode;
use pallas_core::{BoxFuture, ModelStateDictionary};
use serde::Serialize;
use serde_json::Value;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// A result executed against the response.
///
/// # Example
///
/// ```
/// use pallas_core::BoxFuture;
/// use pallas_pipeline::{ActionContext, ActionResult, PipelineError};
///
/// #[derive(Debug)]
/// struct Teapot;
///
/// impl ActionResult for Teapot {
///     fn execute<'a>(
///         &'a self,
///         context: &'a mut ActionContext,
///     ) -> BoxFuture<'a, Result<(), PipelineError>> {
///         Box::pin(async move {
///             context.response_mut().set_status(http::StatusCode::IM_A_TEAPOT);
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait ActionResult: Send + Sync + std::fmt::Debug {
    /// Writes the result to the response.
    fn execute<'a>(
        &'a self,
        context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>>;
}

/// A type-erased result.
pub type BoxedResult = Box<dyn ActionResult>;

impl ActionResult for BoxedResult {
    fn execute<'a>(
        &'a self,
        context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        self.as_ref().execute(context)
    }
}

/// Writes nothing. Used when a handled error leaves no result.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResult;

impl ActionResult for EmptyResult {
    fn execute<'a>(
        &'a self,
        _context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Sets only the status code.
#[derive(Debug, Clone, Copy)]
pub struct StatusCodeResult(pub StatusCode);

impl ActionResult for StatusCodeResult {
    fn execute<'a>(
        &'a self,
        context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            context.response_mut().set_status(self.0);
            Ok(())
        })
    }
}

/// Writes a string body.
#[derive(Debug, Clone)]
pub struct ContentResult {
    content: String,
    content_type: Option<String>,
    status: Option<StatusCode>,
}

impl ContentResult {
    /// A `text/plain` result.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: None,
            status: None,
        }
    }

    /// Overrides the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Overrides the status code.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

impl ActionResult for ContentResult {
    fn execute<'a>(
        &'a self,
        context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            let response = context.response_mut();
            if let Some(status) = self.status {
                response.set_status(status);
            }
            response.set_content_type(self.content_type.as_deref().unwrap_or(TEXT_CONTENT_TYPE));
            response.set_body(self.content.clone());
            Ok(())
        })
    }
}

fn write_json(
    context: &mut ActionContext,
    value: &Value,
    status: Option<StatusCode>,
) -> Result<(), PipelineError> {
    let body = serde_json::to_vec(value).map_err(PipelineError::result_execution)?;
    let response = context.response_mut();
    if let Some(status) = status {
        response.set_status(status);
    }
    response.set_content_type(JSON_CONTENT_TYPE);
    response.set_body(body);
    Ok(())
}

/// Writes a JSON body.
#[derive(Debug, Clone)]
pub struct JsonResult {
    value: Value,
    status: Option<StatusCode>,
}

impl JsonResult {
    /// Wraps a JSON value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value, status: None }
    }

    /// Serializes `value`.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Overrides the status code.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// The wrapped value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl ActionResult for JsonResult {
    fn execute<'a>(
        &'a self,
        context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move { write_json(context, &self.value, self.status) })
    }
}

/// An object written with the response's status code.
///
/// Objects are always written as JSON; `null` writes no body and answers
/// 204.
#[derive(Debug, Clone)]
pub struct ObjectResult {
    value: Value,
    status: Option<StatusCode>,
}

impl ObjectResult {
    /// Wraps a value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value, status: None }
    }

    /// Overrides the status code.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// The status code the result writes, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }
}

impl ActionResult for ObjectResult {
    fn execute<'a>(
        &'a self,
        context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            if self.value.is_null() {
                context
                    .response_mut()
                    .set_status(self.status.unwrap_or(StatusCode::NO_CONTENT));
                return Ok(());
            }
            write_json(context, &self.value, self.status)
        })
    }
}

/// 400 with a JSON body, usually the model-state error map.
#[derive(Debug, Clone)]
pub struct BadRequestObjectResult(ObjectResult);

impl BadRequestObjectResult {
    /// Wraps an error object.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(ObjectResult::new(value).status(StatusCode::BAD_REQUEST))
    }

    /// Serializes the errors of `model_state` as `{ key: [messages] }`.
    #[must_use]
    pub fn from_model_state(model_state: &ModelStateDictionary) -> Self {
        let errors = model_state
            .to_error_map()
            .into_iter()
            .map(|(key, messages)| (key, Value::from(messages)))
            .collect();
        Self::new(Value::Object(errors))
    }
}

impl ActionResult for BadRequestObjectResult {
    fn execute<'a>(
        &'a self,
        context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        self.0.execute(context)
    }
}

/// 415 Unsupported Media Type.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedMediaTypeResult;

impl ActionResult for UnsupportedMediaTypeResult {
    fn execute<'a>(
        &'a self,
        context: &'a mut ActionContext,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            context
                .response_mut()
                .set_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerTypeInfo;
    use crate::descriptor::{ActionDescriptor, ActionMethod};
    use http::header::CONTENT_TYPE;
    use pallas_binding::RequestContext;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> ActionContext {
        let descriptor = ActionDescriptor::new(
            ControllerTypeInfo::unit("HomeController"),
            "Index",
            ActionMethod::from_fn(|_| async { Ok(EmptyResult) }),
        );
        ActionContext::new(Arc::new(descriptor), RequestContext::builder().build())
    }

    #[tokio::test]
    async fn test_content_result() {
        let mut ctx = context();
        ContentResult::new("hello").execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(ctx.response().body().as_ref(), b"hello");
        assert_eq!(
            ctx.response().headers().get(CONTENT_TYPE).unwrap(),
            TEXT_CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_json_result_with_status() {
        let mut ctx = context();
        JsonResult::new(json!({"id": 3}))
            .status(StatusCode::CREATED)
            .execute(&mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.response().status(), StatusCode::CREATED);
        assert_eq!(ctx.response().body().as_ref(), br#"{"id":3}"#);
    }

    #[tokio::test]
    async fn test_null_object_is_no_content() {
        let mut ctx = context();
        ObjectResult::new(Value::Null).execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::NO_CONTENT);
        assert!(ctx.response().body().is_empty());
    }

    #[tokio::test]
    async fn test_bad_request_from_model_state() {
        let mut state = ModelStateDictionary::new();
        state.add_model_error("Name", "The Name field is required.");
        let mut ctx = context();
        BadRequestObjectResult::from_model_state(&state)
            .execute(&mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.response().status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(ctx.response().body()).unwrap();
        assert_eq!(body, json!({"Name": ["The Name field is required."]}));
    }

    #[tokio::test]
    async fn test_unsupported_media_type() {
        let mut ctx = context();
        let result: BoxedResult = Box::new(UnsupportedMediaTypeResult);
        result.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
