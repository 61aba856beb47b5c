//! Input formatters: read a request body into a model.
//!
//! The body binder asks each registered formatter in order whether it can
//! read the request and uses the first one that can. Formatters record
//! malformed input in model state and report [`InputFormatterResult::Failure`];
//! an `Err` is reserved for formatters that cannot run at all.

use crate::error::BindingError;
use crate::request::RequestContext;
use pallas_core::{BoxFuture, ModelError, ModelErrorKind, ModelStateDictionary};
use pallas_metadata::{ModelMetadata, ScalarKind};
use serde_json::Value;
use std::fmt;

/// Default upper bound on the body size the JSON formatter reads.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// What a formatter sees.
pub struct InputFormatterContext<'a> {
    /// The request.
    pub request: &'a RequestContext,
    /// Model-state key of the body model.
    pub model_name: &'a str,
    /// Metadata of the body model.
    pub metadata: &'a ModelMetadata,
    /// Model state for read errors.
    pub model_state: &'a mut ModelStateDictionary,
}

impl InputFormatterContext<'_> {
    /// The parsed Content-Type of the request.
    #[must_use]
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.request.content_type()?.parse().ok()
    }

    fn add_error(&mut self, message: impl Into<String>) {
        self.model_state.try_add_error(
            self.model_name.to_string(),
            ModelError::with_kind(message, ModelErrorKind::InputFormat),
        );
    }
}

impl fmt::Debug for InputFormatterContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFormatterContext")
            .field("model_name", &self.model_name)
            .field("content_type", &self.request.content_type())
            .finish_non_exhaustive()
    }
}

/// Outcome of reading a body.
#[derive(Debug, Clone, PartialEq)]
pub enum InputFormatterResult {
    /// The body was read into a model.
    Success(Value),
    /// The body was malformed; errors are in model state.
    Failure,
    /// The body was empty.
    NoValue,
}

/// Reads request bodies of some media types.
pub trait InputFormatter: Send + Sync + fmt::Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether this formatter can read the request into the model.
    fn can_read(&self, context: &InputFormatterContext<'_>) -> bool;

    /// Reads the body.
    fn read<'a>(
        &'a self,
        context: &'a mut InputFormatterContext<'_>,
    ) -> BoxFuture<'a, Result<InputFormatterResult, BindingError>>;
}

/// Reads JSON bodies: `application/json`, `text/json` and `application/*+json`.
///
/// The body is parsed with `serde_json` and normalized through the declared
/// type, so a body that does not fit the type (`true` for an `i32`) is a
/// read failure, and missing members take the type's defaults.
#[derive(Debug, Clone)]
pub struct JsonInputFormatter {
    max_body_size: usize,
}

impl Default for JsonInputFormatter {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl JsonInputFormatter {
    /// Creates a formatter with the default size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum body size in bytes.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    fn is_json(content_type: &mime::Mime) -> bool {
        let subtype = content_type.subtype().as_str();
        match content_type.type_().as_str() {
            "application" => {
                subtype == "json" || content_type.suffix().is_some_and(|s| s.as_str() == "json")
            }
            "text" => subtype == "json",
            _ => false,
        }
    }

    fn read_body(&self, context: &mut InputFormatterContext<'_>) -> InputFormatterResult {
        let request = context.request;
        let body = request.body();
        if body.iter().all(u8::is_ascii_whitespace) {
            return InputFormatterResult::NoValue;
        }
        if body.len() > self.max_body_size {
            context.add_error(format!(
                "The request body exceeds the maximum size of {} bytes.",
                self.max_body_size
            ));
            return InputFormatterResult::Failure;
        }

        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, model = context.model_name, "malformed JSON body");
                context.add_error(e.to_string());
                return InputFormatterResult::Failure;
            }
        };

        match context.metadata.model_type().decode(value) {
            Ok(model) => InputFormatterResult::Success(model),
            Err(message) => {
                tracing::debug!(
                    error = %message,
                    model_type = context.metadata.model_type().name(),
                    "JSON body does not fit the model type"
                );
                context.add_error(message);
                InputFormatterResult::Failure
            }
        }
    }
}

impl InputFormatter for JsonInputFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn can_read(&self, context: &InputFormatterContext<'_>) -> bool {
        context
            .content_type()
            .is_some_and(|content_type| Self::is_json(&content_type))
    }

    fn read<'a>(
        &'a self,
        context: &'a mut InputFormatterContext<'_>,
    ) -> BoxFuture<'a, Result<InputFormatterResult, BindingError>> {
        Box::pin(async move { Ok(self.read_body(context)) })
    }
}

/// Reads `text/plain` bodies into string models.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextInputFormatter;

impl InputFormatter for PlainTextInputFormatter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn can_read(&self, context: &InputFormatterContext<'_>) -> bool {
        let is_text = context.content_type().is_some_and(|content_type| {
            content_type.type_() == mime::TEXT && content_type.subtype() == mime::PLAIN
        });
        is_text && context.metadata.model_type().scalar() == Some(ScalarKind::String)
    }

    fn read<'a>(
        &'a self,
        context: &'a mut InputFormatterContext<'_>,
    ) -> BoxFuture<'a, Result<InputFormatterResult, BindingError>> {
        Box::pin(async move {
            let request = context.request;
            let body = request.body();
            if body.is_empty() {
                return Ok(InputFormatterResult::NoValue);
            }
            match std::str::from_utf8(body) {
                Ok(text) => Ok(InputFormatterResult::Success(Value::String(text.to_string()))),
                Err(e) => {
                    context.add_error(e.to_string());
                    Ok(InputFormatterResult::Failure)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pallas_metadata::{DefaultModelMetadataProvider, ModelMetadataProvider, Reflect};

    fn context_parts(content_type: &str, body: &'static str) -> RequestContext {
        RequestContext::builder()
            .header("content-type", content_type)
            .body(body)
            .build()
    }

    #[tokio::test]
    async fn test_json_reads_value_types() {
        let provider = DefaultModelMetadataProvider::with_defaults();
        let metadata = provider.get_metadata_for_type(&i32::type_info());
        let request = context_parts("application/json; charset=utf-8", "1773");
        let mut state = ModelStateDictionary::new();
        let mut context = InputFormatterContext {
            request: &request,
            model_name: "",
            metadata: &metadata,
            model_state: &mut state,
        };

        let formatter = JsonInputFormatter::new();
        assert!(formatter.can_read(&context));
        let result = formatter.read(&mut context).await.unwrap();
        assert_eq!(result, InputFormatterResult::Success(serde_json::json!(1773)));
        assert!(state.is_valid());
    }

    #[tokio::test]
    async fn test_json_type_mismatch_is_failure() {
        let provider = DefaultModelMetadataProvider::with_defaults();
        let metadata = provider.get_metadata_for_type(&i32::type_info());
        let request = context_parts("application/json", "true");
        let mut state = ModelStateDictionary::new();
        let mut context = InputFormatterContext {
            request: &request,
            model_name: "value",
            metadata: &metadata,
            model_state: &mut state,
        };

        let result = JsonInputFormatter::new().read(&mut context).await.unwrap();
        assert_eq!(result, InputFormatterResult::Failure);
        assert!(state.has_error_kind(ModelErrorKind::InputFormat));
        assert_eq!(state.get("value").unwrap().errors.len(), 1);
    }

    #[tokio::test]
    async fn test_json_empty_body_has_no_value() {
        let provider = DefaultModelMetadataProvider::with_defaults();
        let metadata = provider.get_metadata_for_type(&i32::type_info());
        let request = context_parts("application/json", "  ");
        let mut state = ModelStateDictionary::new();
        let mut context = InputFormatterContext {
            request: &request,
            model_name: "",
            metadata: &metadata,
            model_state: &mut state,
        };

        let result = JsonInputFormatter::new().read(&mut context).await.unwrap();
        assert_eq!(result, InputFormatterResult::NoValue);
    }

    #[tokio::test]
    async fn test_json_size_limit() {
        let provider = DefaultModelMetadataProvider::with_defaults();
        let metadata = provider.get_metadata_for_type(&String::type_info());
        let request = context_parts("application/json", "\"0123456789\"");
        let mut state = ModelStateDictionary::new();
        let mut context = InputFormatterContext {
            request: &request,
            model_name: "",
            metadata: &metadata,
            model_state: &mut state,
        };

        let result = JsonInputFormatter::new()
            .max_body_size(4)
            .read(&mut context)
            .await
            .unwrap();
        assert_eq!(result, InputFormatterResult::Failure);
        assert!(!state.is_valid());
    }

    #[test]
    fn test_json_media_types() {
        for (content_type, expected) in [
            ("application/json", true),
            ("text/json", true),
            ("application/problem+json", true),
            ("application/xml", false),
            ("image/png", false),
        ] {
            let parsed: mime::Mime = content_type.parse().unwrap();
            assert_eq!(JsonInputFormatter::is_json(&parsed), expected, "{content_type}");
        }
    }

    #[tokio::test]
    async fn test_plain_text_only_for_strings() {
        let provider = DefaultModelMetadataProvider::with_defaults();
        let string = provider.get_metadata_for_type(&String::type_info());
        let int = provider.get_metadata_for_type(&i32::type_info());
        let request = context_parts("text/plain; charset=utf-8", "Test Content");
        let mut state = ModelStateDictionary::new();

        let int_context = InputFormatterContext {
            request: &request,
            model_name: "",
            metadata: &int,
            model_state: &mut state,
        };
        assert!(!PlainTextInputFormatter.can_read(&int_context));

        let mut context = InputFormatterContext {
            request: &request,
            model_name: "",
            metadata: &string,
            model_state: &mut state,
        };
        assert!(PlainTextInputFormatter.can_read(&context));
        let result = PlainTextInputFormatter.read(&mut context).await.unwrap();
        assert_eq!(result, InputFormatterResult::Success(Value::from("Test Content")));
    }
}
