//! Binding from the request body through input formatters.

use super::ModelBinder;
use crate::context::{BoundModel, ModelBindingContext, ModelBindingResult};
use crate::error::BindingError;
use crate::formatters::{InputFormatter, InputFormatterContext, InputFormatterResult};
use pallas_core::{BoxFuture, ModelError, ModelErrorKind};
use std::sync::Arc;

/// Binds a model from the body with the first formatter that can read it.
///
/// When no formatter can read the request, an unsupported-content-type
/// error is recorded for the model and binding carries on.
#[derive(Debug, Clone)]
pub struct BodyModelBinder {
    formatters: Arc<[Arc<dyn InputFormatter>]>,
    allow_empty_body: bool,
}

impl BodyModelBinder {
    /// Creates a binder over `formatters`, consulted in order.
    #[must_use]
    pub fn new(formatters: Arc<[Arc<dyn InputFormatter>]>) -> Self {
        Self {
            formatters,
            allow_empty_body: false,
        }
    }

    /// Binds an empty body as the type default instead of recording an error.
    #[must_use]
    pub fn allow_empty_body(mut self, allow: bool) -> Self {
        self.allow_empty_body = allow;
        self
    }
}

impl ModelBinder for BodyModelBinder {
    fn bind_model<'a>(
        &'a self,
        context: &'a mut ModelBindingContext<'_>,
    ) -> BoxFuture<'a, Result<(), BindingError>> {
        Box::pin(async move {
            // Top-level bodies report under the binder model name or the empty key.
            let key = if context.is_top_level() {
                context.binder_model_name().unwrap_or_default().to_string()
            } else {
                context.model_name().to_string()
            };
            let request = context.request();
            let messages = context.messages();
            let metadata = context.metadata().clone();

            let outcome = {
                let mut formatter_context = InputFormatterContext {
                    request,
                    model_name: &key,
                    metadata: &metadata,
                    model_state: context.model_state(),
                };
                let formatter = self
                    .formatters
                    .iter()
                    .find(|formatter| formatter.can_read(&formatter_context));
                match formatter {
                    Some(formatter) => {
                        tracing::debug!(formatter = formatter.name(), key = %key, "reading request body");
                        Some(formatter.read(&mut formatter_context).await?)
                    }
                    None => None,
                }
            };

            match outcome {
                None => {
                    let content_type = request.content_type().unwrap_or_default();
                    tracing::debug!(content_type, "no input formatter for request");
                    context.model_state().try_add_error(
                        key,
                        ModelError::with_kind(
                            messages.unsupported_content_type(content_type),
                            ModelErrorKind::UnsupportedContentType,
                        ),
                    );
                }
                Some(InputFormatterResult::Success(model)) => {
                    context.set_result(ModelBindingResult::success(BoundModel::Value(model)));
                }
                Some(InputFormatterResult::Failure) => {}
                Some(InputFormatterResult::NoValue) if self.allow_empty_body => {
                    let model = metadata.model_type().default_value();
                    context.set_result(ModelBindingResult::success(BoundModel::Value(model)));
                }
                Some(InputFormatterResult::NoValue) => {
                    context
                        .model_state()
                        .add_model_error(key, messages.missing_request_body_required_value());
                }
            }
            Ok(())
        })
    }
}
