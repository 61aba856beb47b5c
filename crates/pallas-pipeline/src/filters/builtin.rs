//! Filters the framework registers globally, depending on configuration.

use super::{ActionExecutedContext, ActionExecutingContext, ActionFilter};
use crate::error::PipelineError;
use crate::invoker::ActionNext;
use crate::results::{BadRequestObjectResult, UnsupportedMediaTypeResult};
use pallas_core::{BoxFuture, ModelErrorKind};

/// Answers 415 when no input formatter could read the request body.
///
/// Runs before user action filters, so they never see the
/// unsupported-content-type error unless this filter is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedContentTypeFilter;

impl UnsupportedContentTypeFilter {
    /// Sort order of the filter.
    pub const ORDER: i32 = -3000;
}

impl ActionFilter for UnsupportedContentTypeFilter {
    fn on_action_execution<'a>(
        &'a self,
        context: &'a mut ActionExecutingContext<'_>,
        next: ActionNext<'a>,
    ) -> BoxFuture<'a, Result<ActionExecutedContext, PipelineError>> {
        Box::pin(async move {
            if context
                .model_state()
                .has_error_kind(ModelErrorKind::UnsupportedContentType)
            {
                tracing::debug!(
                    content_type = context.request().content_type().unwrap_or_default(),
                    "no input formatter for request body"
                );
                return Ok(context.short_circuit(UnsupportedMediaTypeResult));
            }
            Ok(next.run(context).await)
        })
    }

    fn order(&self) -> i32 {
        Self::ORDER
    }
}

/// Answers 400 with the model-state errors when binding or validation failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelStateInvalidFilter;

impl ModelStateInvalidFilter {
    /// Sort order of the filter.
    pub const ORDER: i32 = -2000;
}

impl ActionFilter for ModelStateInvalidFilter {
    fn on_action_execution<'a>(
        &'a self,
        context: &'a mut ActionExecutingContext<'_>,
        next: ActionNext<'a>,
    ) -> BoxFuture<'a, Result<ActionExecutedContext, PipelineError>> {
        Box::pin(async move {
            if !context.model_state().is_valid() {
                let result = BadRequestObjectResult::from_model_state(context.model_state());
                return Ok(context.short_circuit(result));
            }
            Ok(next.run(context).await)
        })
    }

    fn order(&self) -> i32 {
        Self::ORDER
    }
}
