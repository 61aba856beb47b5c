//! Stage contexts handed to filters.
//!
//! The executing contexts borrow the request's [`ActionContext`] and
//! dereference to it. The executed contexts are values returned up the
//! around chains; errors travel in them instead of unwinding, so every
//! entered post-hook runs.

use crate::context::{ActionArguments, ActionContext};
use crate::controller::ControllerInstance;
use crate::error::PipelineError;
use crate::results::{ActionResult, BoxedResult, EmptyResult};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

macro_rules! derefs_to_action_context {
    ($($context:ident),* $(,)?) => {
        $(
            impl Deref for $context<'_> {
                type Target = ActionContext;

                fn deref(&self) -> &ActionContext {
                    &*self.action_context
                }
            }

            impl DerefMut for $context<'_> {
                fn deref_mut(&mut self) -> &mut ActionContext {
                    &mut *self.action_context
                }
            }
        )*
    };
}

derefs_to_action_context!(
    AuthorizationFilterContext,
    ResourceExecutingContext,
    ActionExecutingContext,
    ExceptionContext,
    ResultExecutingContext,
);

macro_rules! executed_context {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name {
            result: Option<BoxedResult>,
            error: Option<PipelineError>,
            exception_handled: bool,
            canceled: bool,
            result_executed: bool,
        }

        #[allow(dead_code)]
        impl $name {
            pub(crate) fn completed(result: Option<BoxedResult>) -> Self {
                Self {
                    result,
                    ..Self::default()
                }
            }

            pub(crate) fn failed(error: PipelineError) -> Self {
                Self {
                    error: Some(error),
                    ..Self::default()
                }
            }

            pub(crate) fn short_circuited(result: Option<BoxedResult>) -> Self {
                Self {
                    result,
                    canceled: true,
                    ..Self::default()
                }
            }

            /// The result, if any.
            #[must_use]
            pub fn result(&self) -> Option<&dyn ActionResult> {
                self.result.as_deref()
            }

            /// Replaces the result.
            pub fn set_result(&mut self, result: impl ActionResult + 'static) {
                self.result = Some(Box::new(result));
            }

            /// Removes the result.
            pub fn take_result(&mut self) -> Option<BoxedResult> {
                self.result.take()
            }

            /// The error raised further in, if any.
            #[must_use]
            pub fn error(&self) -> Option<&PipelineError> {
                self.error.as_ref()
            }

            /// Removes the error.
            pub fn take_error(&mut self) -> Option<PipelineError> {
                self.error.take()
            }

            /// Returns `true` if a filter marked the error handled.
            #[must_use]
            pub fn exception_handled(&self) -> bool {
                self.exception_handled
            }

            /// Marks the error handled so it does not propagate.
            pub fn mark_exception_handled(&mut self) {
                self.exception_handled = true;
            }

            /// Marks the error handled and replaces the result.
            pub fn handle(&mut self, result: impl ActionResult + 'static) {
                self.mark_exception_handled();
                self.set_result(result);
            }

            /// Returns `true` if a filter further in short-circuited.
            #[must_use]
            pub fn is_canceled(&self) -> bool {
                self.canceled
            }

            /// Returns `true` if an error remains that nobody handled.
            #[must_use]
            pub fn has_unhandled_error(&self) -> bool {
                self.error.is_some() && !self.exception_handled
            }

            pub(crate) fn pending_result(&self) -> Option<&dyn ActionResult> {
                if self.result_executed {
                    return None;
                }
                self.result.as_deref()
            }

            pub(crate) fn set_result_executed(&mut self) {
                self.result_executed = true;
            }

            pub(crate) fn into_parts(self) -> (Option<BoxedResult>, Option<PipelineError>, bool) {
                (self.result, self.error, self.exception_handled)
            }
        }
    };
}

executed_context!(
    /// What a resource filter sees after the rest of the pipeline ran.
    ResourceExecutedContext
);

executed_context!(
    /// What an action filter sees after the action (or an inner filter) ran.
    ActionExecutedContext
);

executed_context!(
    /// What a result filter sees after the result (or an inner filter) ran.
    ResultExecutedContext
);

/// Context of an authorization filter.
pub struct AuthorizationFilterContext<'c> {
    action_context: &'c mut ActionContext,
    result: Option<BoxedResult>,
}

impl<'c> AuthorizationFilterContext<'c> {
    pub(crate) fn new(action_context: &'c mut ActionContext) -> Self {
        Self {
            action_context,
            result: None,
        }
    }

    /// Short-circuits the pipeline with `result`.
    pub fn set_result(&mut self, result: impl ActionResult + 'static) {
        self.result = Some(Box::new(result));
    }

    /// The short-circuit result, if one was set.
    #[must_use]
    pub fn result(&self) -> Option<&dyn ActionResult> {
        self.result.as_deref()
    }

    pub(crate) fn take_result(&mut self) -> Option<BoxedResult> {
        self.result.take()
    }
}

/// Context of a resource filter before the rest of the pipeline runs.
pub struct ResourceExecutingContext<'c> {
    action_context: &'c mut ActionContext,
}

impl<'c> ResourceExecutingContext<'c> {
    pub(crate) fn new(action_context: &'c mut ActionContext) -> Self {
        Self { action_context }
    }

    /// Skips the rest of the pipeline; `result` is executed directly.
    pub fn short_circuit(&mut self, result: impl ActionResult + 'static) -> ResourceExecutedContext {
        ResourceExecutedContext::short_circuited(Some(Box::new(result)))
    }

    pub(crate) fn action_context(&mut self) -> &mut ActionContext {
        &mut *self.action_context
    }
}

/// Context of an action filter before the action runs.
pub struct ActionExecutingContext<'c> {
    action_context: &'c mut ActionContext,
    controller: ControllerInstance,
    arguments: ActionArguments,
}

impl<'c> ActionExecutingContext<'c> {
    pub(crate) fn new(
        action_context: &'c mut ActionContext,
        controller: ControllerInstance,
        arguments: ActionArguments,
    ) -> Self {
        Self {
            action_context,
            controller,
            arguments,
        }
    }

    /// The bound arguments.
    #[must_use]
    pub fn arguments(&self) -> &ActionArguments {
        &self.arguments
    }

    /// Mutable arguments; changes are seen by the action.
    pub fn arguments_mut(&mut self) -> &mut ActionArguments {
        &mut self.arguments
    }

    /// The controller instance.
    #[must_use]
    pub fn controller(&self) -> &ControllerInstance {
        &self.controller
    }

    /// The controller instance as `C`.
    #[must_use]
    pub fn controller_as<C: Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        Arc::clone(&self.controller).downcast::<C>().ok()
    }

    /// Skips the action; `result` proceeds to result execution.
    pub fn short_circuit(&mut self, result: impl ActionResult + 'static) -> ActionExecutedContext {
        ActionExecutedContext::short_circuited(Some(Box::new(result)))
    }

    pub(crate) fn action_context(&mut self) -> &mut ActionContext {
        &mut *self.action_context
    }
}

/// Context of an exception filter.
pub struct ExceptionContext<'c> {
    action_context: &'c mut ActionContext,
    error: PipelineError,
    handled: bool,
    result: Option<BoxedResult>,
}

impl<'c> ExceptionContext<'c> {
    pub(crate) fn new(action_context: &'c mut ActionContext, error: PipelineError) -> Self {
        Self {
            action_context,
            error,
            handled: false,
            result: None,
        }
    }

    /// The unhandled error.
    #[must_use]
    pub fn error(&self) -> &PipelineError {
        &self.error
    }

    /// Returns `true` once a filter handled the error.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Marks the error handled. Outer exception filters are skipped.
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    /// Sets the result executed if the error ends up handled.
    pub fn set_result(&mut self, result: impl ActionResult + 'static) {
        self.result = Some(Box::new(result));
    }

    /// Marks the error handled and sets the result.
    pub fn handle(&mut self, result: impl ActionResult + 'static) {
        self.mark_handled();
        self.set_result(result);
    }

    /// The result set by a filter, if any.
    #[must_use]
    pub fn result(&self) -> Option<&dyn ActionResult> {
        self.result.as_deref()
    }

    /// Handled errors yield their result (or an empty one).
    pub(crate) fn into_outcome(self) -> Result<BoxedResult, PipelineError> {
        if self.handled {
            Ok(self.result.unwrap_or_else(|| Box::new(EmptyResult)))
        } else {
            Err(self.error)
        }
    }
}

/// Context of a result filter before the result executes.
pub struct ResultExecutingContext<'c> {
    action_context: &'c mut ActionContext,
    result: BoxedResult,
}

impl<'c> ResultExecutingContext<'c> {
    pub(crate) fn new(action_context: &'c mut ActionContext, result: BoxedResult) -> Self {
        Self {
            action_context,
            result,
        }
    }

    /// The result about to execute.
    #[must_use]
    pub fn result(&self) -> &dyn ActionResult {
        self.result.as_ref()
    }

    /// Replaces the result about to execute.
    pub fn set_result(&mut self, result: impl ActionResult + 'static) {
        self.result = Box::new(result);
    }

    /// Skips result execution.
    pub fn cancel(&mut self) -> ResultExecutedContext {
        let result = std::mem::replace(&mut self.result, Box::new(EmptyResult));
        ResultExecutedContext::short_circuited(Some(result))
    }

    pub(crate) fn parts(&mut self) -> (&mut ActionContext, &BoxedResult) {
        (&mut *self.action_context, &self.result)
    }

    pub(crate) fn take_result(&mut self) -> BoxedResult {
        std::mem::replace(&mut self.result, Box::new(EmptyResult))
    }
}
