//! Filter contracts and filter metadata.
//!
//! Five filter kinds run around an action, outermost first:
//!
//! 1. [`AuthorizationFilter`] - may short-circuit with a result
//! 2. [`ResourceFilter`] - wraps binding, the action and result execution
//! 3. [`ActionFilter`] - wraps the action method
//! 4. [`ExceptionFilter`] - sees unhandled errors from binding and the action
//! 5. [`ResultFilter`] - wraps result execution
//!
//! Resource, action and result filters are "around" filters: they receive a
//! `Next` and decide whether to call it. Code after `next.run(..).await` is
//! the post-hook, and post-hooks unwind in exact reverse of the pre-hooks.
//!
//! # Example
//!
//! ```
//! use pallas_core::BoxFuture;
//! use pallas_pipeline::filters::{ActionExecutedContext, ActionExecutingContext, ActionFilter};
//! use pallas_pipeline::{ActionNext, PipelineError, StatusCodeResult};
//!
//! struct RequireJson;
//!
//! impl ActionFilter for RequireJson {
//!     fn on_action_execution<'a>(
//!         &'a self,
//!         context: &'a mut ActionExecutingContext<'_>,
//!         next: ActionNext<'a>,
//!     ) -> BoxFuture<'a, Result<ActionExecutedContext, PipelineError>> {
//!         Box::pin(async move {
//!             if context.request().content_type().is_none() {
//!                 let status = StatusCodeResult(http::StatusCode::UNSUPPORTED_MEDIA_TYPE);
//!                 return Ok(context.short_circuit(status));
//!             }
//!             Ok(next.run(context).await)
//!         })
//!     }
//! }
//! ```

mod builtin;
mod context;

pub use builtin::{ModelStateInvalidFilter, UnsupportedContentTypeFilter};
pub use context::{
    ActionExecutedContext, ActionExecutingContext, AuthorizationFilterContext, ExceptionContext,
    ResourceExecutedContext, ResourceExecutingContext, ResultExecutedContext,
    ResultExecutingContext,
};

use crate::error::PipelineError;
use crate::invoker::{ActionNext, ResourceNext, ResultNext};
use pallas_core::{BoxFuture, Services};
use std::fmt;
use std::sync::Arc;

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

/// Runs first and may refuse the request by setting a result.
pub trait AuthorizationFilter: Send + Sync {
    /// Inspects the request; setting a result short-circuits the pipeline.
    fn on_authorization<'a>(
        &'a self,
        context: &'a mut AuthorizationFilterContext<'_>,
    ) -> BoxFuture<'a, Result<(), PipelineError>>;

    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Sort order; lower runs first.
    fn order(&self) -> i32 {
        0
    }
}

/// Wraps everything after authorization, including result execution.
pub trait ResourceFilter: Send + Sync {
    /// Runs around the rest of the pipeline.
    ///
    /// Return [`ResourceExecutingContext::short_circuit`] to skip it.
    fn on_resource_execution<'a>(
        &'a self,
        context: &'a mut ResourceExecutingContext<'_>,
        next: ResourceNext<'a>,
    ) -> BoxFuture<'a, Result<ResourceExecutedContext, PipelineError>>;

    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Sort order; lower runs first.
    fn order(&self) -> i32 {
        0
    }
}

/// Wraps the action method, after model binding.
pub trait ActionFilter: Send + Sync {
    /// Runs around the action method.
    ///
    /// Return [`ActionExecutingContext::short_circuit`] to skip it.
    fn on_action_execution<'a>(
        &'a self,
        context: &'a mut ActionExecutingContext<'_>,
        next: ActionNext<'a>,
    ) -> BoxFuture<'a, Result<ActionExecutedContext, PipelineError>>;

    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Sort order; lower runs first.
    fn order(&self) -> i32 {
        0
    }
}

/// Sees errors raised by model binding, action filters or the action.
///
/// Exception filters run innermost first and stop at the first one that
/// marks the error handled.
pub trait ExceptionFilter: Send + Sync {
    /// Inspects, and possibly handles, an error.
    fn on_exception<'a>(
        &'a self,
        context: &'a mut ExceptionContext<'_>,
    ) -> BoxFuture<'a, Result<(), PipelineError>>;

    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Sort order; lower runs first.
    fn order(&self) -> i32 {
        0
    }
}

/// Wraps result execution.
pub trait ResultFilter: Send + Sync {
    /// Runs around result execution. May replace the result or cancel it.
    fn on_result_execution<'a>(
        &'a self,
        context: &'a mut ResultExecutingContext<'_>,
        next: ResultNext<'a>,
    ) -> BoxFuture<'a, Result<ResultExecutedContext, PipelineError>>;

    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Sort order; lower runs first.
    fn order(&self) -> i32 {
        0
    }
}

/// Creates filter instances per request from the request's services.
pub trait FilterFactory: Send + Sync {
    /// Creates a filter. Must not return another factory.
    fn create_instance(&self, services: &Services) -> Result<FilterMetadata, PipelineError>;

    /// Whether one instance may serve every request of an action.
    fn is_reusable(&self) -> bool {
        false
    }

    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Sort order; lower runs first.
    fn order(&self) -> i32 {
        0
    }
}

/// A filter registered on an action, controller or globally.
#[derive(Clone)]
pub enum FilterMetadata {
    /// An authorization filter.
    Authorization(Arc<dyn AuthorizationFilter>),
    /// A resource filter.
    Resource(Arc<dyn ResourceFilter>),
    /// An action filter.
    Action(Arc<dyn ActionFilter>),
    /// An exception filter.
    Exception(Arc<dyn ExceptionFilter>),
    /// A result filter.
    Result(Arc<dyn ResultFilter>),
    /// A factory creating one of the above per request.
    Factory(Arc<dyn FilterFactory>),
}

impl FilterMetadata {
    /// Wraps an authorization filter.
    pub fn authorization(filter: impl AuthorizationFilter + 'static) -> Self {
        Self::Authorization(Arc::new(filter))
    }

    /// Wraps a resource filter.
    pub fn resource(filter: impl ResourceFilter + 'static) -> Self {
        Self::Resource(Arc::new(filter))
    }

    /// Wraps an action filter.
    pub fn action(filter: impl ActionFilter + 'static) -> Self {
        Self::Action(Arc::new(filter))
    }

    /// Wraps an exception filter.
    pub fn exception(filter: impl ExceptionFilter + 'static) -> Self {
        Self::Exception(Arc::new(filter))
    }

    /// Wraps a result filter.
    pub fn result(filter: impl ResultFilter + 'static) -> Self {
        Self::Result(Arc::new(filter))
    }

    /// Wraps a filter factory.
    pub fn factory(factory: impl FilterFactory + 'static) -> Self {
        Self::Factory(Arc::new(factory))
    }

    /// The filter's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authorization(filter) => filter.name(),
            Self::Resource(filter) => filter.name(),
            Self::Action(filter) => filter.name(),
            Self::Exception(filter) => filter.name(),
            Self::Result(filter) => filter.name(),
            Self::Factory(factory) => factory.name(),
        }
    }

    /// The filter's intrinsic order.
    #[must_use]
    pub fn order(&self) -> i32 {
        match self {
            Self::Authorization(filter) => filter.order(),
            Self::Resource(filter) => filter.order(),
            Self::Action(filter) => filter.order(),
            Self::Exception(filter) => filter.order(),
            Self::Result(filter) => filter.order(),
            Self::Factory(factory) => factory.order(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Authorization(_) => "authorization",
            Self::Resource(_) => "resource",
            Self::Action(_) => "action",
            Self::Exception(_) => "exception",
            Self::Result(_) => "result",
            Self::Factory(_) => "factory",
        }
    }
}

impl fmt::Debug for FilterMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterMetadata")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

/// Where a filter was registered. Breaks ties between equal orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterScope {
    /// Registered for every action.
    Global = 10,
    /// Registered on a controller.
    Controller = 20,
    /// Registered on an action.
    Action = 30,
}

/// A filter with its effective order and scope.
#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    /// The filter.
    pub filter: FilterMetadata,
    /// Sort order; lower runs first.
    pub order: i32,
    /// Registration scope.
    pub scope: FilterScope,
}

impl FilterDescriptor {
    /// Describes a filter, taking its order from the filter itself.
    #[must_use]
    pub fn new(filter: FilterMetadata, scope: FilterScope) -> Self {
        let order = filter.order();
        Self {
            filter,
            order,
            scope,
        }
    }

    /// Overrides the order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

/// Sorts filters by `(order, scope)`, keeping registration order for ties.
pub fn sort_filters(filters: &mut [FilterDescriptor]) {
    filters.sort_by_key(|descriptor| (descriptor.order, descriptor.scope));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::StatusCodeResult;
    use http::StatusCode;

    struct Deny;

    impl AuthorizationFilter for Deny {
        fn on_authorization<'a>(
            &'a self,
            context: &'a mut AuthorizationFilterContext<'_>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                context.set_result(StatusCodeResult(StatusCode::FORBIDDEN));
                Ok(())
            })
        }

        fn order(&self) -> i32 {
            -5
        }
    }

    struct Noop(&'static str);

    impl ExceptionFilter for Noop {
        fn on_exception<'a>(
            &'a self,
            _context: &'a mut ExceptionContext<'_>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async { Ok(()) })
        }

        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_names_and_orders() {
        let deny = FilterMetadata::authorization(Deny);
        assert_eq!(deny.name(), "Deny");
        assert_eq!(FilterDescriptor::new(deny, FilterScope::Action).order, -5);

        let noop = FilterMetadata::exception(Noop("audit"));
        assert_eq!(noop.name(), "audit");
        assert!(format!("{noop:?}").contains("exception"));
    }

    #[test]
    fn test_sort_by_order_then_scope_stable() {
        let named = |name, scope| FilterDescriptor::new(FilterMetadata::exception(Noop(name)), scope);
        let mut filters = vec![
            named("action", FilterScope::Action),
            named("global-1", FilterScope::Global),
            named("controller", FilterScope::Controller),
            named("early", FilterScope::Action).with_order(-10),
            named("global-2", FilterScope::Global),
        ];
        sort_filters(&mut filters);

        let names: Vec<_> = filters.iter().map(|f| f.filter.name()).collect();
        assert_eq!(
            names,
            ["early", "global-1", "global-2", "controller", "action"]
        );
    }
}
