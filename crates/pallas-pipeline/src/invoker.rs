//! Action invocation.
//!
//! [`Pipeline`] holds what every action shares (parameter binder, controller
//! activator, diagnostics). [`Pipeline::invoker`] compiles one
//! [`ActionInvoker`] per action, which runs the stages in a fixed order:
//!
//! 1. **Authorization** - filters in order; a result short-circuits
//! 2. **Resource** - around filters wrapping everything below
//! 3. **Model binding** - parameters bound and validated into model state
//! 4. **Action** - around filters wrapping the action method
//! 5. **Exception** - errors from 3 and 4, innermost filter first
//! 6. **Result** - around filters wrapping result execution
//!
//! Errors raised inside an around chain travel outward inside the executed
//! contexts, so every post-hook that was entered also runs.

use crate::context::{ActionArguments, ActionContext};
use crate::controller::{ControllerActivator, DefaultControllerActivator};
use crate::descriptor::{ActionDescriptor, SharedModelState};
use crate::diagnostics::{
    events, DiagnosticEvent, DiagnosticListener, Diagnostics, EventDetail, PipelineStage,
};
use crate::error::PipelineError;
use crate::filters::{
    sort_filters, ActionExecutedContext, ActionExecutingContext, ActionFilter,
    AuthorizationFilter, AuthorizationFilterContext, ExceptionContext, ExceptionFilter,
    FilterDescriptor, FilterMetadata, ResourceExecutedContext, ResourceExecutingContext,
    ResourceFilter, ResultExecutedContext, ResultExecutingContext, ResultFilter,
};
use crate::results::{ActionResult, BoxedResult, EmptyResult};
use futures_util::FutureExt;
use pallas_binding::{CompositeValueProvider, ParameterBinder};
use pallas_core::{BoxFuture, Services};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

struct PipelineInner {
    parameter_binder: ParameterBinder,
    activator: Arc<dyn ControllerActivator>,
    diagnostics: Diagnostics,
}

/// Services shared by every action invoker.
///
/// # Example
///
/// ```
/// use pallas_binding::{ModelBinderFactory, ParameterBinder};
/// use pallas_metadata::DefaultModelMetadataProvider;
/// use pallas_pipeline::Pipeline;
/// use pallas_validation::{validator_providers, ValidatorCache};
/// use std::sync::Arc;
///
/// let (details, validators) = validator_providers();
/// let metadata = DefaultModelMetadataProvider::new(Arc::new(details));
/// let binder = ParameterBinder::new(
///     metadata,
///     Arc::new(ModelBinderFactory::new()),
///     Arc::new(ValidatorCache::new(Arc::new(validators))),
/// );
///
/// let pipeline = Pipeline::builder(binder).build();
/// assert!(pipeline.diagnostics().is_empty());
/// ```
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Pipeline {
    /// Starts configuring a pipeline.
    #[must_use]
    pub fn builder(parameter_binder: ParameterBinder) -> PipelineBuilder {
        PipelineBuilder {
            parameter_binder,
            activator: Arc::new(DefaultControllerActivator),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Compiles the invoker for one action.
    ///
    /// Filters are sorted by `(order, scope)` here, once.
    #[must_use]
    pub fn invoker(&self, descriptor: Arc<ActionDescriptor>) -> ActionInvoker {
        let mut filters = descriptor.filters.clone();
        sort_filters(&mut filters);
        let reusable = filters.iter().map(|_| OnceLock::new()).collect();
        ActionInvoker {
            descriptor,
            filters,
            reusable,
            pipeline: Arc::clone(&self.inner),
        }
    }

    /// The registered diagnostic listeners.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.inner.diagnostics
    }

    /// The parameter binder.
    #[must_use]
    pub fn parameter_binder(&self) -> &ParameterBinder {
        &self.inner.parameter_binder
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("parameter_binder", &self.inner.parameter_binder)
            .field("activator", &self.inner.activator)
            .field("diagnostics", &self.inner.diagnostics)
            .finish()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    parameter_binder: ParameterBinder,
    activator: Arc<dyn ControllerActivator>,
    diagnostics: Diagnostics,
}

impl PipelineBuilder {
    /// Replaces the controller activator.
    #[must_use]
    pub fn activator(mut self, activator: impl ControllerActivator + 'static) -> Self {
        self.activator = Arc::new(activator);
        self
    }

    /// Adds a diagnostic listener.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn DiagnosticListener>) -> Self {
        self.diagnostics.add(listener);
        self
    }

    /// Replaces the diagnostic listeners.
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            inner: Arc::new(PipelineInner {
                parameter_binder: self.parameter_binder,
                activator: self.activator,
                diagnostics: self.diagnostics,
            }),
        }
    }
}

/// Invokes one action. Created by [`Pipeline::invoker`], shared by every
/// request to the action.
pub struct ActionInvoker {
    descriptor: Arc<ActionDescriptor>,
    filters: Vec<FilterDescriptor>,
    reusable: Vec<OnceLock<FilterMetadata>>,
    pipeline: Arc<PipelineInner>,
}

impl ActionInvoker {
    /// The invoked action.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<ActionDescriptor> {
        &self.descriptor
    }

    /// Filters in execution order.
    #[must_use]
    pub fn filters(&self) -> &[FilterDescriptor] {
        &self.filters
    }

    /// Runs the pipeline for one request, writing to `context`'s response.
    ///
    /// Returns the errors no filter handled. Model-state errors are not
    /// errors here; they are visible in `context.model_state()`.
    pub async fn invoke(&self, context: &mut ActionContext) -> Result<(), PipelineError> {
        let started = Instant::now();
        tracing::debug!(
            action = %self.descriptor.display_name,
            request_id = %context.request_id(),
            "executing action"
        );
        self.emit(context, events::BEFORE_ACTION, PipelineStage::Action, None, || {
            EventDetail::None
        });

        let outcome = match self.resolve_filters(context.services()) {
            Ok(filters) => {
                Invocation {
                    invoker: self,
                    filters,
                }
                .run(context)
                .await
            }
            Err(error) => Err(error),
        };

        let elapsed = started.elapsed();
        match &outcome {
            Ok(()) => {
                let status = context.response().status().as_u16();
                tracing::debug!(
                    action = %self.descriptor.display_name,
                    status,
                    elapsed_ms = elapsed.as_millis(),
                    "executed action"
                );
                self.emit(context, events::AFTER_ACTION, PipelineStage::Action, None, || {
                    EventDetail::Finished { status, elapsed }
                });
            }
            Err(error) => {
                tracing::error!(
                    action = %self.descriptor.display_name,
                    request_id = %context.request_id(),
                    error = %error,
                    "unhandled error while executing action"
                );
                self.emit(context, events::AFTER_ACTION, PipelineStage::Action, None, || {
                    EventDetail::Unhandled {
                        error: error.to_string(),
                        elapsed,
                    }
                });
            }
        }
        outcome
    }

    fn resolve_filters(&self, services: &Services) -> Result<RequestFilters, PipelineError> {
        let mut filters = RequestFilters::default();
        for (descriptor, cell) in self.filters.iter().zip(&self.reusable) {
            let filter = match &descriptor.filter {
                FilterMetadata::Factory(factory) if factory.is_reusable() => {
                    if let Some(filter) = cell.get() {
                        filter.clone()
                    } else {
                        let created = factory.create_instance(services)?;
                        cell.get_or_init(|| created).clone()
                    }
                }
                FilterMetadata::Factory(factory) => factory.create_instance(services)?,
                filter => filter.clone(),
            };
            filters.push(filter)?;
        }
        Ok(filters)
    }

    fn emit(
        &self,
        context: &ActionContext,
        name: &'static str,
        stage: PipelineStage,
        filter: Option<&str>,
        detail: impl FnOnce() -> EventDetail,
    ) {
        self.pipeline.diagnostics.emit(name, || DiagnosticEvent {
            name,
            stage,
            action: &self.descriptor,
            request_id: context.request_id(),
            filter,
            detail: detail(),
        });
    }
}

impl std::fmt::Debug for ActionInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionInvoker")
            .field("action", &self.descriptor.display_name)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct RequestFilters {
    authorization: Vec<Arc<dyn AuthorizationFilter>>,
    resource: Vec<Arc<dyn ResourceFilter>>,
    action: Vec<Arc<dyn ActionFilter>>,
    exception: Vec<Arc<dyn ExceptionFilter>>,
    result: Vec<Arc<dyn ResultFilter>>,
}

impl RequestFilters {
    fn push(&mut self, filter: FilterMetadata) -> Result<(), PipelineError> {
        match filter {
            FilterMetadata::Authorization(filter) => self.authorization.push(filter),
            FilterMetadata::Resource(filter) => self.resource.push(filter),
            FilterMetadata::Action(filter) => self.action.push(filter),
            FilterMetadata::Exception(filter) => self.exception.push(filter),
            FilterMetadata::Result(filter) => self.result.push(filter),
            FilterMetadata::Factory(factory) => {
                return Err(PipelineError::configuration(format!(
                    "The filter factory '{}' created another filter factory.",
                    factory.name()
                )));
            }
        }
        Ok(())
    }
}

fn outcome_detail(canceled: bool, error: Option<&PipelineError>, handled: bool) -> EventDetail {
    match error {
        Some(_) if handled => EventDetail::Handled,
        Some(error) => EventDetail::Failed {
            error: error.to_string(),
        },
        None if canceled => EventDetail::ShortCircuited,
        None => EventDetail::None,
    }
}

fn result_detail(outcome: &Result<(), PipelineError>) -> EventDetail {
    match outcome {
        Ok(()) => EventDetail::None,
        Err(error) => EventDetail::Failed {
            error: error.to_string(),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// One request's run through an invoker's filters.
struct Invocation<'i> {
    invoker: &'i ActionInvoker,
    filters: RequestFilters,
}

impl Invocation<'_> {
    fn emit(
        &self,
        context: &ActionContext,
        name: &'static str,
        stage: PipelineStage,
        filter: Option<&str>,
        detail: impl FnOnce() -> EventDetail,
    ) {
        self.invoker.emit(context, name, stage, filter, detail);
    }

    async fn run(&self, context: &mut ActionContext) -> Result<(), PipelineError> {
        for filter in &self.filters.authorization {
            let name = filter.name();
            self.emit(
                context,
                events::BEFORE_ON_AUTHORIZATION,
                PipelineStage::Authorization,
                Some(name),
                || EventDetail::None,
            );
            let mut authorization = AuthorizationFilterContext::new(context);
            let outcome = filter.on_authorization(&mut authorization).await;
            let short_circuit = authorization.take_result();

            if let Err(error) = outcome {
                tracing::warn!(filter = name, error = %error, "authorization filter failed");
                self.emit(
                    context,
                    events::AFTER_ON_AUTHORIZATION,
                    PipelineStage::Authorization,
                    Some(name),
                    || outcome_detail(false, Some(&error), false),
                );
                return Err(error);
            }
            let short_circuited = short_circuit.is_some();
            self.emit(
                context,
                events::AFTER_ON_AUTHORIZATION,
                PipelineStage::Authorization,
                Some(name),
                || outcome_detail(short_circuited, None, false),
            );
            if let Some(result) = short_circuit {
                tracing::debug!(filter = name, "authorization filter short-circuited the pipeline");
                return self.execute_result(context, result.as_ref()).await;
            }
        }

        let executed = {
            let mut resource = ResourceExecutingContext::new(context);
            ResourceNext {
                invocation: self,
                index: 0,
            }
            .run(&mut resource)
            .await
        };

        if executed.has_unhandled_error() {
            let (_, error, _) = executed.into_parts();
            return match error {
                Some(error) => Err(error),
                None => Ok(()),
            };
        }
        if let Some(error) = executed.error() {
            tracing::debug!(error = %error, "resource filter handled error");
        }
        match executed.pending_result() {
            Some(result) => self.execute_result(context, result).await,
            None => Ok(()),
        }
    }

    /// Binding, action filters, the action and exception filters, then the
    /// result stage. Runs inside the innermost resource filter.
    async fn resource_inside(&self, context: &mut ActionContext) -> ResourceExecutedContext {
        let result = match self.invoke_action_stage(context).await {
            Ok(result) => result,
            Err(error) => return ResourceExecutedContext::failed(error),
        };

        let executed = self.invoke_result_stage(context, result).await;
        let unhandled = executed.has_unhandled_error();
        let (result, error, _) = executed.into_parts();
        match error {
            Some(error) if unhandled => ResourceExecutedContext::failed(error),
            _ => {
                let mut executed = ResourceExecutedContext::completed(result);
                executed.set_result_executed();
                executed
            }
        }
    }

    async fn invoke_action_stage(
        &self,
        context: &mut ActionContext,
    ) -> Result<BoxedResult, PipelineError> {
        let executed = self.invoke_action_chain(context).await;
        let unhandled = executed.has_unhandled_error();
        let (result, error, _) = executed.into_parts();
        match error {
            Some(error) if unhandled => self.invoke_exception_filters(context, error).await,
            Some(error) => {
                tracing::debug!(error = %error, "action filter handled error");
                Ok(result.unwrap_or_else(|| Box::new(EmptyResult)))
            }
            None => Ok(result.unwrap_or_else(|| Box::new(EmptyResult))),
        }
    }

    async fn invoke_action_chain(&self, context: &mut ActionContext) -> ActionExecutedContext {
        let activator = &self.invoker.pipeline.activator;
        let controller = match activator.create(context, &self.invoker.descriptor.controller_type)
        {
            Ok(controller) => controller,
            Err(error) => return ActionExecutedContext::failed(error),
        };

        let arguments = match self.bind_arguments(context).await {
            Ok(arguments) => arguments,
            Err(error) => {
                activator.release(context, controller);
                return ActionExecutedContext::failed(error);
            }
        };

        let executed = {
            let mut executing =
                ActionExecutingContext::new(context, Arc::clone(&controller), arguments);
            ActionNext {
                invocation: self,
                index: 0,
            }
            .run(&mut executing)
            .await
        };
        activator.release(context, controller);
        executed
    }

    async fn bind_arguments(
        &self,
        context: &mut ActionContext,
    ) -> Result<ActionArguments, PipelineError> {
        if context.is_canceled() {
            return Err(PipelineError::canceled("model binding"));
        }
        self.emit(
            context,
            events::BEFORE_MODEL_BINDING,
            PipelineStage::ModelBinding,
            None,
            || EventDetail::None,
        );

        let binder = &self.invoker.pipeline.parameter_binder;
        let cancellation = context.cancellation().clone();
        let value_provider = CompositeValueProvider::for_request(context.request());
        let mut arguments = ActionArguments::new();

        for parameter in &self.invoker.descriptor.parameters {
            let (request, model_state) = context.binding_parts();
            let mut bound = tokio::select! {
                biased;
                () = cancellation.cancelled() => {
                    return Err(PipelineError::canceled("model binding"));
                }
                bound = binder.bind_model(request, model_state, &value_provider, parameter) => bound?,
            };
            if let Some(model) = bound.take() {
                arguments.insert(parameter.name.clone(), model);
            }
        }

        let valid = context.model_state().is_valid();
        tracing::debug!(
            action = %self.invoker.descriptor.display_name,
            bound = arguments.len(),
            valid,
            "bound action arguments"
        );
        self.emit(
            context,
            events::AFTER_MODEL_BINDING,
            PipelineStage::ModelBinding,
            None,
            || EventDetail::None,
        );
        Ok(arguments)
    }

    async fn invoke_action_method(
        &self,
        context: &mut ActionExecutingContext<'_>,
    ) -> ActionExecutedContext {
        let descriptor = &self.invoker.descriptor;
        if context.is_canceled() {
            return ActionExecutedContext::failed(PipelineError::canceled("action method"));
        }
        self.emit(
            context,
            events::BEFORE_ACTION_METHOD,
            PipelineStage::ActionMethod,
            None,
            || EventDetail::None,
        );

        let model_state = SharedModelState::new(context.model_state().clone());
        let pending = descriptor.method.invoke(
            Arc::clone(context.controller()),
            context.arguments().clone(),
            model_state.clone(),
            context.request_id(),
        );
        let cancellation = context.cancellation().clone();
        let outcome = tokio::select! {
            biased;
            () = cancellation.cancelled() => Err(PipelineError::canceled("action method")),
            finished = AssertUnwindSafe(pending).catch_unwind() => match finished {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(error)) => Err(PipelineError::action(&descriptor.display_name, error)),
                Err(payload) => Err(PipelineError::Panic {
                    action: descriptor.display_name.clone(),
                    message: panic_message(payload.as_ref()),
                }),
            },
        };

        *context.model_state_mut() = model_state.snapshot();

        self.emit(
            context,
            events::AFTER_ACTION_METHOD,
            PipelineStage::ActionMethod,
            None,
            || outcome_detail(false, outcome.as_ref().err(), false),
        );
        match outcome {
            Ok(result) => ActionExecutedContext::completed(Some(result)),
            Err(error) => {
                tracing::warn!(action = %descriptor.display_name, error = %error, "action method failed");
                ActionExecutedContext::failed(error)
            }
        }
    }

    async fn invoke_exception_filters(
        &self,
        context: &mut ActionContext,
        error: PipelineError,
    ) -> Result<BoxedResult, PipelineError> {
        let mut exception = ExceptionContext::new(context, error);
        for filter in self.filters.exception.iter().rev() {
            let name = filter.name();
            self.emit(
                &exception,
                events::BEFORE_ON_EXCEPTION,
                PipelineStage::Exception,
                Some(name),
                || EventDetail::None,
            );
            filter.on_exception(&mut exception).await?;
            let handled = exception.is_handled();
            self.emit(
                &exception,
                events::AFTER_ON_EXCEPTION,
                PipelineStage::Exception,
                Some(name),
                || {
                    if handled {
                        EventDetail::Handled
                    } else {
                        EventDetail::None
                    }
                },
            );
            if handled {
                tracing::debug!(filter = name, error = %exception.error(), "exception filter handled error");
                break;
            }
        }

        let outcome = exception.into_outcome();
        if let Err(error) = &outcome {
            tracing::warn!(error = %error, "no exception filter handled the error");
        }
        outcome
    }

    async fn invoke_result_stage(
        &self,
        context: &mut ActionContext,
        result: BoxedResult,
    ) -> ResultExecutedContext {
        let mut executing = ResultExecutingContext::new(context, result);
        ResultNext {
            invocation: self,
            index: 0,
        }
        .run(&mut executing)
        .await
    }

    async fn execute_result(
        &self,
        context: &mut ActionContext,
        result: &dyn ActionResult,
    ) -> Result<(), PipelineError> {
        if context.is_canceled() {
            return Err(PipelineError::canceled("result execution"));
        }
        self.emit(
            context,
            events::BEFORE_ACTION_RESULT,
            PipelineStage::ActionResult,
            None,
            || EventDetail::None,
        );
        let outcome = result.execute(context).await;
        self.emit(
            context,
            events::AFTER_ACTION_RESULT,
            PipelineStage::ActionResult,
            None,
            || result_detail(&outcome),
        );
        outcome
    }
}

/// The rest of the pipeline, as seen by a resource filter.
pub struct ResourceNext<'a> {
    invocation: &'a Invocation<'a>,
    index: usize,
}

impl<'a> ResourceNext<'a> {
    /// Runs the remaining resource filters, then binding, the action and
    /// result execution.
    pub fn run<'b>(
        self,
        context: &'b mut ResourceExecutingContext<'_>,
    ) -> BoxFuture<'b, ResourceExecutedContext>
    where
        'a: 'b,
    {
        Box::pin(async move {
            let invocation = self.invocation;
            let Some(filter) = invocation.filters.resource.get(self.index) else {
                return invocation.resource_inside(context.action_context()).await;
            };
            let name = filter.name();
            invocation.emit(
                context,
                events::BEFORE_ON_RESOURCE_EXECUTION,
                PipelineStage::Resource,
                Some(name),
                || EventDetail::None,
            );

            let next = ResourceNext {
                invocation,
                index: self.index + 1,
            };
            let mut executed = match filter.on_resource_execution(context, next).await {
                Ok(executed) => executed,
                Err(error) => {
                    tracing::warn!(filter = name, error = %error, "resource filter failed");
                    ResourceExecutedContext::failed(error)
                }
            };

            if executed.is_canceled() {
                if let Some(result) = executed.pending_result() {
                    tracing::debug!(filter = name, "resource filter short-circuited the pipeline");
                    let outcome = invocation
                        .execute_result(context.action_context(), result)
                        .await;
                    match outcome {
                        Ok(()) => executed.set_result_executed(),
                        Err(error) => executed = ResourceExecutedContext::failed(error),
                    }
                }
            }

            invocation.emit(
                context,
                events::AFTER_ON_RESOURCE_EXECUTION,
                PipelineStage::Resource,
                Some(name),
                || {
                    outcome_detail(
                        executed.is_canceled(),
                        executed.error(),
                        executed.exception_handled(),
                    )
                },
            );
            executed
        })
    }
}

/// The rest of the action stage, as seen by an action filter.
pub struct ActionNext<'a> {
    invocation: &'a Invocation<'a>,
    index: usize,
}

impl<'a> ActionNext<'a> {
    /// Runs the remaining action filters, then the action method.
    pub fn run<'b>(
        self,
        context: &'b mut ActionExecutingContext<'_>,
    ) -> BoxFuture<'b, ActionExecutedContext>
    where
        'a: 'b,
    {
        Box::pin(async move {
            let invocation = self.invocation;
            let Some(filter) = invocation.filters.action.get(self.index) else {
                return invocation.invoke_action_method(context).await;
            };
            let name = filter.name();
            invocation.emit(
                context,
                events::BEFORE_ON_ACTION_EXECUTION,
                PipelineStage::ActionFilter,
                Some(name),
                || EventDetail::None,
            );

            let next = ActionNext {
                invocation,
                index: self.index + 1,
            };
            let executed = match filter.on_action_execution(context, next).await {
                Ok(executed) => executed,
                Err(error) => {
                    tracing::warn!(filter = name, error = %error, "action filter failed");
                    ActionExecutedContext::failed(error)
                }
            };
            if executed.is_canceled() {
                tracing::debug!(filter = name, "action filter short-circuited the action");
            }

            invocation.emit(
                context,
                events::AFTER_ON_ACTION_EXECUTION,
                PipelineStage::ActionFilter,
                Some(name),
                || {
                    outcome_detail(
                        executed.is_canceled(),
                        executed.error(),
                        executed.exception_handled(),
                    )
                },
            );
            executed
        })
    }
}

/// The rest of the result stage, as seen by a result filter.
pub struct ResultNext<'a> {
    invocation: &'a Invocation<'a>,
    index: usize,
}

impl<'a> ResultNext<'a> {
    /// Runs the remaining result filters, then executes the result.
    pub fn run<'b>(
        self,
        context: &'b mut ResultExecutingContext<'_>,
    ) -> BoxFuture<'b, ResultExecutedContext>
    where
        'a: 'b,
    {
        Box::pin(async move {
            let invocation = self.invocation;
            let Some(filter) = invocation.filters.result.get(self.index) else {
                let (action_context, result) = context.parts();
                let outcome = invocation
                    .execute_result(action_context, result.as_ref())
                    .await;
                return match outcome {
                    Ok(()) => ResultExecutedContext::completed(Some(context.take_result())),
                    Err(error) => ResultExecutedContext::failed(error),
                };
            };
            let name = filter.name();
            invocation.emit(
                context,
                events::BEFORE_ON_RESULT_EXECUTION,
                PipelineStage::ResultFilter,
                Some(name),
                || EventDetail::None,
            );

            let next = ResultNext {
                invocation,
                index: self.index + 1,
            };
            let executed = match filter.on_result_execution(context, next).await {
                Ok(executed) => executed,
                Err(error) => {
                    tracing::warn!(filter = name, error = %error, "result filter failed");
                    ResultExecutedContext::failed(error)
                }
            };

            invocation.emit(
                context,
                events::AFTER_ON_RESULT_EXECUTION,
                PipelineStage::ResultFilter,
                Some(name),
                || {
                    outcome_detail(
                        executed.is_canceled(),
                        executed.error(),
                        executed.exception_handled(),
                    )
                },
            );
            executed
        })
    }
}

impl std::fmt::Debug for ResourceNext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceNext").field("index", &self.index).finish()
    }
}

impl std::fmt::Debug for ActionNext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionNext").field("index", &self.index).finish()
    }
}

impl std::fmt::Debug for ResultNext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultNext").field("index", &self.index).finish()
    }
}
