//! Compiled description of one action.

use crate::context::ActionArguments;
use crate::controller::{ControllerInstance, ControllerTypeInfo};
use crate::filters::FilterDescriptor;
use crate::results::{ActionResult, BoxedResult};
use http::Method;
use indexmap::IndexMap;
use pallas_binding::{ParameterDescriptor, RequestContext};
use pallas_core::{BoxFuture, ModelStateDictionary, RequestId};
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What an action method receives.
#[derive(Debug)]
pub struct ActionCall<C: ?Sized + Send + Sync = dyn Any + Send + Sync> {
    /// The controller instance.
    pub controller: Arc<C>,
    /// Bound arguments.
    pub arguments: ActionArguments,
    /// Binding and validation state after binding. Errors the action adds
    /// are merged back into the request's model state when it returns.
    pub model_state: SharedModelState,
    /// The request id.
    pub request_id: RequestId,
}

impl ActionCall {
    fn downcast<C: Send + Sync + 'static>(self) -> Result<ActionCall<C>, &'static str> {
        let Self {
            controller,
            arguments,
            model_state,
            request_id,
        } = self;
        match controller.downcast::<C>() {
            Ok(controller) => Ok(ActionCall {
                controller,
                arguments,
                model_state,
                request_id,
            }),
            Err(_) => Err(std::any::type_name::<C>()),
        }
    }
}

/// The request's model state, shared with a running action method.
#[derive(Debug, Clone, Default)]
pub struct SharedModelState(Arc<Mutex<ModelStateDictionary>>);

impl SharedModelState {
    /// Shares `model_state`.
    #[must_use]
    pub fn new(model_state: ModelStateDictionary) -> Self {
        Self(Arc::new(Mutex::new(model_state)))
    }

    /// Returns `true` if no entry is invalid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.lock().is_valid()
    }

    /// Adds an error under `key`; `false` once the error cap is reached.
    pub fn add_model_error(&self, key: impl Into<String>, message: impl Into<String>) -> bool {
        self.0.lock().add_model_error(key, message)
    }

    /// Runs `f` with the dictionary locked. Do not hold it across an await.
    pub fn update<R>(&self, f: impl FnOnce(&mut ModelStateDictionary) -> R) -> R {
        f(&mut self.0.lock())
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ModelStateDictionary {
        self.0.lock().clone()
    }
}

type MethodFuture = BoxFuture<'static, Result<BoxedResult, anyhow::Error>>;

type ErasedMethod = dyn Fn(ActionCall) -> MethodFuture + Send + Sync;

/// The code an action runs.
#[derive(Clone)]
pub struct ActionMethod(Arc<ErasedMethod>);

impl ActionMethod {
    /// An action method on controller type `C`.
    ///
    /// # Example
    ///
    /// ```
    /// use pallas_pipeline::{ActionCall, ActionMethod, ContentResult};
    ///
    /// struct Greeter;
    ///
    /// let method = ActionMethod::new(|call: ActionCall<Greeter>| async move {
    ///     let name: String = call.arguments.get_or_default("name");
    ///     Ok(ContentResult::new(format!("hello {name}")))
    /// });
    /// ```
    pub fn new<C, F, Fut, R>(method: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(ActionCall<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, anyhow::Error>> + Send + 'static,
        R: ActionResult + 'static,
    {
        Self(Arc::new(move |call: ActionCall| -> MethodFuture {
            match call.downcast::<C>() {
                Ok(call) => {
                    let pending = method(call);
                    Box::pin(async move {
                        pending.await.map(|result| Box::new(result) as BoxedResult)
                    })
                }
                Err(expected) => Box::pin(async move {
                    Err::<BoxedResult, _>(anyhow::anyhow!(
                        "controller instance is not a {expected}"
                    ))
                }),
            }
        }))
    }

    /// An action method that ignores the controller instance.
    pub fn from_fn<F, Fut, R>(method: F) -> Self
    where
        F: Fn(ActionCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, anyhow::Error>> + Send + 'static,
        R: ActionResult + 'static,
    {
        Self(Arc::new(move |call: ActionCall| -> MethodFuture {
            let pending = method(call);
            Box::pin(async move { pending.await.map(|result| Box::new(result) as BoxedResult) })
        }))
    }

    pub(crate) fn invoke(
        &self,
        controller: ControllerInstance,
        arguments: ActionArguments,
        model_state: SharedModelState,
        request_id: RequestId,
    ) -> MethodFuture {
        (self.0)(ActionCall {
            controller,
            arguments,
            model_state,
            request_id,
        })
    }
}

impl fmt::Debug for ActionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionMethod(..)")
    }
}

/// Decides whether an action can handle a request.
pub trait ActionConstraint: Send + Sync + fmt::Debug {
    /// Returns `true` if the request is acceptable.
    fn accept(&self, request: &RequestContext) -> bool;

    /// Whether the action may still be selected when no candidate accepts
    /// the request, leaving it to a filter to reject the request.
    fn accept_as_fallback(&self, _request: &RequestContext) -> bool {
        false
    }
}

/// Accepts only the listed HTTP methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMethodConstraint {
    methods: Vec<Method>,
}

impl HttpMethodConstraint {
    /// Accepts `methods`.
    #[must_use]
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }

    /// The accepted methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

impl ActionConstraint for HttpMethodConstraint {
    fn accept(&self, request: &RequestContext) -> bool {
        self.methods.is_empty() || self.methods.contains(request.method())
    }
}

/// Everything the pipeline needs to invoke one action.
///
/// Built once at startup, usually by compiling an application model, and
/// shared by every request to the action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    /// Unique id the host uses to select the action.
    pub id: String,
    /// Human-readable name used in logs, e.g. `OrdersController.Get`.
    pub display_name: String,
    /// Controller name used for routing.
    pub controller_name: String,
    /// Action name.
    pub action_name: String,
    /// The controller type.
    pub controller_type: ControllerTypeInfo,
    /// The action method.
    pub method: ActionMethod,
    /// Parameters, bound in order.
    pub parameters: Vec<ParameterDescriptor>,
    /// Filters; sorted by the invoker.
    pub filters: Vec<FilterDescriptor>,
    /// Route values that select this action.
    pub route_values: IndexMap<String, String>,
    /// Attribute route template, if the action is attribute-routed.
    pub route_template: Option<String>,
    /// Constraints every request must satisfy.
    pub constraints: Vec<Arc<dyn ActionConstraint>>,
    /// Arbitrary properties set by conventions.
    pub properties: IndexMap<String, Value>,
}

impl ActionDescriptor {
    /// Describes `action_name` on `controller_type`.
    ///
    /// The id defaults to `{controller}.{action}` using the routing name.
    #[must_use]
    pub fn new(
        controller_type: ControllerTypeInfo,
        action_name: impl Into<String>,
        method: ActionMethod,
    ) -> Self {
        let action_name = action_name.into();
        let controller_name = controller_type.controller_name().to_string();
        let mut route_values = IndexMap::new();
        route_values.insert("controller".to_string(), controller_name.clone());
        route_values.insert("action".to_string(), action_name.clone());
        Self {
            id: format!("{controller_name}.{action_name}"),
            display_name: format!("{}.{action_name}", controller_type.name()),
            controller_name,
            action_name,
            controller_type,
            method,
            parameters: Vec::new(),
            filters: Vec::new(),
            route_values,
            route_template: None,
            constraints: Vec::new(),
            properties: IndexMap::new(),
        }
    }

    /// Overrides the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends a filter.
    #[must_use]
    pub fn filter(mut self, filter: FilterDescriptor) -> Self {
        self.filters.push(filter);
        self
    }

    /// Appends a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Arc<dyn ActionConstraint>) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Returns `true` if every constraint accepts `request`.
    #[must_use]
    pub fn accepts(&self, request: &RequestContext) -> bool {
        self.constraints
            .iter()
            .all(|constraint| constraint.accept(request))
    }

    /// Returns `true` if every constraint accepts `request`, directly or as
    /// a fallback.
    #[must_use]
    pub fn accepts_as_fallback(&self, request: &RequestContext) -> bool {
        self.constraints
            .iter()
            .all(|constraint| constraint.accept(request) || constraint.accept_as_fallback(request))
    }

    /// Sets a property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}
