//! Controller types and their per-request activation.

use crate::context::ActionContext;
use crate::error::PipelineError;
use pallas_core::{ServiceError, Services};
use pallas_metadata::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A live controller instance.
pub type ControllerInstance = Arc<dyn Any + Send + Sync>;

type ControllerConstructor =
    Arc<dyn Fn(&Services) -> Result<ControllerInstance, ServiceError> + Send + Sync>;

/// A type whose instances handle actions.
///
/// # Example
///
/// ```
/// use pallas_core::{ServiceError, Services};
/// use pallas_pipeline::Controller;
/// use std::sync::Arc;
///
/// struct Greeter {
///     greeting: Arc<String>,
/// }
///
/// impl Controller for Greeter {
///     fn create(services: &Services) -> Result<Self, ServiceError> {
///         Ok(Self {
///             greeting: services.resolve_required()?,
///         })
///     }
/// }
/// ```
pub trait Controller: Send + Sync + Sized + 'static {
    /// Describes the controller type.
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>().build()
    }

    /// Creates an instance, pulling dependencies from `services`.
    fn create(services: &Services) -> Result<Self, ServiceError>;
}

/// A controller type and how to construct it.
#[derive(Clone)]
pub struct ControllerTypeInfo {
    type_info: TypeInfo,
    constructor: Option<ControllerConstructor>,
}

impl ControllerTypeInfo {
    /// Describes a [`Controller`] implementation.
    #[must_use]
    pub fn of<C: Controller>() -> Self {
        Self {
            type_info: C::type_info(),
            constructor: Some(Arc::new(|services: &Services| {
                C::create(services).map(|controller| Arc::new(controller) as ControllerInstance)
            })),
        }
    }

    /// A stateless controller, for actions that need no instance.
    #[must_use]
    pub fn unit(name: &'static str) -> Self {
        Self {
            type_info: TypeInfo::builder::<()>().name(name).build(),
            constructor: Some(Arc::new(|_: &Services| Ok(Arc::new(()) as ControllerInstance))),
        }
    }

    /// A type with no constructor; activating it fails.
    #[must_use]
    pub fn from_type(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            constructor: None,
        }
    }

    /// The described type.
    #[must_use]
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// The type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.type_info.name()
    }

    /// The name used for routing: the type name without a `Controller` suffix.
    #[must_use]
    pub fn controller_name(&self) -> &'static str {
        let name = self.name();
        match name.strip_suffix("Controller") {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => name,
        }
    }

    fn construct(&self, services: &Services) -> Option<Result<ControllerInstance, ServiceError>> {
        self.constructor
            .as_ref()
            .map(|constructor| constructor(services))
    }
}

impl fmt::Debug for ControllerTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerTypeInfo")
            .field("name", &self.name())
            .field("activation", &self.type_info.activation())
            .field("has_constructor", &self.constructor.is_some())
            .finish()
    }
}

/// Creates and releases controller instances.
pub trait ControllerActivator: Send + Sync + fmt::Debug {
    /// Creates an instance for the current request.
    fn create(
        &self,
        context: &ActionContext,
        controller: &ControllerTypeInfo,
    ) -> Result<ControllerInstance, PipelineError>;

    /// Releases an instance once the action has run.
    fn release(&self, context: &ActionContext, controller: ControllerInstance) {
        let _ = (context, controller);
    }
}

/// Activates concrete controller types through their constructor.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultControllerActivator;

impl DefaultControllerActivator {
    const NAME: &'static str = "DefaultControllerActivator";
}

impl ControllerActivator for DefaultControllerActivator {
    fn create(
        &self,
        context: &ActionContext,
        controller: &ControllerTypeInfo,
    ) -> Result<ControllerInstance, PipelineError> {
        let type_info = controller.type_info();
        if !type_info.activation().is_activatable() {
            return Err(PipelineError::configuration(format!(
                "The type '{}' cannot be activated by '{}' because it is either a value type, \
                 an interface, an abstract class or an open generic type.",
                type_info.name(),
                Self::NAME
            )));
        }

        match controller.construct(context.services()) {
            Some(Ok(instance)) => {
                tracing::trace!(controller = type_info.name(), "controller activated");
                Ok(instance)
            }
            Some(Err(error)) => Err(PipelineError::configuration(format!(
                "Unable to activate '{}': {error}",
                type_info.name()
            ))),
            None => Err(PipelineError::configuration(format!(
                "The type '{}' has no constructor registered with '{}'.",
                type_info.name(),
                Self::NAME
            ))),
        }
    }

    fn release(&self, _context: &ActionContext, controller: ControllerInstance) {
        tracing::trace!(
            strong_count = Arc::strong_count(&controller),
            "controller released"
        );
    }
}
