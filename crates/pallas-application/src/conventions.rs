//! Conventions adjust the application model before it is compiled.

use crate::models::{ActionModel, ApplicationModel, ControllerModel};
use crate::parts::ParameterModel;
use std::fmt;
use std::sync::Arc;

/// Adjusts the whole application.
pub trait ApplicationModelConvention: Send + Sync {
    /// Applies the convention.
    fn apply(&self, application: &mut ApplicationModel);
}

/// Adjusts each controller.
pub trait ControllerModelConvention: Send + Sync {
    /// Applies the convention.
    fn apply(&self, controller: &mut ControllerModel);
}

/// Adjusts each action.
pub trait ActionModelConvention: Send + Sync {
    /// Applies the convention.
    fn apply(&self, action: &mut ActionModel);
}

/// Adjusts each action parameter.
pub trait ParameterModelConvention: Send + Sync {
    /// Applies the convention.
    fn apply(&self, parameter: &mut ParameterModel);
}

impl<F: Fn(&mut ApplicationModel) + Send + Sync> ApplicationModelConvention for F {
    fn apply(&self, application: &mut ApplicationModel) {
        self(application);
    }
}

impl<F: Fn(&mut ControllerModel) + Send + Sync> ControllerModelConvention for F {
    fn apply(&self, controller: &mut ControllerModel) {
        self(controller);
    }
}

impl<F: Fn(&mut ActionModel) + Send + Sync> ActionModelConvention for F {
    fn apply(&self, action: &mut ActionModel) {
        self(action);
    }
}

impl<F: Fn(&mut ParameterModel) + Send + Sync> ParameterModelConvention for F {
    fn apply(&self, parameter: &mut ParameterModel) {
        self(parameter);
    }
}

/// Registered conventions.
///
/// Application conventions run first, then for each controller its
/// controller conventions, then each action's, then each parameter's. Within
/// a level conventions run in registration order.
///
/// # Example
///
/// ```
/// use pallas_application::{ApplicationModel, ControllerModel, Conventions};
/// use pallas_pipeline::ControllerTypeInfo;
///
/// let conventions = Conventions::new().controller(|controller: &mut ControllerModel| {
///     controller.controller_name = controller.controller_name.to_lowercase();
/// });
///
/// let mut application = ApplicationModel::new()
///     .controller(ControllerModel::new(ControllerTypeInfo::unit("OrdersController"), vec![]));
/// conventions.apply(&mut application);
/// assert_eq!(application.controllers[0].controller_name, "orders");
/// ```
#[derive(Clone, Default)]
pub struct Conventions {
    application: Vec<Arc<dyn ApplicationModelConvention>>,
    controller: Vec<Arc<dyn ControllerModelConvention>>,
    action: Vec<Arc<dyn ActionModelConvention>>,
    parameter: Vec<Arc<dyn ParameterModelConvention>>,
}

impl Conventions {
    /// No conventions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an application convention.
    #[must_use]
    pub fn application(mut self, convention: impl ApplicationModelConvention + 'static) -> Self {
        self.application.push(Arc::new(convention));
        self
    }

    /// Adds a controller convention.
    #[must_use]
    pub fn controller(mut self, convention: impl ControllerModelConvention + 'static) -> Self {
        self.controller.push(Arc::new(convention));
        self
    }

    /// Adds an action convention.
    #[must_use]
    pub fn action(mut self, convention: impl ActionModelConvention + 'static) -> Self {
        self.action.push(Arc::new(convention));
        self
    }

    /// Adds a parameter convention.
    #[must_use]
    pub fn parameter(mut self, convention: impl ParameterModelConvention + 'static) -> Self {
        self.parameter.push(Arc::new(convention));
        self
    }

    /// Number of registered conventions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.application.len() + self.controller.len() + self.action.len() + self.parameter.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies every convention to `application`.
    pub fn apply(&self, application: &mut ApplicationModel) {
        for convention in &self.application {
            convention.apply(application);
        }
        for controller in &mut application.controllers {
            for convention in &self.controller {
                convention.apply(controller);
            }
            for action in &mut controller.actions {
                for convention in &self.action {
                    convention.apply(action);
                }
                for parameter in &mut action.parameters {
                    for convention in &self.parameter {
                        convention.apply(parameter);
                    }
                }
            }
        }
        tracing::debug!(
            conventions = self.len(),
            controllers = application.controllers.len(),
            "applied application model conventions"
        );
    }
}

impl fmt::Debug for Conventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conventions")
            .field("application", &self.application.len())
            .field("controller", &self.controller.len())
            .field("action", &self.action.len())
            .field("parameter", &self.parameter.len())
            .finish()
    }
}
