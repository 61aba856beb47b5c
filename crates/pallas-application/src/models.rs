//! The application topology: application, controllers and actions.
//!
//! Built once at startup, adjusted by conventions, then compiled into
//! action descriptors. Pipelines derived from a model are built from a
//! [`deep_clone`](ApplicationModel::deep_clone), never by mutating the
//! original.

use crate::parts::{ApiExplorerModel, AttributeRouteModel, ParameterModel, PropertyModel};
use indexmap::IndexMap;
use pallas_metadata::Attribute;
use pallas_pipeline::{
    ActionConstraint, ActionMethod, ControllerTypeInfo, FilterMetadata, PipelineError,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// The root of the application topology.
#[derive(Debug)]
pub struct ApplicationModel {
    id: Uuid,
    /// Controllers in registration order.
    pub controllers: Vec<ControllerModel>,
    /// Filters applied to every action.
    pub filters: Vec<FilterMetadata>,
    /// Application-wide API explorer settings.
    pub api_explorer: ApiExplorerModel,
    /// Properties inherited by every action.
    pub properties: IndexMap<String, Value>,
}

impl Default for ApplicationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationModel {
    /// An empty application.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            controllers: Vec::new(),
            filters: Vec::new(),
            api_explorer: ApiExplorerModel::default(),
            properties: IndexMap::new(),
        }
    }

    /// Identifies the application; controllers refer back to it by id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Adds a controller, pointing it back at this application.
    pub fn add_controller(&mut self, mut controller: ControllerModel) {
        controller.application = Some(self.id);
        self.controllers.push(controller);
    }

    /// Adds a controller.
    #[must_use]
    pub fn controller(mut self, controller: ControllerModel) -> Self {
        self.add_controller(controller);
        self
    }

    /// Adds a global filter.
    #[must_use]
    pub fn filter(mut self, filter: FilterMetadata) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets an application property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Finds a controller by routing name.
    #[must_use]
    pub fn find_controller(&self, controller_name: &str) -> Option<&ControllerModel> {
        self.controllers
            .iter()
            .find(|controller| controller.controller_name == controller_name)
    }

    /// Finds a controller by routing name, mutably.
    pub fn find_controller_mut(&mut self, controller_name: &str) -> Option<&mut ControllerModel> {
        self.controllers
            .iter_mut()
            .find(|controller| controller.controller_name == controller_name)
    }

    /// Number of actions across all controllers.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.controllers
            .iter()
            .map(|controller| controller.actions.len())
            .sum()
    }

    /// Copies the whole topology. The copy keeps the application id.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self {
            id: self.id,
            controllers: self
                .controllers
                .iter()
                .map(ControllerModel::deep_clone)
                .collect(),
            filters: self.filters.clone(),
            api_explorer: self.api_explorer.deep_clone(),
            properties: self.properties.clone(),
        }
    }
}

/// One controller type and its actions.
///
/// # Example
///
/// ```
/// use pallas_application::{ActionModel, ControllerModel};
/// use pallas_pipeline::{ActionMethod, ControllerTypeInfo, EmptyResult};
///
/// let mut controller = ControllerModel::new(ControllerTypeInfo::unit("OrdersController"), vec![]);
/// controller.add_action(
///     ActionModel::new("List", vec![])
///         .with_method(ActionMethod::from_fn(|_| async { Ok(EmptyResult) })),
/// );
///
/// let copy = controller.deep_clone();
/// assert_eq!(copy.controller_name, "Orders");
/// assert_eq!(copy.actions[0].controller.as_deref(), Some("Orders"));
/// ```
#[derive(Debug)]
pub struct ControllerModel {
    /// The controller type.
    pub controller_type: ControllerTypeInfo,
    /// Routing name; defaults to the type name without `Controller`.
    pub controller_name: String,
    /// Attributes declared on the controller.
    pub attributes: Vec<Arc<dyn Attribute>>,
    /// Actions in declaration order.
    pub actions: Vec<ActionModel>,
    /// Id of the owning application.
    pub application: Option<Uuid>,
    /// Attribute routes; each action is reachable through every one.
    pub attribute_routes: Vec<AttributeRouteModel>,
    /// Constraints applied to every action.
    pub action_constraints: Vec<Arc<dyn ActionConstraint>>,
    /// Filters applied to every action.
    pub filters: Vec<FilterMetadata>,
    /// Bindable controller properties.
    pub controller_properties: Vec<PropertyModel>,
    /// API explorer settings.
    pub api_explorer: ApiExplorerModel,
    /// Route values added to every action.
    pub route_values: IndexMap<String, String>,
    /// Arbitrary properties set by conventions.
    pub properties: IndexMap<String, Value>,
}

impl ControllerModel {
    /// Creates a controller model.
    #[must_use]
    pub fn new(controller_type: ControllerTypeInfo, attributes: Vec<Arc<dyn Attribute>>) -> Self {
        Self {
            controller_name: controller_type.controller_name().to_string(),
            controller_type,
            attributes,
            actions: Vec::new(),
            application: None,
            attribute_routes: Vec::new(),
            action_constraints: Vec::new(),
            filters: Vec::new(),
            controller_properties: Vec::new(),
            api_explorer: ApiExplorerModel::default(),
            route_values: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    /// Adds an action, pointing it back at this controller.
    pub fn add_action(&mut self, mut action: ActionModel) {
        action.controller = Some(self.controller_name.clone());
        self.actions.push(action);
    }

    /// Adds an action.
    #[must_use]
    pub fn action(mut self, action: ActionModel) -> Self {
        self.add_action(action);
        self
    }

    /// Adds a controller property.
    pub fn add_property(&mut self, mut property: PropertyModel) {
        property.controller = Some(self.controller_name.clone());
        self.controller_properties.push(property);
    }

    /// Adds a controller-level filter.
    #[must_use]
    pub fn filter(mut self, filter: FilterMetadata) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds an attribute route.
    #[must_use]
    pub fn route(mut self, route: AttributeRouteModel) -> Self {
        self.attribute_routes.push(route);
        self
    }

    /// Sets a controller property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Finds an action by name.
    #[must_use]
    pub fn find_action(&self, action_name: &str) -> Option<&ActionModel> {
        self.actions
            .iter()
            .find(|action| action.action_name == action_name)
    }

    /// Copies the controller with its actions, routes, properties and API
    /// explorer settings. Filters, constraints and attributes are shared;
    /// the application reference is kept.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self {
            controller_type: self.controller_type.clone(),
            controller_name: self.controller_name.clone(),
            attributes: self.attributes.clone(),
            actions: self.actions.iter().map(ActionModel::deep_clone).collect(),
            application: self.application,
            attribute_routes: self
                .attribute_routes
                .iter()
                .map(AttributeRouteModel::deep_clone)
                .collect(),
            action_constraints: self.action_constraints.clone(),
            filters: self.filters.clone(),
            controller_properties: self
                .controller_properties
                .iter()
                .map(PropertyModel::deep_clone)
                .collect(),
            api_explorer: self.api_explorer.deep_clone(),
            route_values: self.route_values.clone(),
            properties: self.properties.clone(),
        }
    }
}

/// One action method.
#[derive(Debug)]
pub struct ActionModel {
    /// The action name.
    pub action_name: String,
    /// The code the action runs.
    pub method: Option<ActionMethod>,
    /// Attributes declared on the action.
    pub attributes: Vec<Arc<dyn Attribute>>,
    /// Routing name of the owning controller.
    pub controller: Option<String>,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterModel>,
    /// Action-level filters.
    pub filters: Vec<FilterMetadata>,
    /// Action-level constraints.
    pub action_constraints: Vec<Arc<dyn ActionConstraint>>,
    /// Attribute route, combined with each controller route.
    pub attribute_route: Option<AttributeRouteModel>,
    /// API explorer settings.
    pub api_explorer: ApiExplorerModel,
    /// Route values; override the controller's.
    pub route_values: IndexMap<String, String>,
    /// Arbitrary properties set by conventions.
    pub properties: IndexMap<String, Value>,
}

impl ActionModel {
    /// Creates an action model.
    #[must_use]
    pub fn new(name: impl Into<String>, attributes: Vec<Arc<dyn Attribute>>) -> Self {
        Self {
            action_name: name.into(),
            method: None,
            attributes,
            controller: None,
            parameters: Vec::new(),
            filters: Vec::new(),
            action_constraints: Vec::new(),
            attribute_route: None,
            api_explorer: ApiExplorerModel::default(),
            route_values: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    /// Sets the action method.
    #[must_use]
    pub fn with_method(mut self, method: ActionMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Adds a parameter, pointing it back at this action.
    pub fn add_parameter(&mut self, mut parameter: ParameterModel) {
        parameter.action = Some(self.action_name.clone());
        self.parameters.push(parameter);
    }

    /// Adds a parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: ParameterModel) -> Self {
        self.add_parameter(parameter);
        self
    }

    /// Adds an action-level filter.
    #[must_use]
    pub fn filter(mut self, filter: FilterMetadata) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Arc<dyn ActionConstraint>) -> Self {
        self.action_constraints.push(constraint);
        self
    }

    /// Sets the attribute route.
    #[must_use]
    pub fn route(mut self, route: AttributeRouteModel) -> Self {
        self.attribute_route = Some(route);
        self
    }

    /// Restricts the action to request bodies of `content_types`: adds a
    /// [`ConsumesConstraint`](pallas_pipeline::ConsumesConstraint) and its
    /// 415 resource filter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a content type is not a media type.
    pub fn consumes<I, S>(self, content_types: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (constraint, filter) = pallas_pipeline::consumes(content_types)?;
        Ok(self
            .constraint(constraint)
            .filter(FilterMetadata::resource(filter)))
    }

    /// Sets an action property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Copies the action with its parameters, route and API explorer
    /// settings. The controller reference is kept.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self {
            action_name: self.action_name.clone(),
            method: self.method.clone(),
            attributes: self.attributes.clone(),
            controller: self.controller.clone(),
            parameters: self
                .parameters
                .iter()
                .map(ParameterModel::deep_clone)
                .collect(),
            filters: self.filters.clone(),
            action_constraints: self.action_constraints.clone(),
            attribute_route: self
                .attribute_route
                .as_ref()
                .map(AttributeRouteModel::deep_clone),
            api_explorer: self.api_explorer.deep_clone(),
            route_values: self.route_values.clone(),
            properties: self.properties.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pallas_metadata::{BindFrom, Reflect};
    use pallas_pipeline::EmptyResult;

    fn orders() -> ControllerModel {
        let mut controller = ControllerModel::new(ControllerTypeInfo::unit("OrdersController"), vec![])
            .route(AttributeRouteModel::new("api/orders"))
            .property("area", Value::from("sales"));
        controller.add_action(
            ActionModel::new("Get", vec![Arc::new(BindFrom::query()) as Arc<dyn Attribute>])
                .with_method(ActionMethod::from_fn(|_| async { Ok(EmptyResult) }))
                .parameter(ParameterModel::new("id", i32::type_info(), vec![]))
                .route(AttributeRouteModel::new("{id}")),
        );
        controller
    }

    #[test]
    fn test_new_defaults() {
        let controller = orders();
        assert_eq!(controller.controller_name, "Orders");
        assert!(controller.application.is_none());

        let action = &controller.actions[0];
        assert_eq!(action.controller.as_deref(), Some("Orders"));
        assert_eq!(action.parameters[0].action.as_deref(), Some("Get"));
        assert_eq!(action.attributes.len(), 1);
    }

    #[test]
    fn test_add_controller_sets_back_reference() {
        let application = ApplicationModel::new().controller(orders());
        assert_eq!(application.controllers[0].application, Some(application.id()));
        assert_eq!(application.action_count(), 1);
        assert!(application.find_controller("Orders").is_some());
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let application = ApplicationModel::new().controller(orders());
        let mut copy = application.deep_clone();

        let controller = copy.find_controller_mut("Orders").unwrap();
        controller.actions[0].action_name = "Fetch".to_string();
        controller.actions[0].parameters[0].parameter_name = "orderId".to_string();
        controller.attribute_routes[0].template = Some("v2/orders".to_string());
        controller.properties.insert("area".to_string(), Value::from("billing"));

        let original = &application.controllers[0];
        assert_eq!(original.actions[0].action_name, "Get");
        assert_eq!(original.actions[0].parameters[0].parameter_name, "id");
        assert_eq!(original.attribute_routes[0].template.as_deref(), Some("api/orders"));
        assert_eq!(original.properties["area"], "sales");

        assert_eq!(copy.id(), application.id());
        assert_eq!(copy.controllers[0].application, Some(application.id()));
    }

    #[test]
    fn test_deep_clone_shares_attributes() {
        let controller = orders();
        let copy = controller.deep_clone();
        assert!(Arc::ptr_eq(
            &controller.actions[0].attributes[0],
            &copy.actions[0].attributes[0]
        ));
    }
}
