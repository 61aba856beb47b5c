//! Compiles an application model into action descriptors.

use crate::models::{ActionModel, ApplicationModel, ControllerModel};
use crate::parts::AttributeRouteModel;
use indexmap::IndexMap;
use pallas_core::PallasError;
use pallas_pipeline::{ActionDescriptor, FilterDescriptor, FilterMetadata, FilterScope};
use serde_json::Value;

/// Property holding the API explorer visibility of an action.
pub const API_EXPLORER_VISIBLE: &str = "api_explorer.is_visible";

/// Property holding the API explorer group of an action.
pub const API_EXPLORER_GROUP: &str = "api_explorer.group_name";

impl ApplicationModel {
    /// Compiles every action into descriptors.
    ///
    /// Filters are listed global, then controller, then action, each tagged
    /// with its scope. Properties and route values merge with the action
    /// winning over the controller, and the controller over the application.
    /// An action reachable through several controller routes yields one
    /// descriptor per route.
    pub fn build_descriptors(&self) -> Result<Vec<ActionDescriptor>, PallasError> {
        let mut descriptors = Vec::with_capacity(self.action_count());
        for controller in &self.controllers {
            for action in &controller.actions {
                build_action(self, controller, action, &mut descriptors)?;
            }
        }
        tracing::debug!(
            controllers = self.controllers.len(),
            actions = descriptors.len(),
            "built action descriptors"
        );
        Ok(descriptors)
    }
}

fn build_action(
    application: &ApplicationModel,
    controller: &ControllerModel,
    action: &ActionModel,
    descriptors: &mut Vec<ActionDescriptor>,
) -> Result<(), PallasError> {
    let display_name = format!("{}.{}", controller.controller_type.name(), action.action_name);
    let Some(method) = action.method.clone() else {
        return Err(PallasError::configuration(format!(
            "The action '{display_name}' has no method."
        )));
    };

    let mut descriptor = ActionDescriptor::new(
        controller.controller_type.clone(),
        action.action_name.clone(),
        method,
    );
    descriptor.id = format!("{}.{}", controller.controller_name, action.action_name);
    descriptor.controller_name = controller.controller_name.clone();

    let route_values = merge_route_values(controller, action);
    descriptor.route_values = route_values.clone();

    let owner = format!("{}.{}", controller.controller_name, action.action_name);
    descriptor.parameters = action
        .parameters
        .iter()
        .map(|parameter| parameter.to_descriptor(&owner))
        .collect();

    descriptor.filters = scoped_filters(&application.filters, FilterScope::Global)
        .chain(scoped_filters(&controller.filters, FilterScope::Controller))
        .chain(scoped_filters(&action.filters, FilterScope::Action))
        .collect();

    descriptor.constraints = controller
        .action_constraints
        .iter()
        .chain(&action.action_constraints)
        .cloned()
        .collect();

    descriptor.properties = merge_properties(application, controller, action);

    let routes = combined_routes(controller, action);
    if routes.is_empty() {
        descriptors.push(descriptor);
        return Ok(());
    }
    for route in routes {
        let mut routed = descriptor.clone();
        routed.route_template = route
            .template
            .as_deref()
            .map(|template| AttributeRouteModel::replace_tokens(template, &route_values))
            .transpose()?;
        tracing::trace!(
            action = %display_name,
            template = routed.route_template.as_deref().unwrap_or_default(),
            "attribute route"
        );
        descriptors.push(routed);
    }
    Ok(())
}

fn scoped_filters(
    filters: &[FilterMetadata],
    scope: FilterScope,
) -> impl Iterator<Item = FilterDescriptor> + '_ {
    filters
        .iter()
        .map(move |filter| FilterDescriptor::new(filter.clone(), scope))
}

fn merge_route_values(controller: &ControllerModel, action: &ActionModel) -> IndexMap<String, String> {
    let mut values = IndexMap::new();
    values.insert("controller".to_string(), controller.controller_name.clone());
    values.insert("action".to_string(), action.action_name.clone());
    for (key, value) in controller.route_values.iter().chain(&action.route_values) {
        values.insert(key.clone(), value.clone());
    }
    values
}

fn merge_properties(
    application: &ApplicationModel,
    controller: &ControllerModel,
    action: &ActionModel,
) -> IndexMap<String, Value> {
    let mut properties = IndexMap::new();
    let explorer = action
        .api_explorer
        .or(&controller.api_explorer)
        .or(&application.api_explorer);
    if let Some(visible) = explorer.is_visible {
        properties.insert(API_EXPLORER_VISIBLE.to_string(), Value::Bool(visible));
    }
    if let Some(group) = explorer.group_name {
        properties.insert(API_EXPLORER_GROUP.to_string(), Value::String(group));
    }
    for (key, value) in application
        .properties
        .iter()
        .chain(&controller.properties)
        .chain(&action.properties)
    {
        properties.insert(key.clone(), value.clone());
    }
    properties
}

fn combined_routes(controller: &ControllerModel, action: &ActionModel) -> Vec<AttributeRouteModel> {
    let action_route = action.attribute_route.as_ref();
    if controller.attribute_routes.is_empty() {
        return action_route.cloned().into_iter().collect();
    }
    controller
        .attribute_routes
        .iter()
        .filter_map(|route| AttributeRouteModel::combine(Some(route), action_route))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{ApiExplorerModel, ParameterModel};
    use pallas_metadata::{Attribute, BindFrom, Reflect};
    use pallas_pipeline::{ActionMethod, ControllerTypeInfo, EmptyResult, StatusCodeResult};
    use pallas_pipeline::filters::{ModelStateInvalidFilter, UnsupportedContentTypeFilter};
    use std::sync::Arc;

    fn method() -> ActionMethod {
        ActionMethod::from_fn(|_| async { Ok(EmptyResult) })
    }

    fn application() -> ApplicationModel {
        let controller = ControllerModel::new(ControllerTypeInfo::unit("OrdersController"), vec![])
            .filter(FilterMetadata::action(ModelStateInvalidFilter))
            .route(AttributeRouteModel::new("api/[controller]"))
            .property("tier", Value::from("controller"))
            .property("owner", Value::from("orders-team"))
            .action(
                ActionModel::new("Get", vec![])
                    .with_method(method())
                    .parameter(
                        ParameterModel::new(
                            "id",
                            i32::type_info(),
                            vec![Arc::new(BindFrom::route()) as Arc<dyn Attribute>],
                        ),
                    )
                    .route(AttributeRouteModel::new("{id}"))
                    .property("tier", Value::from("action")),
            );
        ApplicationModel::new()
            .filter(FilterMetadata::action(UnsupportedContentTypeFilter))
            .property("tier", Value::from("application"))
            .property("version", Value::from(1))
            .controller(controller)
    }

    #[test]
    fn test_filters_flattened_with_scope() {
        let descriptors = application().build_descriptors().unwrap();
        assert_eq!(descriptors.len(), 1);

        let scopes: Vec<_> = descriptors[0]
            .filters
            .iter()
            .map(|filter| (filter.filter.name(), filter.scope))
            .collect();
        assert_eq!(
            scopes,
            [
                ("UnsupportedContentTypeFilter", FilterScope::Global),
                ("ModelStateInvalidFilter", FilterScope::Controller),
            ]
        );
    }

    #[test]
    fn test_properties_merge_action_first() {
        let descriptor = application().build_descriptors().unwrap().remove(0);
        assert_eq!(descriptor.properties["tier"], "action");
        assert_eq!(descriptor.properties["owner"], "orders-team");
        assert_eq!(descriptor.properties["version"], 1);
    }

    #[test]
    fn test_descriptor_identity_and_parameters() {
        let descriptor = application().build_descriptors().unwrap().remove(0);
        assert_eq!(descriptor.id, "Orders.Get");
        assert_eq!(descriptor.display_name, "OrdersController.Get");
        assert_eq!(descriptor.route_template.as_deref(), Some("api/Orders/{id}"));
        assert_eq!(descriptor.parameters.len(), 1);
        assert_eq!(descriptor.parameters[0].name, "id");
        assert_eq!(descriptor.parameters[0].parameter_info.owner(), "Orders.Get");
    }

    #[test]
    fn test_renamed_controller_changes_id_and_route_values() {
        let mut application = application();
        application.controllers[0].controller_name = "Purchases".to_string();

        let descriptor = application.build_descriptors().unwrap().remove(0);
        assert_eq!(descriptor.id, "Purchases.Get");
        assert_eq!(descriptor.route_values["controller"], "Purchases");
        assert_eq!(descriptor.route_template.as_deref(), Some("api/Purchases/{id}"));
    }

    #[test]
    fn test_one_descriptor_per_controller_route() {
        let mut application = application();
        application.controllers[0]
            .attribute_routes
            .push(AttributeRouteModel::new("legacy/orders"));

        let templates: Vec<_> = application
            .build_descriptors()
            .unwrap()
            .into_iter()
            .map(|descriptor| descriptor.route_template)
            .collect();
        assert_eq!(
            templates,
            [
                Some("api/Orders/{id}".to_string()),
                Some("legacy/orders/{id}".to_string())
            ]
        );
    }

    #[test]
    fn test_api_explorer_inherited() {
        let mut application = application();
        application.api_explorer.group_name = Some("v1".to_string());
        application.controllers[0].api_explorer = ApiExplorerModel {
            is_visible: Some(false),
            group_name: None,
        };

        let descriptor = application.build_descriptors().unwrap().remove(0);
        assert_eq!(descriptor.properties[API_EXPLORER_VISIBLE], false);
        assert_eq!(descriptor.properties[API_EXPLORER_GROUP], "v1");
    }

    #[test]
    fn test_missing_method_is_configuration_error() {
        let application = ApplicationModel::new().controller(
            ControllerModel::new(ControllerTypeInfo::unit("HomeController"), vec![])
                .action(ActionModel::new("Index", vec![])),
        );
        let err = application.build_descriptors().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: The action 'HomeController.Index' has no method."
        );
    }

    #[test]
    fn test_unrouted_action_has_no_template() {
        let application = ApplicationModel::new().controller(
            ControllerModel::new(ControllerTypeInfo::unit("HomeController"), vec![]).action(
                ActionModel::new("Index", vec![])
                    .with_method(ActionMethod::from_fn(|_| async {
                        Ok(StatusCodeResult(http::StatusCode::OK))
                    })),
            ),
        );
        let descriptors = application.build_descriptors().unwrap();
        assert_eq!(descriptors.len(), 1);
        assert!(descriptors[0].route_template.is_none());
        assert!(descriptors[0].filters.is_empty());
    }
}
