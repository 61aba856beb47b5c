//! Models nested inside controllers and actions.

use indexmap::IndexMap;
use pallas_binding::{BindingInfo, ParameterDescriptor};
use pallas_core::PallasError;
use pallas_metadata::{Attribute, ParameterInfo, PropertyInfo, TypeInfo};
use serde_json::Value;
use std::sync::Arc;

/// An action parameter.
#[derive(Debug)]
pub struct ParameterModel {
    /// The parameter name.
    pub parameter_name: String,
    /// The parameter type.
    pub parameter_type: TypeInfo,
    /// Attributes declared on the parameter.
    pub attributes: Vec<Arc<dyn Attribute>>,
    /// Binding overrides.
    pub binding_info: Option<BindingInfo>,
    /// Name of the owning action, set when the parameter is added to one.
    pub action: Option<String>,
    /// Arbitrary properties set by conventions.
    pub properties: IndexMap<String, Value>,
}

impl ParameterModel {
    /// Creates a parameter model.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        parameter_type: TypeInfo,
        attributes: Vec<Arc<dyn Attribute>>,
    ) -> Self {
        Self {
            parameter_name: name.into(),
            parameter_type,
            attributes,
            binding_info: None,
            action: None,
            properties: IndexMap::new(),
        }
    }

    /// Sets binding overrides.
    #[must_use]
    pub fn with_binding_info(mut self, binding_info: BindingInfo) -> Self {
        self.binding_info = Some(binding_info);
        self
    }

    /// Copies the model. Attributes are shared, collections are new.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self {
            parameter_name: self.parameter_name.clone(),
            parameter_type: self.parameter_type.clone(),
            attributes: self.attributes.clone(),
            binding_info: self.binding_info.clone(),
            action: self.action.clone(),
            properties: self.properties.clone(),
        }
    }

    pub(crate) fn to_descriptor(&self, owner: &str) -> ParameterDescriptor {
        let info = ParameterInfo::new(owner, &self.parameter_name, self.parameter_type.clone())
            .with_attributes(self.attributes.clone());
        let descriptor = ParameterDescriptor::new(info);
        match &self.binding_info {
            Some(binding_info) => descriptor.with_binding_info(binding_info.clone()),
            None => descriptor,
        }
    }
}

/// A controller property that may be bound.
#[derive(Debug)]
pub struct PropertyModel {
    /// The reflected property.
    pub property_info: PropertyInfo,
    /// Attributes declared on the property.
    pub attributes: Vec<Arc<dyn Attribute>>,
    /// Binding overrides.
    pub binding_info: Option<BindingInfo>,
    /// Name of the owning controller, set when added to one.
    pub controller: Option<String>,
    /// Arbitrary properties set by conventions.
    pub properties: IndexMap<String, Value>,
}

impl PropertyModel {
    /// Creates a property model.
    #[must_use]
    pub fn new(property_info: PropertyInfo, attributes: Vec<Arc<dyn Attribute>>) -> Self {
        Self {
            property_info,
            attributes,
            binding_info: None,
            controller: None,
            properties: IndexMap::new(),
        }
    }

    /// The property name.
    #[must_use]
    pub fn property_name(&self) -> &'static str {
        self.property_info.name()
    }

    /// Copies the model.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self {
            property_info: self.property_info.clone(),
            attributes: self.attributes.clone(),
            binding_info: self.binding_info.clone(),
            controller: self.controller.clone(),
            properties: self.properties.clone(),
        }
    }
}

/// An attribute route declared on a controller or action.
///
/// # Example
///
/// ```
/// use pallas_application::AttributeRouteModel;
///
/// let controller = AttributeRouteModel::new("api/[controller]");
/// let action = AttributeRouteModel::new("{id}").with_name("GetOrder");
///
/// let combined = AttributeRouteModel::combine(Some(&controller), Some(&action)).unwrap();
/// assert_eq!(combined.template.as_deref(), Some("api/[controller]/{id}"));
/// assert_eq!(combined.name.as_deref(), Some("GetOrder"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRouteModel {
    /// Route template; `None` inherits the other side when combined.
    pub template: Option<String>,
    /// Route name for link generation.
    pub name: Option<String>,
    /// Route order.
    pub order: Option<i32>,
    /// Excludes the route from link generation.
    pub suppress_link_generation: bool,
    /// Excludes the route from URL matching.
    pub suppress_path_matching: bool,
}

impl AttributeRouteModel {
    /// A route with `template`.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            ..Self::default()
        }
    }

    /// Sets the route name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the route order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Copies the model.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }

    /// Returns `true` for templates that ignore the controller route.
    #[must_use]
    pub fn is_override_pattern(template: &str) -> bool {
        template.starts_with('/') || template.starts_with("~/")
    }

    /// Combines a controller route with an action route.
    ///
    /// An absolute action template (`/..` or `~/..`) replaces the
    /// controller's; otherwise the two are joined with `/`. The action's
    /// name and order win when set.
    #[must_use]
    pub fn combine(left: Option<&Self>, right: Option<&Self>) -> Option<Self> {
        let (left, right) = match (left, right) {
            (None, None) => return None,
            (Some(only), None) | (None, Some(only)) => return Some(only.clone()),
            (Some(left), Some(right)) => (left, right),
        };

        let template = match (left.template.as_deref(), right.template.as_deref()) {
            (_, Some(right)) if Self::is_override_pattern(right) => Some(right.to_string()),
            (Some(left), Some(right)) => Some(join_templates(left, right)),
            (left, right) => right.or(left).map(str::to_string),
        };
        Some(Self {
            template,
            name: right.name.clone().or_else(|| left.name.clone()),
            order: right.order.or(left.order),
            suppress_link_generation: left.suppress_link_generation
                || right.suppress_link_generation,
            suppress_path_matching: left.suppress_path_matching || right.suppress_path_matching,
        })
    }

    /// Replaces `[token]`s in `template` with route values.
    ///
    /// `[[` and `]]` escape literal brackets. Token names match
    /// case-insensitively.
    pub fn replace_tokens(
        template: &str,
        values: &IndexMap<String, String>,
    ) -> Result<String, PallasError> {
        let mut output = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '[' if chars.peek() == Some(&'[') => {
                    chars.next();
                    output.push('[');
                }
                ']' if chars.peek() == Some(&']') => {
                    chars.next();
                    output.push(']');
                }
                '[' => {
                    let mut token = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => token.push(c),
                            None => {
                                return Err(PallasError::configuration(format!(
                                    "The route template '{template}' has an unclosed token '[{token}'."
                                )));
                            }
                        }
                    }
                    let value = values
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(&token))
                        .map(|(_, value)| value);
                    match value {
                        Some(value) => output.push_str(value),
                        None => {
                            let available = values
                                .keys()
                                .map(String::as_str)
                                .collect::<Vec<_>>()
                                .join(", ");
                            return Err(PallasError::configuration(format!(
                                "While processing template '{template}', a replacement value for \
                                 the token '{token}' could not be found. Available tokens: \
                                 '{available}'."
                            )));
                        }
                    }
                }
                c => output.push(c),
            }
        }
        Ok(output)
    }
}

fn join_templates(left: &str, right: &str) -> String {
    let left = left.trim_end_matches('/');
    let right = right.trim_start_matches('/');
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left}/{right}"),
    }
}

/// API explorer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiExplorerModel {
    /// Whether the action shows up in API descriptions; `None` inherits.
    pub is_visible: Option<bool>,
    /// Group name; `None` inherits.
    pub group_name: Option<String>,
}

impl ApiExplorerModel {
    /// Copies the model.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }

    /// Fills unset values from `fallback`.
    #[must_use]
    pub fn or(&self, fallback: &Self) -> Self {
        Self {
            is_visible: self.is_visible.or(fallback.is_visible),
            group_name: self
                .group_name
                .clone()
                .or_else(|| fallback.group_name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> IndexMap<String, String> {
        let mut values = IndexMap::new();
        values.insert("controller".to_string(), "Orders".to_string());
        values.insert("action".to_string(), "Get".to_string());
        values
    }

    #[test]
    fn test_combine_joins_relative_templates() {
        let left = AttributeRouteModel::new("api/orders/");
        let right = AttributeRouteModel::new("/{id}").with_order(2);
        let combined = AttributeRouteModel::combine(Some(&left), Some(&right)).unwrap();
        assert_eq!(combined.template.as_deref(), Some("/{id}"));

        let right = AttributeRouteModel::new("{id}").with_order(2);
        let combined = AttributeRouteModel::combine(Some(&left), Some(&right)).unwrap();
        assert_eq!(combined.template.as_deref(), Some("api/orders/{id}"));
        assert_eq!(combined.order, Some(2));
    }

    #[test]
    fn test_combine_with_missing_side() {
        let left = AttributeRouteModel::new("api").with_name("api");
        assert_eq!(AttributeRouteModel::combine(Some(&left), None), Some(left.clone()));
        assert_eq!(AttributeRouteModel::combine(None, None), None);

        let unnamed = AttributeRouteModel::default();
        let combined = AttributeRouteModel::combine(Some(&left), Some(&unnamed)).unwrap();
        assert_eq!(combined.template.as_deref(), Some("api"));
        assert_eq!(combined.name.as_deref(), Some("api"));
    }

    #[test]
    fn test_replace_tokens() {
        let replaced =
            AttributeRouteModel::replace_tokens("api/[Controller]/[action]/[[raw]]", &values())
                .unwrap();
        assert_eq!(replaced, "api/Orders/Get/[raw]");
    }

    #[test]
    fn test_replace_unknown_token_fails() {
        let err = AttributeRouteModel::replace_tokens("api/[area]", &values()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: While processing template 'api/[area]', a replacement value \
             for the token 'area' could not be found. Available tokens: 'controller, action'."
        );
    }

    #[test]
    fn test_api_explorer_inherits() {
        let controller = ApiExplorerModel {
            is_visible: Some(false),
            group_name: Some("v1".to_string()),
        };
        let action = ApiExplorerModel {
            is_visible: Some(true),
            group_name: None,
        };
        assert_eq!(
            action.or(&controller),
            ApiExplorerModel {
                is_visible: Some(true),
                group_name: Some("v1".to_string()),
            }
        );
    }
}
