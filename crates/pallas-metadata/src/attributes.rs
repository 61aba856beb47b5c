//! Declarative attributes and the attribute sets attached to metadata nodes.

use crate::type_info::{PropertyInfo, TypeInfo, ParameterInfo};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Upcast helper so attributes can be downcast to their concrete type.
pub trait AsAny: Any + Send + Sync {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A piece of declarative metadata attached to a type, property, or parameter.
///
/// Details providers and validator providers inspect attributes by concrete
/// type; the framework itself treats them as opaque.
pub trait Attribute: AsAny + fmt::Debug {
    /// A short name used in logs.
    fn attribute_name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Downcasts an attribute to a concrete type.
#[must_use]
pub fn downcast<A: Attribute>(attribute: &dyn Attribute) -> Option<&A> {
    attribute.as_any().downcast_ref::<A>()
}

/// Where a value is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSource {
    /// The request body, via an input formatter.
    Body,
    /// The query string.
    Query,
    /// Route values.
    Path,
    /// A request header.
    Header,
    /// The service registry.
    Services,
    /// Any value provider (route, then query).
    ModelBinding,
    /// A custom binder decides.
    Custom,
}

impl BindingSource {
    /// Whether the source reads from value providers.
    #[must_use]
    pub const fn is_from_request(self) -> bool {
        !matches!(self, Self::Services)
    }

    /// Whether the source is a single, specific value provider.
    #[must_use]
    pub const fn is_greedy(self) -> bool {
        matches!(self, Self::Body | Self::Header | Self::Services | Self::Custom)
    }
}

/// Selects the binding source of a parameter or property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindFrom {
    /// The binding source.
    pub source: BindingSource,
    /// An alternate model name (e.g. the header name).
    pub name: Option<String>,
}

impl BindFrom {
    /// Binds from the request body.
    #[must_use]
    pub fn body() -> Self {
        Self {
            source: BindingSource::Body,
            name: None,
        }
    }

    /// Binds from the query string.
    #[must_use]
    pub fn query() -> Self {
        Self {
            source: BindingSource::Query,
            name: None,
        }
    }

    /// Binds from route values.
    #[must_use]
    pub fn route() -> Self {
        Self {
            source: BindingSource::Path,
            name: None,
        }
    }

    /// Binds from a named header.
    #[must_use]
    pub fn header(name: impl Into<String>) -> Self {
        Self {
            source: BindingSource::Header,
            name: Some(name.into()),
        }
    }

    /// Resolves from the service registry.
    #[must_use]
    pub fn services() -> Self {
        Self {
            source: BindingSource::Services,
            name: None,
        }
    }

    /// Overrides the model name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Attribute for BindFrom {}

/// Uses a named binder from the binder registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBinderAttribute {
    /// Registry name of the binder.
    pub binder: String,
    /// Optional model name override.
    pub name: Option<String>,
}

impl ModelBinderAttribute {
    /// Creates the attribute.
    #[must_use]
    pub fn new(binder: impl Into<String>) -> Self {
        Self {
            binder: binder.into(),
            name: None,
        }
    }
}

impl Attribute for ModelBinderAttribute {}

/// The member must receive a value from binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindRequired;

impl Attribute for BindRequired {}

/// The member is never bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindNever;

impl Attribute for BindNever {}

/// Overrides whether a member is editable (`false` makes it read-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Editable(pub bool);

impl Attribute for Editable {}

/// Display name, description, order and grouping of a member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Display {
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Ordering relative to sibling properties.
    pub order: Option<i32>,
    /// Placeholder text.
    pub prompt: Option<String>,
}

impl Display {
    /// Creates a display attribute with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the order.
    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Attribute for Display {}

/// Formatting rules for displaying and editing a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFormat {
    /// Format string, e.g. `{0:C}`.
    pub data_format_string: Option<String>,
    /// Whether the format string also applies when editing.
    pub apply_format_in_edit_mode: bool,
    /// Whether empty strings bind as `null`.
    pub convert_empty_string_to_null: bool,
    /// Text shown for `null` values.
    pub null_display_text: Option<String>,
    /// Whether values are HTML-encoded.
    pub html_encode: bool,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            data_format_string: None,
            apply_format_in_edit_mode: false,
            convert_empty_string_to_null: true,
            null_display_text: None,
            html_encode: true,
        }
    }
}

impl Attribute for DisplayFormat {}

/// Well-known data types of string members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataTypeKind {
    /// An e-mail address.
    EmailAddress,
    /// A password.
    Password,
    /// Multi-line text.
    MultilineText,
    /// A date without time.
    Date,
    /// A time without date.
    Time,
    /// A currency amount.
    Currency,
    /// A URL.
    Url,
    /// Anything else.
    Custom(String),
}

impl DataTypeKind {
    /// The data type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::EmailAddress => "EmailAddress",
            Self::Password => "Password",
            Self::MultilineText => "MultilineText",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Currency => "Currency",
            Self::Url => "Url",
            Self::Custom(name) => name,
        }
    }
}

/// Declares the data type of a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType(pub DataTypeKind);

impl Attribute for DataType {}

/// Hides a member from display and edit scaffolding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaffoldColumn(pub bool);

impl Attribute for ScaffoldColumn {}

/// Renders a member as a hidden input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HiddenInput {
    /// Whether the value is displayed next to the hidden input.
    pub display_value: bool,
}

impl Attribute for HiddenInput {}

/// Names the template used to render a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiHint(pub String);

impl Attribute for UiHint {}

/// Redirects metadata lookups to a shadow type whose same-named properties
/// carry additional attributes.
#[derive(Clone)]
pub struct ModelMetadataType(pub fn() -> TypeInfo);

impl ModelMetadataType {
    /// Points at the shadow type `T`.
    #[must_use]
    pub fn of<T: crate::Reflect>() -> Self {
        Self(T::type_info)
    }

    /// Resolves the shadow type.
    #[must_use]
    pub fn metadata_type(&self) -> TypeInfo {
        (self.0)()
    }
}

impl fmt::Debug for ModelMetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelMetadataType")
            .field(&self.metadata_type().name())
            .finish()
    }
}

impl Attribute for ModelMetadataType {}

/// The raw attribute set of one metadata node.
///
/// Ordering is type-level attributes first, then member-level attributes,
/// then attributes contributed by a [`ModelMetadataType`] shadow type.
#[derive(Clone, Default)]
pub struct ModelAttributes {
    attributes: Vec<Arc<dyn Attribute>>,
    type_attributes: Vec<Arc<dyn Attribute>>,
    property_attributes: Option<Vec<Arc<dyn Attribute>>>,
    parameter_attributes: Option<Vec<Arc<dyn Attribute>>>,
}

impl ModelAttributes {
    /// Attributes of a type (plus its shadow type's type-level attributes).
    #[must_use]
    pub fn for_type(model_type: &TypeInfo) -> Self {
        let mut type_attributes = model_type.attributes().to_vec();
        if let Some(shadow) = metadata_type_of(model_type) {
            type_attributes.extend(shadow.attributes().iter().cloned());
        }
        Self {
            attributes: type_attributes.clone(),
            type_attributes,
            property_attributes: None,
            parameter_attributes: None,
        }
    }

    /// Attributes of a property declared on `container`.
    #[must_use]
    pub fn for_property(container: &TypeInfo, property: &PropertyInfo, property_type: &TypeInfo) -> Self {
        let type_attributes = property_type.attributes().to_vec();
        let mut property_attributes = property.attributes().to_vec();
        if let Some(shadow) = metadata_type_of(container) {
            if let Some(shadow_property) = shadow.property(property.name()) {
                property_attributes.extend(shadow_property.attributes().iter().cloned());
            }
        }
        let mut attributes = type_attributes.clone();
        attributes.extend(property_attributes.iter().cloned());
        Self {
            attributes,
            type_attributes,
            property_attributes: Some(property_attributes),
            parameter_attributes: None,
        }
    }

    /// Attributes of an action parameter.
    #[must_use]
    pub fn for_parameter(parameter: &ParameterInfo) -> Self {
        let type_attributes = parameter.parameter_type().attributes().to_vec();
        let parameter_attributes = parameter.attributes().to_vec();
        let mut attributes = type_attributes.clone();
        attributes.extend(parameter_attributes.iter().cloned());
        Self {
            attributes,
            type_attributes,
            property_attributes: None,
            parameter_attributes: Some(parameter_attributes),
        }
    }

    /// All attributes in resolution order.
    #[must_use]
    pub fn all(&self) -> &[Arc<dyn Attribute>] {
        &self.attributes
    }

    /// Type-level attributes.
    #[must_use]
    pub fn type_attributes(&self) -> &[Arc<dyn Attribute>] {
        &self.type_attributes
    }

    /// Property-level attributes, if the node is a property.
    #[must_use]
    pub fn property_attributes(&self) -> Option<&[Arc<dyn Attribute>]> {
        self.property_attributes.as_deref()
    }

    /// Parameter-level attributes, if the node is a parameter.
    #[must_use]
    pub fn parameter_attributes(&self) -> Option<&[Arc<dyn Attribute>]> {
        self.parameter_attributes.as_deref()
    }

    /// Iterates over attributes of type `A`.
    pub fn of_type<A: Attribute>(&self) -> impl Iterator<Item = &A> {
        self.attributes.iter().filter_map(|a| downcast::<A>(a.as_ref()))
    }

    /// Returns the first attribute of type `A`.
    #[must_use]
    pub fn find<A: Attribute>(&self) -> Option<&A> {
        self.of_type::<A>().next()
    }

    /// Returns `true` if an attribute of type `A` is present.
    #[must_use]
    pub fn has<A: Attribute>(&self) -> bool {
        self.find::<A>().is_some()
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Debug for ModelAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.attributes.iter().map(|a| a.attribute_name()))
            .finish()
    }
}

fn metadata_type_of(model_type: &TypeInfo) -> Option<TypeInfo> {
    model_type
        .attributes()
        .iter()
        .find_map(|a| downcast::<ModelMetadataType>(a.as_ref()))
        .map(ModelMetadataType::metadata_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PropertyInfo, Reflect, TypeInfo};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Marker(&'static str);
    impl Attribute for Marker {}

    struct ProductMetadata;
    impl Reflect for ProductMetadata {
        fn type_info() -> TypeInfo {
            TypeInfo::builder::<Self>()
                .attribute(Marker("shadow-type"))
                .property(PropertyInfo::of::<String>("Name").attribute(Marker("shadow-name")))
                .build()
        }
    }

    struct Product;
    impl Reflect for Product {
        fn type_info() -> TypeInfo {
            TypeInfo::builder::<Self>()
                .attribute(ModelMetadataType::of::<ProductMetadata>())
                .attribute(Marker("type"))
                .property(PropertyInfo::of::<String>("Name").attribute(Marker("name")))
                .property(PropertyInfo::of::<i32>("Id"))
                .build()
        }
    }

    struct Tagged;
    impl Reflect for Tagged {
        fn type_info() -> TypeInfo {
            TypeInfo::builder::<Self>().attribute(Marker("class")).build()
        }
    }

    #[test]
    fn test_type_attributes_include_shadow_type() {
        let attributes = ModelAttributes::for_type(&Product::type_info());
        let markers: Vec<_> = attributes.of_type::<Marker>().map(|m| m.0).collect();
        assert_eq!(markers, vec!["type", "shadow-type"]);
    }

    #[test]
    fn test_property_attributes_merge_shadow_property() {
        let product = Product::type_info();
        let name = product.property("Name").unwrap();
        let attributes = ModelAttributes::for_property(&product, name, &name.property_type());
        let markers: Vec<_> = attributes.of_type::<Marker>().map(|m| m.0).collect();
        assert_eq!(markers, vec!["name", "shadow-name"]);
        assert_eq!(attributes.property_attributes().unwrap().len(), 2);
    }

    #[test]
    fn test_class_level_attributes_come_first() {
        let container = TypeInfo::builder::<()>()
            .property(PropertyInfo::of::<Tagged>("Tag").attribute(Marker("property")))
            .build();
        let property = container.property("Tag").unwrap();
        let attributes = ModelAttributes::for_property(&container, property, &property.property_type());
        let markers: Vec<_> = attributes.of_type::<Marker>().map(|m| m.0).collect();
        assert_eq!(markers, vec!["class", "property"]);
        assert_eq!(attributes.type_attributes().len(), 1);
    }

    #[test]
    fn test_find_and_has() {
        let parameter = crate::ParameterInfo::new("Orders.Create", "order", i32::type_info())
            .attribute(BindFrom::body());
        let attributes = ModelAttributes::for_parameter(&parameter);
        assert!(attributes.has::<BindFrom>());
        assert!(!attributes.has::<BindNever>());
        assert_eq!(attributes.find::<BindFrom>().unwrap().source, BindingSource::Body);
        assert_eq!(attributes.parameter_attributes().unwrap().len(), 1);
    }

    #[test]
    fn test_attribute_name() {
        let attribute: Arc<dyn Attribute> = Arc::new(BindRequired);
        assert_eq!(attribute.attribute_name(), "BindRequired");
    }
}
