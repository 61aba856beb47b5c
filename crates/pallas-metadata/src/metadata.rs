//! Metadata nodes.

use crate::attributes::{BindingSource, ModelAttributes};
use crate::details::{
    BindingMetadata, BindingMetadataProviderContext, DisplayMetadata,
    DisplayMetadataProviderContext, MetadataDetailsProvider, ValidationMetadata,
    ValidationMetadataProviderContext,
};
use crate::identity::{MetadataKind, ModelMetadataIdentity};
use crate::provider::ModelMetadataProvider;
use crate::type_info::{PropertyInfo, TypeInfo};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// Everything a node needs besides its provider: identity, raw attributes
/// and, for properties, the declaring property.
#[derive(Debug, Clone)]
pub struct MetadataDetails {
    /// Node identity.
    pub key: ModelMetadataIdentity,
    /// Raw attributes.
    pub attributes: ModelAttributes,
    /// The property, when the node describes one.
    pub property: Option<PropertyInfo>,
}

impl MetadataDetails {
    /// Creates details for a node.
    #[must_use]
    pub fn new(key: ModelMetadataIdentity, attributes: ModelAttributes) -> Self {
        Self {
            key,
            attributes,
            property: None,
        }
    }

    /// Attaches the declaring property.
    #[must_use]
    pub fn with_property(mut self, property: PropertyInfo) -> Self {
        self.property = Some(property);
        self
    }
}

/// Binding, display and validation facts of one type, property or parameter.
///
/// Each group of facts is computed on first access by the details provider
/// and cached for the life of the node. Initialization goes through a
/// `OnceLock`, so concurrent first readers wait for a single computation and
/// the provider runs exactly once per group.
pub struct ModelMetadata {
    details: MetadataDetails,
    provider: Weak<dyn ModelMetadataProvider>,
    details_provider: Arc<dyn MetadataDetailsProvider>,
    binding: OnceLock<BindingMetadata>,
    display: OnceLock<DisplayMetadata>,
    validation: OnceLock<ValidationMetadata>,
    properties: OnceLock<Vec<Arc<ModelMetadata>>>,
    element: OnceLock<Option<Arc<ModelMetadata>>>,
}

impl ModelMetadata {
    /// Creates a node.
    ///
    /// The owning provider is held weakly; it owns the node through its cache.
    #[must_use]
    pub fn new(
        provider: Weak<dyn ModelMetadataProvider>,
        details_provider: Arc<dyn MetadataDetailsProvider>,
        details: MetadataDetails,
    ) -> Self {
        Self {
            details,
            provider,
            details_provider,
            binding: OnceLock::new(),
            display: OnceLock::new(),
            validation: OnceLock::new(),
            properties: OnceLock::new(),
            element: OnceLock::new(),
        }
    }

    /// Node identity.
    #[must_use]
    pub fn identity(&self) -> &ModelMetadataIdentity {
        &self.details.key
    }

    /// Node kind.
    #[must_use]
    pub fn kind(&self) -> MetadataKind {
        self.details.key.kind()
    }

    /// The model type.
    #[must_use]
    pub fn model_type(&self) -> &TypeInfo {
        self.details.key.model_type()
    }

    /// The container type, for properties.
    #[must_use]
    pub fn container_type(&self) -> Option<&TypeInfo> {
        self.details.key.container_type()
    }

    /// Property or parameter name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.details.key.name()
    }

    /// Raw attributes.
    #[must_use]
    pub fn attributes(&self) -> &ModelAttributes {
        &self.details.attributes
    }

    /// Binding facts, computed once.
    pub fn binding_metadata(&self) -> &BindingMetadata {
        self.binding.get_or_init(|| {
            let mut context =
                BindingMetadataProviderContext::new(&self.details.key, &self.details.attributes);
            self.details_provider.create_binding_metadata(&mut context);
            context.binding_metadata
        })
    }

    /// Display facts, computed once.
    pub fn display_metadata(&self) -> &DisplayMetadata {
        self.display.get_or_init(|| {
            let mut context =
                DisplayMetadataProviderContext::new(&self.details.key, &self.details.attributes);
            self.details_provider.create_display_metadata(&mut context);
            context.display_metadata
        })
    }

    /// Validation facts, computed once.
    pub fn validation_metadata(&self) -> &ValidationMetadata {
        self.validation.get_or_init(|| {
            let mut context =
                ValidationMetadataProviderContext::new(&self.details.key, &self.details.attributes);
            self.details_provider.create_validation_metadata(&mut context);
            context.validation_metadata
        })
    }

    /// Child property metadata, ordered by display order (stable on
    /// declaration order). Empty for simple types.
    pub fn properties(&self) -> &[Arc<ModelMetadata>] {
        self.properties.get_or_init(|| {
            let Some(provider) = self.provider.upgrade() else {
                tracing::warn!(node = %self.details.key, "metadata provider dropped; no properties");
                return Vec::new();
            };
            let mut properties = provider.get_metadata_for_properties(self.model_type());
            properties.sort_by_key(|p| p.order());
            properties
        })
    }

    /// Looks up a child property by name (ASCII case-insensitive).
    pub fn property(&self, name: &str) -> Option<&Arc<ModelMetadata>> {
        self.properties()
            .iter()
            .find(|p| p.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    /// Metadata of the element type, for enumerable types.
    pub fn element_metadata(&self) -> Option<&Arc<ModelMetadata>> {
        self.element
            .get_or_init(|| {
                let element_type = self.model_type().element()?;
                let provider = self.provider.upgrade()?;
                Some(provider.get_metadata_for_type(&element_type))
            })
            .as_ref()
    }

    /// The element type, for enumerable types.
    #[must_use]
    pub fn element_type(&self) -> Option<TypeInfo> {
        self.model_type().element()
    }

    /// Whether binding treats the type as complex (no single-string conversion).
    #[must_use]
    pub fn is_complex_type(&self) -> bool {
        !self.model_type().is_simple()
    }

    /// Whether the type is enumerable.
    #[must_use]
    pub fn is_enumerable_type(&self) -> bool {
        self.model_type().is_enumerable()
    }

    /// Whether `null` is a legal value.
    #[must_use]
    pub fn is_reference_or_nullable_type(&self) -> bool {
        self.model_type().is_reference_or_nullable()
    }

    /// Whether the type is `Option<T>` of a value type.
    #[must_use]
    pub fn is_nullable_value_type(&self) -> bool {
        self.model_type().value_kind() == crate::ValueKind::Nullable
    }

    /// Whether the property has a getter (non-properties always do).
    #[must_use]
    pub fn has_property_getter(&self) -> bool {
        self.details.property.as_ref().map_or(true, PropertyInfo::has_getter)
    }

    /// Whether the property has a setter (non-properties never do).
    #[must_use]
    pub fn has_property_setter(&self) -> bool {
        self.details
            .property
            .as_ref()
            .is_some_and(PropertyInfo::has_setter)
    }

    /// Binding source, if constrained.
    pub fn binding_source(&self) -> Option<BindingSource> {
        self.binding_metadata().binding_source
    }

    /// Alternate model name.
    pub fn binder_model_name(&self) -> Option<&str> {
        self.binding_metadata().binder_model_name.as_deref()
    }

    /// Named binder.
    pub fn binder_type(&self) -> Option<&str> {
        self.binding_metadata().binder_type.as_deref()
    }

    /// Whether binding may set the member. Always `true` outside properties.
    pub fn is_binding_allowed(&self) -> bool {
        match self.kind() {
            MetadataKind::Property => self.binding_metadata().is_binding_allowed,
            MetadataKind::Type | MetadataKind::Parameter => true,
        }
    }

    /// Whether binding must supply a value. Always `false` for types.
    pub fn is_binding_required(&self) -> bool {
        match self.kind() {
            MetadataKind::Type => false,
            MetadataKind::Property | MetadataKind::Parameter => {
                self.binding_metadata().is_binding_required
            }
        }
    }

    /// Read-only resolution: types are never read-only; otherwise an explicit
    /// override wins; otherwise anything without a property setter is
    /// read-only, parameters included.
    pub fn is_read_only(&self) -> bool {
        match self.kind() {
            MetadataKind::Type => false,
            MetadataKind::Property | MetadataKind::Parameter => self
                .binding_metadata()
                .is_read_only
                .unwrap_or_else(|| !self.has_property_setter()),
        }
    }

    /// Required resolution: explicit override, else `true` exactly for
    /// non-nullable value types.
    pub fn is_required(&self) -> bool {
        self.validation_metadata()
            .is_required
            .unwrap_or_else(|| !self.is_reference_or_nullable_type())
    }

    /// Child validation: explicit override, else `true` for complex or
    /// enumerable types.
    pub fn validate_children(&self) -> bool {
        self.validation_metadata()
            .validate_children
            .unwrap_or_else(|| self.is_complex_type() || self.is_enumerable_type())
    }

    /// Whether validation visits this member at all.
    pub fn should_validate(&self) -> bool {
        self.validation_metadata().should_validate.unwrap_or(true)
    }

    /// Whether any validator metadata was contributed.
    pub fn has_validators(&self) -> bool {
        !self.validation_metadata().validator_metadata.is_empty()
    }

    /// Display order.
    pub fn order(&self) -> i32 {
        self.display_metadata().order
    }

    /// Display name, if declared.
    pub fn display_name(&self) -> Option<&str> {
        self.display_metadata().display_name.as_deref()
    }

    /// Display name, falling back to the member name, then the type name.
    pub fn display_name_or_default(&self) -> &str {
        self.display_name()
            .or_else(|| self.name())
            .unwrap_or_else(|| self.model_type().name())
    }

    /// Description.
    pub fn description(&self) -> Option<&str> {
        self.display_metadata().description.as_deref()
    }

    /// Whether empty strings bind as `null`.
    pub fn convert_empty_string_to_null(&self) -> bool {
        self.display_metadata().convert_empty_string_to_null
    }

    /// Display format string.
    pub fn display_format_string(&self) -> Option<&str> {
        self.display_metadata().display_format_string.as_deref()
    }

    /// Edit format string.
    pub fn edit_format_string(&self) -> Option<&str> {
        self.display_metadata().edit_format_string.as_deref()
    }

    /// Whether the edit format differs from the default.
    pub fn has_non_default_edit_format(&self) -> bool {
        self.display_metadata().has_non_default_edit_format
    }

    /// Text shown for `null`.
    pub fn null_display_text(&self) -> Option<&str> {
        self.display_metadata().null_display_text.as_deref()
    }

    /// Template hint.
    pub fn template_hint(&self) -> Option<&str> {
        self.display_metadata().template_hint.as_deref()
    }

    /// Data type name.
    pub fn data_type_name(&self) -> Option<&str> {
        self.display_metadata().data_type_name.as_deref()
    }

    /// Whether the member is shown on display.
    pub fn show_for_display(&self) -> bool {
        self.display_metadata().show_for_display
    }

    /// Whether the member is shown on edit.
    pub fn show_for_edit(&self) -> bool {
        self.display_metadata().show_for_edit
    }

    /// Whether the type is an enum.
    pub fn is_enum(&self) -> bool {
        self.display_metadata().is_enum
    }

    /// Whether the type is a flags enum.
    pub fn is_flags_enum(&self) -> bool {
        self.display_metadata().is_flags_enum
    }

    /// Enum names keyed to values.
    pub fn enum_names_and_values(&self) -> &indexmap::IndexMap<String, String> {
        &self.display_metadata().enum_names_and_values
    }

    /// Free-form provider values.
    pub fn additional_values(&self) -> &indexmap::IndexMap<String, serde_json::Value> {
        &self.display_metadata().additional_values
    }

    /// Property used as simple display text.
    pub fn simple_display_property(&self) -> Option<&str> {
        self.display_metadata().simple_display_property.as_deref()
    }

    /// Validator metadata in contribution order.
    pub fn validator_metadata(&self) -> &[Arc<dyn crate::Attribute>] {
        &self.validation_metadata().validator_metadata
    }
}

impl fmt::Debug for ModelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMetadata")
            .field("identity", &self.details.key)
            .field("attributes", &self.details.attributes)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ModelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.details.key, f)
    }
}
