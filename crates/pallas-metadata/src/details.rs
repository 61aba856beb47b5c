//! Binding, display and validation facts, and the providers that compute them.
//!
//! A metadata node asks its [`MetadataDetailsProvider`] for each group of
//! facts exactly once. Providers receive a context holding the node identity,
//! its raw attributes, and the record being built, and mutate that record in
//! place. [`CompositeMetadataDetailsProvider`] runs a list of providers in
//! registration order so later providers see, and may override, what earlier
//! ones contributed.

use crate::attributes::{
    Attribute, BindFrom, BindNever, BindRequired, BindingSource, DataType, Display, DisplayFormat,
    Editable, HiddenInput, ModelAttributes, ModelBinderAttribute, ScaffoldColumn, UiHint,
};
use crate::identity::{MetadataKind, ModelMetadataIdentity};
use indexmap::IndexMap;
use std::sync::Arc;

/// Default display order of members without an explicit order.
pub const DEFAULT_ORDER: i32 = 10_000;

/// Facts about how a member is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMetadata {
    /// Where the value comes from, if constrained.
    pub binding_source: Option<BindingSource>,
    /// Alternate model name.
    pub binder_model_name: Option<String>,
    /// Name of a binder in the binder registry.
    pub binder_type: Option<String>,
    /// Whether binding may set the member.
    pub is_binding_allowed: bool,
    /// Whether binding must supply a value.
    pub is_binding_required: bool,
    /// Explicit read-only override.
    pub is_read_only: Option<bool>,
}

impl Default for BindingMetadata {
    fn default() -> Self {
        Self {
            binding_source: None,
            binder_model_name: None,
            binder_type: None,
            is_binding_allowed: true,
            is_binding_required: false,
            is_read_only: None,
        }
    }
}

/// Facts about how a member is displayed and edited.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMetadata {
    /// Free-form values contributed by providers.
    pub additional_values: IndexMap<String, serde_json::Value>,
    /// Whether empty strings bind as `null`.
    pub convert_empty_string_to_null: bool,
    /// Data type name.
    pub data_type_name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Format string used for display.
    pub display_format_string: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Format string used for editing.
    pub edit_format_string: Option<String>,
    /// Enum display names with their groups, keyed to values.
    pub enum_grouped_display_names_and_values: Vec<(String, String, String)>,
    /// Enum names keyed to values.
    pub enum_names_and_values: IndexMap<String, String>,
    /// Whether the edit format differs from the default.
    pub has_non_default_edit_format: bool,
    /// Whether surrounding markup is hidden.
    pub hide_surrounding_html: bool,
    /// Whether values are HTML-encoded.
    pub html_encode: bool,
    /// Whether the type is an enum.
    pub is_enum: bool,
    /// Whether the type is a flags enum.
    pub is_flags_enum: bool,
    /// Text shown for `null` values.
    pub null_display_text: Option<String>,
    /// Ordering relative to sibling properties.
    pub order: i32,
    /// Placeholder text.
    pub placeholder: Option<String>,
    /// Whether the member is shown on display.
    pub show_for_display: bool,
    /// Whether the member is shown on edit.
    pub show_for_edit: bool,
    /// Property used as the simple display text of a complex type.
    pub simple_display_property: Option<String>,
    /// Template hint.
    pub template_hint: Option<String>,
}

impl Default for DisplayMetadata {
    fn default() -> Self {
        Self {
            additional_values: IndexMap::new(),
            convert_empty_string_to_null: true,
            data_type_name: None,
            description: None,
            display_format_string: None,
            display_name: None,
            edit_format_string: None,
            enum_grouped_display_names_and_values: Vec::new(),
            enum_names_and_values: IndexMap::new(),
            has_non_default_edit_format: false,
            hide_surrounding_html: false,
            html_encode: true,
            is_enum: false,
            is_flags_enum: false,
            null_display_text: None,
            order: DEFAULT_ORDER,
            placeholder: None,
            show_for_display: true,
            show_for_edit: true,
            simple_display_property: None,
            template_hint: None,
        }
    }
}

/// Facts about how a member is validated.
#[derive(Debug, Clone, Default)]
pub struct ValidationMetadata {
    /// Explicit required override.
    pub is_required: Option<bool>,
    /// Explicit child-validation override.
    pub validate_children: Option<bool>,
    /// Explicit "validate this member at all" override.
    pub should_validate: Option<bool>,
    /// Attributes validator providers turn into validators, in order.
    pub validator_metadata: Vec<Arc<dyn Attribute>>,
}

macro_rules! provider_context {
    ($(#[$doc:meta])* $name:ident, $field:ident: $record:ty) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name<'a> {
            /// Identity of the node being described.
            pub key: &'a ModelMetadataIdentity,
            /// Raw attributes of the node.
            pub attributes: &'a ModelAttributes,
            /// The record being built.
            pub $field: $record,
        }

        impl<'a> $name<'a> {
            /// Creates a context holding a default record.
            #[must_use]
            pub fn new(key: &'a ModelMetadataIdentity, attributes: &'a ModelAttributes) -> Self {
                Self {
                    key,
                    attributes,
                    $field: <$record>::default(),
                }
            }
        }
    };
}

provider_context!(
    /// Context passed to [`MetadataDetailsProvider::create_binding_metadata`].
    BindingMetadataProviderContext, binding_metadata: BindingMetadata
);
provider_context!(
    /// Context passed to [`MetadataDetailsProvider::create_display_metadata`].
    DisplayMetadataProviderContext, display_metadata: DisplayMetadata
);
provider_context!(
    /// Context passed to [`MetadataDetailsProvider::create_validation_metadata`].
    ValidationMetadataProviderContext, validation_metadata: ValidationMetadata
);

/// Contributes facts to metadata nodes.
///
/// Every method defaults to doing nothing, so a provider implements only the
/// groups it cares about.
pub trait MetadataDetailsProvider: Send + Sync {
    /// Contributes binding facts.
    fn create_binding_metadata(&self, _context: &mut BindingMetadataProviderContext<'_>) {}

    /// Contributes display facts.
    fn create_display_metadata(&self, _context: &mut DisplayMetadataProviderContext<'_>) {}

    /// Contributes validation facts.
    fn create_validation_metadata(&self, _context: &mut ValidationMetadataProviderContext<'_>) {}
}

/// Runs a list of providers in registration order.
#[derive(Clone, Default)]
pub struct CompositeMetadataDetailsProvider {
    providers: Vec<Arc<dyn MetadataDetailsProvider>>,
}

impl CompositeMetadataDetailsProvider {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The framework's binding and display providers.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with(DefaultBindingMetadataProvider)
            .with(DefaultDisplayMetadataProvider)
    }

    /// Appends a provider.
    #[must_use]
    pub fn with(mut self, provider: impl MetadataDetailsProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Appends a shared provider.
    pub fn push(&mut self, provider: Arc<dyn MetadataDetailsProvider>) {
        self.providers.push(provider);
    }

    /// Returns the number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if there are no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl MetadataDetailsProvider for CompositeMetadataDetailsProvider {
    fn create_binding_metadata(&self, context: &mut BindingMetadataProviderContext<'_>) {
        for provider in &self.providers {
            provider.create_binding_metadata(context);
        }
    }

    fn create_display_metadata(&self, context: &mut DisplayMetadataProviderContext<'_>) {
        for provider in &self.providers {
            provider.create_display_metadata(context);
        }
    }

    fn create_validation_metadata(&self, context: &mut ValidationMetadataProviderContext<'_>) {
        for provider in &self.providers {
            provider.create_validation_metadata(context);
        }
    }
}

/// Reads binding attributes: [`BindFrom`], [`ModelBinderAttribute`],
/// [`BindRequired`], [`BindNever`] and [`Editable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBindingMetadataProvider;

impl MetadataDetailsProvider for DefaultBindingMetadataProvider {
    fn create_binding_metadata(&self, context: &mut BindingMetadataProviderContext<'_>) {
        let attributes = context.attributes;
        let binding = &mut context.binding_metadata;

        if let Some(bind_from) = attributes.find::<BindFrom>() {
            binding.binding_source = Some(bind_from.source);
            if bind_from.name.is_some() {
                binding.binder_model_name.clone_from(&bind_from.name);
            }
        }

        if let Some(binder) = attributes.find::<ModelBinderAttribute>() {
            binding.binder_type = Some(binder.binder.clone());
            binding.binding_source.get_or_insert(BindingSource::Custom);
            if binder.name.is_some() {
                binding.binder_model_name.clone_from(&binder.name);
            }
        }

        // Binding behavior only applies to members, never to a type on its own.
        if context.key.kind() != MetadataKind::Type {
            if attributes.has::<BindNever>() {
                binding.is_binding_allowed = false;
            }
            if attributes.has::<BindRequired>() {
                binding.is_binding_required = true;
            }
        }

        if let Some(Editable(allow_edit)) = attributes.find::<Editable>() {
            binding.is_read_only = Some(!allow_edit);
        }
    }
}

/// Reads display attributes: [`Display`], [`DisplayFormat`], [`DataType`],
/// [`HiddenInput`], [`ScaffoldColumn`], [`UiHint`], and enum values of the
/// model type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDisplayMetadataProvider;

impl MetadataDetailsProvider for DefaultDisplayMetadataProvider {
    fn create_display_metadata(&self, context: &mut DisplayMetadataProviderContext<'_>) {
        let attributes = context.attributes;
        let model_type = context.key.model_type();
        let display = &mut context.display_metadata;

        if let Some(attribute) = attributes.find::<Display>() {
            if attribute.name.is_some() {
                display.display_name.clone_from(&attribute.name);
            }
            if attribute.description.is_some() {
                display.description.clone_from(&attribute.description);
            }
            if attribute.prompt.is_some() {
                display.placeholder.clone_from(&attribute.prompt);
            }
            if let Some(order) = attribute.order {
                display.order = order;
            }
        }

        if let Some(data_type) = attributes.find::<DataType>() {
            display.data_type_name = Some(data_type.0.as_str().to_string());
        }

        if let Some(format) = attributes.find::<DisplayFormat>() {
            display.convert_empty_string_to_null = format.convert_empty_string_to_null;
            display.display_format_string.clone_from(&format.data_format_string);
            display.html_encode = format.html_encode;
            display.null_display_text.clone_from(&format.null_display_text);
            if format.apply_format_in_edit_mode {
                display.edit_format_string.clone_from(&format.data_format_string);
                display.has_non_default_edit_format = format.data_format_string.is_some();
            }
        }

        if let Some(hidden) = attributes.find::<HiddenInput>() {
            display.template_hint = Some("HiddenInput".to_string());
            display.hide_surrounding_html = !hidden.display_value;
        }

        if let Some(UiHint(hint)) = attributes.find::<UiHint>() {
            display.template_hint = Some(hint.clone());
        }

        if let Some(ScaffoldColumn(scaffold)) = attributes.find::<ScaffoldColumn>() {
            display.show_for_display = *scaffold;
            display.show_for_edit = *scaffold;
        }

        if !model_type.enum_values().is_empty() {
            display.is_enum = true;
            display.is_flags_enum = model_type.is_flags();
            for value in model_type.enum_values() {
                display
                    .enum_names_and_values
                    .insert(value.name.clone(), value.value.clone());
                display.enum_grouped_display_names_and_values.push((
                    value.group.clone().unwrap_or_default(),
                    value.display_name.clone().unwrap_or_else(|| value.name.clone()),
                    value.value.clone(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnumValue, PropertyInfo, Reflect, TypeInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Recording {
        log: parking_lot::Mutex<Vec<&'static str>>,
        calls: AtomicUsize,
    }

    struct Named(&'static str, Arc<Recording>);

    impl MetadataDetailsProvider for Named {
        fn create_display_metadata(&self, context: &mut DisplayMetadataProviderContext<'_>) {
            self.1.calls.fetch_add(1, Ordering::SeqCst);
            self.1.log.lock().push(self.0);
            context.display_metadata.display_name = Some(self.0.to_string());
        }
    }

    fn property_attributes(property: PropertyInfo) -> (ModelMetadataIdentity, ModelAttributes) {
        let container = TypeInfo::builder::<()>().property(property).build();
        let property = &container.properties()[0];
        let property_type = property.property_type();
        let attributes = ModelAttributes::for_property(&container, property, &property_type);
        let key = ModelMetadataIdentity::for_property(property_type, property.name(), container.clone());
        (key, attributes)
    }

    #[test]
    fn test_composite_runs_in_registration_order() {
        let recording = Arc::new(Recording::default());
        let composite = CompositeMetadataDetailsProvider::new()
            .with(Named("first", recording.clone()))
            .with(Named("second", recording.clone()));
        let key = ModelMetadataIdentity::for_type(i32::type_info());
        let attributes = ModelAttributes::default();
        let mut context = DisplayMetadataProviderContext::new(&key, &attributes);

        composite.create_display_metadata(&mut context);

        assert_eq!(*recording.log.lock(), vec!["first", "second"]);
        assert_eq!(context.display_metadata.display_name.as_deref(), Some("second"));
        assert_eq!(recording.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_default_binding_provider() {
        let (key, attributes) = property_attributes(
            PropertyInfo::of::<String>("Tenant")
                .attribute(BindFrom::header("X-Tenant"))
                .attribute(BindRequired)
                .attribute(Editable(false)),
        );
        let mut context = BindingMetadataProviderContext::new(&key, &attributes);
        DefaultBindingMetadataProvider.create_binding_metadata(&mut context);

        let binding = context.binding_metadata;
        assert_eq!(binding.binding_source, Some(BindingSource::Header));
        assert_eq!(binding.binder_model_name.as_deref(), Some("X-Tenant"));
        assert!(binding.is_binding_required);
        assert_eq!(binding.is_read_only, Some(true));
    }

    #[test]
    fn test_bind_never_ignored_for_types() {
        let info = TypeInfo::builder::<u8>().attribute(BindNever).build();
        let key = ModelMetadataIdentity::for_type(info.clone());
        let attributes = ModelAttributes::for_type(&info);
        let mut context = BindingMetadataProviderContext::new(&key, &attributes);
        DefaultBindingMetadataProvider.create_binding_metadata(&mut context);
        assert!(context.binding_metadata.is_binding_allowed);
    }

    #[test]
    fn test_default_display_provider() {
        let (key, attributes) = property_attributes(
            PropertyInfo::of::<f64>("Price")
                .attribute(Display::named("Unit price").order(2))
                .attribute(DisplayFormat {
                    data_format_string: Some("{0:C}".into()),
                    apply_format_in_edit_mode: true,
                    convert_empty_string_to_null: false,
                    ..DisplayFormat::default()
                })
                .attribute(HiddenInput::default()),
        );
        let mut context = DisplayMetadataProviderContext::new(&key, &attributes);
        DefaultDisplayMetadataProvider.create_display_metadata(&mut context);

        let display = context.display_metadata;
        assert_eq!(display.display_name.as_deref(), Some("Unit price"));
        assert_eq!(display.order, 2);
        assert_eq!(display.edit_format_string.as_deref(), Some("{0:C}"));
        assert!(display.has_non_default_edit_format);
        assert!(!display.convert_empty_string_to_null);
        assert_eq!(display.template_hint.as_deref(), Some("HiddenInput"));
        assert!(display.hide_surrounding_html);
    }

    #[test]
    fn test_enum_display_values() {
        let info = TypeInfo::builder::<u16>()
            .enum_values(vec![
                EnumValue::new("Red", "0").display("Crimson").group("Warm"),
                EnumValue::new("Blue", "1"),
            ])
            .build();
        let key = ModelMetadataIdentity::for_type(info.clone());
        let attributes = ModelAttributes::for_type(&info);
        let mut context = DisplayMetadataProviderContext::new(&key, &attributes);
        DefaultDisplayMetadataProvider.create_display_metadata(&mut context);

        let display = context.display_metadata;
        assert!(display.is_enum);
        assert!(!display.is_flags_enum);
        assert_eq!(display.enum_names_and_values["Blue"], "1");
        assert_eq!(
            display.enum_grouped_display_names_and_values[0],
            ("Warm".to_string(), "Crimson".to_string(), "0".to_string())
        );
    }
}
