//! Built-in validator providers and validation details providers.

use crate::annotations::{
    EmailAddress, MaxLength, MinLength, Range, RegularExpression, Required, StringLength,
    Validatable, ValidateNever, ValidationAttribute, ValidatorAttribute,
};
use crate::error::ValidationError;
use crate::validator::{
    ModelValidationContext, ModelValidationResult, ModelValidator, ModelValidatorProvider,
    ModelValidatorProviderContext, ValidatorItem,
};
use pallas_metadata::{
    downcast, Attribute, MetadataDetailsProvider, ValidationMetadataProviderContext,
};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

type AdaptFn = fn(&dyn Attribute) -> Option<Arc<dyn ValidationAttribute>>;

fn adapt<A: ValidationAttribute + Clone>(attribute: &dyn Attribute) -> Option<Arc<dyn ValidationAttribute>> {
    downcast::<A>(attribute).map(|a| Arc::new(a.clone()) as Arc<dyn ValidationAttribute>)
}

/// Registry of attribute types that are declarative validation rules.
///
/// Attributes are opaque trait objects, so the registry records, per concrete
/// type, how to view an attribute as a [`ValidationAttribute`].
#[derive(Clone)]
pub struct ValidationAttributeAdapters {
    adapters: Vec<(TypeId, AdaptFn)>,
}

impl Default for ValidationAttributeAdapters {
    fn default() -> Self {
        Self::empty()
            .with::<Required>()
            .with::<Range>()
            .with::<StringLength>()
            .with::<RegularExpression>()
            .with::<MinLength>()
            .with::<MaxLength>()
            .with::<EmailAddress>()
    }
}

impl ValidationAttributeAdapters {
    /// A registry knowing no attribute types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Registers attribute type `A`.
    #[must_use]
    pub fn with<A: ValidationAttribute + Clone>(mut self) -> Self {
        if !self.adapters.iter().any(|(id, _)| *id == TypeId::of::<A>()) {
            self.adapters.push((TypeId::of::<A>(), adapt::<A>));
        }
        self
    }

    /// Whether `attribute` is a registered rule.
    #[must_use]
    pub fn is_validation_attribute(&self, attribute: &dyn Attribute) -> bool {
        let id = attribute.as_any().type_id();
        self.adapters.iter().any(|(known, _)| *known == id)
    }

    /// Views `attribute` as a rule, if registered.
    #[must_use]
    pub fn adapt(&self, attribute: &dyn Attribute) -> Option<Arc<dyn ValidationAttribute>> {
        let id = attribute.as_any().type_id();
        self.adapters
            .iter()
            .find(|(known, _)| *known == id)
            .and_then(|(_, adapt)| adapt(attribute))
    }
}

impl fmt::Debug for ValidationAttributeAdapters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationAttributeAdapters")
            .field("adapters", &self.adapters.len())
            .finish()
    }
}

/// Contributes validation facts for hand-written validators.
///
/// [`ValidatorAttribute`]s are appended to the validator metadata in
/// attribute order, and [`ValidateNever`] turns validation of the member off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidationMetadataProvider;

impl MetadataDetailsProvider for DefaultValidationMetadataProvider {
    fn create_validation_metadata(&self, context: &mut ValidationMetadataProviderContext<'_>) {
        for attribute in context.attributes.all() {
            let attribute_ref: &dyn Attribute = attribute.as_ref();
            if downcast::<ValidatorAttribute>(attribute_ref).is_some() {
                context.validation_metadata.validator_metadata.push(attribute.clone());
            }
            if downcast::<ValidateNever>(attribute_ref).is_some() {
                context.validation_metadata.should_validate = Some(false);
            }
        }
    }
}

/// Contributes validation facts for declarative rules.
///
/// Every registered rule is appended to the validator metadata in attribute
/// order; [`Required`] also sets the required override.
#[derive(Debug, Clone, Default)]
pub struct DataAnnotationsMetadataProvider {
    adapters: ValidationAttributeAdapters,
}

impl DataAnnotationsMetadataProvider {
    /// Creates the provider with a custom rule registry.
    #[must_use]
    pub fn new(adapters: ValidationAttributeAdapters) -> Self {
        Self { adapters }
    }
}

impl MetadataDetailsProvider for DataAnnotationsMetadataProvider {
    fn create_validation_metadata(&self, context: &mut ValidationMetadataProviderContext<'_>) {
        for attribute in context.attributes.all() {
            let attribute_ref: &dyn Attribute = attribute.as_ref();
            if self.adapters.is_validation_attribute(attribute_ref) {
                context.validation_metadata.validator_metadata.push(attribute.clone());
            }
            if downcast::<Required>(attribute_ref).is_some() {
                context.validation_metadata.is_required = Some(true);
            }
        }
    }
}

/// Fills slots whose metadata is a [`ValidatorAttribute`] and appends a
/// [`ValidatableObjectAdapter`] for self-validating types.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModelValidatorProvider;

impl ModelValidatorProvider for DefaultModelValidatorProvider {
    fn create_validators(&self, context: &mut ModelValidatorProviderContext<'_>) {
        for item in &mut context.results {
            if item.validator.is_some() {
                continue;
            }
            let Some(metadata) = &item.validator_metadata else {
                continue;
            };
            if let Some(ValidatorAttribute(validator)) = downcast::<ValidatorAttribute>(metadata.as_ref()) {
                item.validator = Some(validator.clone());
                item.is_reusable = true;
            }
        }

        let validatable = context
            .metadata
            .attributes()
            .type_attributes()
            .iter()
            .find_map(|a| downcast::<Validatable>(a.as_ref()))
            .cloned();
        if let Some(validatable) = validatable {
            context
                .results
                .push(ValidatorItem::from_validator(Arc::new(ValidatableObjectAdapter {
                    validatable,
                })));
        }
    }
}

/// Fills slots whose metadata is a registered rule.
#[derive(Debug, Clone, Default)]
pub struct DataAnnotationsModelValidatorProvider {
    adapters: ValidationAttributeAdapters,
}

impl DataAnnotationsModelValidatorProvider {
    /// Creates the provider with a custom rule registry.
    #[must_use]
    pub fn new(adapters: ValidationAttributeAdapters) -> Self {
        Self { adapters }
    }
}

impl ModelValidatorProvider for DataAnnotationsModelValidatorProvider {
    fn create_validators(&self, context: &mut ModelValidatorProviderContext<'_>) {
        for item in &mut context.results {
            if item.validator.is_some() {
                continue;
            }
            let Some(metadata) = &item.validator_metadata else {
                continue;
            };
            if let Some(attribute) = self.adapters.adapt(metadata.as_ref()) {
                item.validator = Some(Arc::new(DataAnnotationsModelValidator { attribute }));
                item.is_reusable = true;
            }
        }
    }
}

/// Runs one declarative rule.
#[derive(Debug)]
pub struct DataAnnotationsModelValidator {
    attribute: Arc<dyn ValidationAttribute>,
}

impl DataAnnotationsModelValidator {
    /// Wraps a rule.
    #[must_use]
    pub fn new(attribute: Arc<dyn ValidationAttribute>) -> Self {
        Self { attribute }
    }
}

impl ModelValidator for DataAnnotationsModelValidator {
    fn validate(
        &self,
        context: &ModelValidationContext<'_>,
    ) -> Result<Vec<ModelValidationResult>, ValidationError> {
        if self.attribute.is_valid(context.model) {
            return Ok(Vec::new());
        }
        let display_name = context.metadata.display_name_or_default();
        Ok(vec![ModelValidationResult::new(
            self.attribute.format_error_message(display_name),
        )])
    }
}

/// Runs a [`ValidatableObject`](crate::ValidatableObject)'s own validation.
#[derive(Debug)]
pub struct ValidatableObjectAdapter {
    validatable: Validatable,
}

impl ModelValidator for ValidatableObjectAdapter {
    fn validate(
        &self,
        context: &ModelValidationContext<'_>,
    ) -> Result<Vec<ModelValidationResult>, ValidationError> {
        if context.model.is_null() {
            return Ok(Vec::new());
        }
        self.validatable.run(context.model).map_err(|message| {
            ValidationError::validator_failed(self.validatable.type_name(), context.key, message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pallas_metadata::{ModelAttributes, ModelMetadataIdentity, Reflect};

    #[test]
    fn test_adapters_recognize_builtins() {
        let adapters = ValidationAttributeAdapters::default();
        assert!(adapters.is_validation_attribute(&Required::new()));
        assert!(adapters.is_validation_attribute(&Range::new(0.0, 1.0)));
        assert!(!adapters.is_validation_attribute(&ValidateNever));
        assert!(adapters.adapt(&StringLength::new(3)).is_some());
        assert!(ValidationAttributeAdapters::empty()
            .adapt(&StringLength::new(3))
            .is_none());
    }

    #[test]
    fn test_metadata_provider_sets_required_and_validators() {
        let info = String::type_info();
        let parameter = pallas_metadata::ParameterInfo::new("Users.Create", "name", info.clone())
            .attribute(Required::new())
            .attribute(StringLength::new(10))
            .attribute(ValidateNever);
        let attributes = ModelAttributes::for_parameter(&parameter);
        let key = ModelMetadataIdentity::for_parameter(info, "name", "Users.Create");
        let mut context = ValidationMetadataProviderContext::new(&key, &attributes);

        DefaultValidationMetadataProvider.create_validation_metadata(&mut context);
        DataAnnotationsMetadataProvider::default().create_validation_metadata(&mut context);

        let validation = context.validation_metadata;
        assert_eq!(validation.is_required, Some(true));
        assert_eq!(validation.should_validate, Some(false));
        assert_eq!(validation.validator_metadata.len(), 2);
    }
}
