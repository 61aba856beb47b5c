//! Validator and validator-provider contracts.

use crate::error::ValidationError;
use pallas_metadata::{Attribute, ModelMetadata};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// What a validator sees when it runs.
#[derive(Debug, Clone, Copy)]
pub struct ModelValidationContext<'a> {
    /// Metadata of the node being validated.
    pub metadata: &'a ModelMetadata,
    /// The value being validated.
    pub model: &'a Value,
    /// The object holding the value, for properties.
    pub container: Option<&'a Value>,
    /// The model-state key of the value.
    pub key: &'a str,
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelValidationResult {
    /// Member the result applies to, relative to the validated value.
    /// Empty for the value itself.
    pub member_name: String,
    /// The error message.
    pub message: String,
}

impl ModelValidationResult {
    /// A result for the validated value itself.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            member_name: String::new(),
            message: message.into(),
        }
    }

    /// A result for a member of the validated value.
    #[must_use]
    pub fn for_member(member_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            member_name: member_name.into(),
            message: message.into(),
        }
    }
}

/// Validates one value.
///
/// Validators are stateless after construction and shared across requests.
/// Returning `Err` means the validator could not run; it aborts the pass.
pub trait ModelValidator: Send + Sync + fmt::Debug {
    /// Runs the validator.
    fn validate(
        &self,
        context: &ModelValidationContext<'_>,
    ) -> Result<Vec<ModelValidationResult>, ValidationError>;
}

/// A validator slot: the metadata it came from and, once a provider fills it,
/// the validator.
#[derive(Debug, Clone)]
pub struct ValidatorItem {
    /// The attribute the validator is derived from, if any.
    pub validator_metadata: Option<Arc<dyn Attribute>>,
    /// The validator.
    pub validator: Option<Arc<dyn ModelValidator>>,
    /// Whether the validator may be cached and shared.
    pub is_reusable: bool,
}

impl ValidatorItem {
    /// An empty slot for `metadata`.
    #[must_use]
    pub fn new(validator_metadata: Arc<dyn Attribute>) -> Self {
        Self {
            validator_metadata: Some(validator_metadata),
            validator: None,
            is_reusable: false,
        }
    }

    /// A filled slot with no source attribute.
    #[must_use]
    pub fn from_validator(validator: Arc<dyn ModelValidator>) -> Self {
        Self {
            validator_metadata: None,
            validator: Some(validator),
            is_reusable: true,
        }
    }
}

/// Context passed to [`ModelValidatorProvider::create_validators`].
#[derive(Debug)]
pub struct ModelValidatorProviderContext<'a> {
    /// Metadata of the node.
    pub metadata: &'a ModelMetadata,
    /// Slots, one per validator metadata entry, plus any a provider appended.
    pub results: Vec<ValidatorItem>,
}

impl<'a> ModelValidatorProviderContext<'a> {
    /// Creates a context with one empty slot per validator metadata entry.
    #[must_use]
    pub fn new(metadata: &'a ModelMetadata) -> Self {
        let results = metadata
            .validator_metadata()
            .iter()
            .cloned()
            .map(ValidatorItem::new)
            .collect();
        Self { metadata, results }
    }
}

/// Turns validator metadata into validators.
pub trait ModelValidatorProvider: Send + Sync {
    /// Fills the slots it understands and may append new ones.
    fn create_validators(&self, context: &mut ModelValidatorProviderContext<'_>);
}

/// Runs providers in registration order.
#[derive(Clone, Default)]
pub struct CompositeModelValidatorProvider {
    providers: Vec<Arc<dyn ModelValidatorProvider>>,
}

impl CompositeModelValidatorProvider {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider.
    #[must_use]
    pub fn with(mut self, provider: impl ModelValidatorProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Appends a shared provider.
    pub fn push(&mut self, provider: Arc<dyn ModelValidatorProvider>) {
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

impl ModelValidatorProvider for CompositeModelValidatorProvider {
    fn create_validators(&self, context: &mut ModelValidatorProviderContext<'_>) {
        for provider in &self.providers {
            provider.create_validators(context);
        }
    }
}

impl fmt::Debug for CompositeModelValidatorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeModelValidatorProvider")
            .field("providers", &self.providers.len())
            .finish()
    }
}
