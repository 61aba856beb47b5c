//! # Pallas Validation
//!
//! Validator resolution and execution over the metadata graph.
//!
//! - [`ModelValidatorProvider`] - Turns validator metadata into validators
//! - [`ValidatorCache`] - Resolves validators once per metadata node
//! - [`ValidationVisitor`] - Validates a bound value depth-first into model state
//! - [`annotations`] - Declarative rules such as [`Required`] and [`Range`]

#![doc(html_root_url = "https://docs.rs/pallas-validation/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod annotations;
mod cache;
mod error;
mod providers;
mod validator;
mod visitor;

pub use annotations::{
    EmailAddress, MaxLength, MinLength, Range, RegularExpression, Required, StringLength,
    Validatable, ValidatableObject, ValidateNever, ValidationAttribute, ValidatorAttribute,
};
pub use cache::ValidatorCache;
pub use error::ValidationError;
pub use providers::{
    DataAnnotationsMetadataProvider, DataAnnotationsModelValidator,
    DataAnnotationsModelValidatorProvider, DefaultModelValidatorProvider,
    DefaultValidationMetadataProvider, ValidatableObjectAdapter, ValidationAttributeAdapters,
};
pub use validator::{
    CompositeModelValidatorProvider, ModelValidationContext, ModelValidationResult,
    ModelValidator, ModelValidatorProvider, ModelValidatorProviderContext, ValidatorItem,
};
pub use visitor::ValidationVisitor;

use pallas_metadata::CompositeMetadataDetailsProvider;

/// The framework's details providers and validator providers.
///
/// The details composite holds the default binding and display providers
/// followed by both validation details providers; the validator composite
/// runs [`DefaultModelValidatorProvider`] then
/// [`DataAnnotationsModelValidatorProvider`].
#[must_use]
pub fn validator_providers() -> (CompositeMetadataDetailsProvider, CompositeModelValidatorProvider) {
    let adapters = ValidationAttributeAdapters::default();
    let details = CompositeMetadataDetailsProvider::with_defaults()
        .with(DefaultValidationMetadataProvider)
        .with(DataAnnotationsMetadataProvider::new(adapters.clone()));
    let validators = CompositeModelValidatorProvider::new()
        .with(DefaultModelValidatorProvider)
        .with(DataAnnotationsModelValidatorProvider::new(adapters));
    (details, validators)
}
