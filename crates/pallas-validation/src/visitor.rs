//! Depth-first validation of a bound object graph.

use crate::cache::ValidatorCache;
use crate::error::ValidationError;
use crate::validator::ModelValidationContext;
use pallas_core::{keys, ModelStateDictionary, ValidationState};
use pallas_metadata::ModelMetadata;
use serde_json::Value;

/// Walks a bound value with its metadata and records failures in model state.
///
/// Children are visited before their parent, and a parent's own validators
/// run only when every child is valid. Keys already marked invalid (usually
/// by binding) are not validated again.
///
/// # Example
///
/// ```
/// use pallas_core::ModelStateDictionary;
/// use pallas_metadata::{DefaultModelMetadataProvider, Reflect};
/// use pallas_validation::{ValidationVisitor, ValidatorCache, validator_providers};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let (details, validators) = validator_providers();
/// let metadata_provider = DefaultModelMetadataProvider::new(Arc::new(details));
/// let cache = ValidatorCache::new(Arc::new(validators));
/// let mut state = ModelStateDictionary::new();
///
/// let metadata = metadata_provider.metadata_for::<i32>();
/// let valid = ValidationVisitor::new(&cache, &mut state)
///     .validate(&metadata, "id", &json!(5))
///     .unwrap();
/// assert!(valid);
/// ```
#[derive(Debug)]
pub struct ValidationVisitor<'a> {
    cache: &'a ValidatorCache,
    model_state: &'a mut ModelStateDictionary,
    max_depth: Option<usize>,
    depth: usize,
}

impl<'a> ValidationVisitor<'a> {
    /// Creates a visitor recording into `model_state`.
    #[must_use]
    pub fn new(cache: &'a ValidatorCache, model_state: &'a mut ModelStateDictionary) -> Self {
        Self {
            cache,
            model_state,
            max_depth: None,
            depth: 0,
        }
    }

    /// Limits how deep the walk may go. `None` means unlimited.
    #[must_use]
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validates `model` under `key`. Returns whether the value is valid.
    ///
    /// A `null` top-level value that is not required counts as valid without
    /// running any validator.
    pub fn validate(
        &mut self,
        metadata: &ModelMetadata,
        key: &str,
        model: &Value,
    ) -> Result<bool, ValidationError> {
        if model.is_null() && !metadata.is_required() {
            self.mark_existing_valid(key);
            return Ok(true);
        }
        self.visit(metadata, key, model, None)
    }

    fn visit(
        &mut self,
        metadata: &ModelMetadata,
        key: &str,
        model: &Value,
        container: Option<&Value>,
    ) -> Result<bool, ValidationError> {
        if let Some(max_depth) = self.max_depth {
            if self.depth >= max_depth {
                return Err(ValidationError::MaxDepthExceeded {
                    max_depth,
                    type_name: metadata.model_type().name().to_string(),
                });
            }
        }

        if !metadata.should_validate() {
            self.suppress(key);
            return Ok(true);
        }

        self.depth += 1;
        let result = if metadata.is_complex_type() || metadata.is_enumerable_type() {
            self.visit_complex(metadata, key, model, container)
        } else {
            self.visit_simple(metadata, key, model, container)
        };
        self.depth -= 1;
        result
    }

    fn visit_complex(
        &mut self,
        metadata: &ModelMetadata,
        key: &str,
        model: &Value,
        container: Option<&Value>,
    ) -> Result<bool, ValidationError> {
        let mut is_valid = true;
        if !model.is_null() {
            if metadata.validate_children() {
                is_valid = self.visit_children(metadata, key, model)?;
            } else {
                self.suppress(key);
            }
        }

        if is_valid && !self.model_state.has_reached_max_errors() {
            is_valid &= self.validate_node(metadata, key, model, container)?;
        }
        Ok(is_valid)
    }

    fn visit_children(
        &mut self,
        metadata: &ModelMetadata,
        key: &str,
        model: &Value,
    ) -> Result<bool, ValidationError> {
        let mut is_valid = true;
        match model {
            Value::Array(items) => {
                let Some(element) = metadata.element_metadata() else {
                    return Ok(true);
                };
                for (i, item) in items.iter().enumerate() {
                    is_valid &= self.visit(element, &keys::index(key, i), item, Some(model))?;
                }
            }
            Value::Object(object) => {
                for property in metadata.properties() {
                    let Some(name) = property.name() else {
                        continue;
                    };
                    let value = object
                        .get(name)
                        .or_else(|| {
                            object
                                .iter()
                                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                                .map(|(_, v)| v)
                        })
                        .unwrap_or(&Value::Null);
                    is_valid &= self.visit(property, &keys::property(key, name), value, Some(model))?;
                }
            }
            _ => {}
        }
        Ok(is_valid)
    }

    fn visit_simple(
        &mut self,
        metadata: &ModelMetadata,
        key: &str,
        model: &Value,
        container: Option<&Value>,
    ) -> Result<bool, ValidationError> {
        if self.model_state.has_reached_max_errors() {
            self.suppress(key);
            return Ok(false);
        }
        self.validate_node(metadata, key, model, container)
    }

    fn validate_node(
        &mut self,
        metadata: &ModelMetadata,
        key: &str,
        model: &Value,
        container: Option<&Value>,
    ) -> Result<bool, ValidationError> {
        if self.model_state.validation_state_of(key) != ValidationState::Invalid {
            let validators = self.cache.get_validators(metadata);
            if !validators.is_empty() {
                let context = ModelValidationContext {
                    metadata,
                    model,
                    container,
                    key,
                };
                let mut results = Vec::new();
                for validator in validators.iter() {
                    results.extend(validator.validate(&context)?);
                }
                for result in results {
                    let error_key = keys::property(key, &result.member_name);
                    tracing::debug!(key = %error_key, message = %result.message, "validation failed");
                    self.model_state.add_model_error(error_key, result.message);
                }
            }
        }

        if self.model_state.field_validation_state(key) == ValidationState::Invalid {
            return Ok(false);
        }
        self.mark_existing_valid(key);
        Ok(true)
    }

    fn mark_existing_valid(&mut self, key: &str) {
        if self.model_state.get(key).is_some() {
            self.model_state.mark_field_valid(key);
        }
    }

    fn suppress(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }
        self.model_state.mark_field_skipped(key);
        self.model_state.mark_skipped_under(key);
    }
}
