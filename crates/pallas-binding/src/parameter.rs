//! Binding and validation of action parameters.

use crate::context::{BindingInfo, BoundModel, ModelBindingContext, ModelBindingResult};
use crate::error::BindingError;
use crate::factory::ModelBinderFactory;
use crate::request::RequestContext;
use crate::value_provider::{CompositeValueProvider, ValueProvider};
use pallas_core::ModelStateDictionary;
use pallas_metadata::{ModelMetadata, ModelMetadataProvider, ParameterInfo};
use pallas_validation::{ValidationVisitor, ValidatorCache};
use serde_json::Value;
use std::sync::Arc;

/// An action parameter as the pipeline binds it.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    /// The parameter name.
    pub name: String,
    /// The reflected parameter.
    pub parameter_info: ParameterInfo,
    /// Binding overrides, taking precedence over attribute-derived facts.
    pub binding_info: Option<BindingInfo>,
}

impl ParameterDescriptor {
    /// Describes a parameter with no binding overrides.
    #[must_use]
    pub fn new(parameter_info: ParameterInfo) -> Self {
        Self {
            name: parameter_info.name().to_string(),
            parameter_info,
            binding_info: None,
        }
    }

    /// Sets binding overrides.
    #[must_use]
    pub fn with_binding_info(mut self, binding_info: BindingInfo) -> Self {
        self.binding_info = Some(binding_info);
        self
    }
}

/// Binds one parameter, then validates what was bound.
///
/// Binding problems are recorded in model state; only failures of the
/// machinery itself (no binder, missing service, a validator error) are
/// returned as `Err`.
#[derive(Clone)]
pub struct ParameterBinder {
    metadata_provider: Arc<dyn ModelMetadataProvider>,
    factory: Arc<ModelBinderFactory>,
    validator_cache: Arc<ValidatorCache>,
    max_validation_depth: Option<usize>,
}

impl ParameterBinder {
    /// Creates a parameter binder.
    #[must_use]
    pub fn new(
        metadata_provider: Arc<dyn ModelMetadataProvider>,
        factory: Arc<ModelBinderFactory>,
        validator_cache: Arc<ValidatorCache>,
    ) -> Self {
        Self {
            metadata_provider,
            factory,
            validator_cache,
            max_validation_depth: None,
        }
    }

    /// Limits how deep validation descends.
    #[must_use]
    pub fn max_validation_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_validation_depth = max_depth;
        self
    }

    /// The binder factory.
    #[must_use]
    pub fn factory(&self) -> &Arc<ModelBinderFactory> {
        &self.factory
    }

    /// Metadata of a parameter.
    #[must_use]
    pub fn metadata_for(&self, parameter: &ParameterDescriptor) -> Arc<ModelMetadata> {
        self.metadata_provider
            .get_metadata_for_parameter(&parameter.parameter_info)
    }

    /// Binds and validates `parameter`.
    ///
    /// The model name is the binder model name if one is set. Otherwise it
    /// is the parameter name when a value provider has values under it, and
    /// the empty prefix when none does, so `?Status=open` binds a `filter`
    /// parameter's `Status` property.
    pub async fn bind_model(
        &self,
        request: &RequestContext,
        model_state: &mut ModelStateDictionary,
        value_provider: &CompositeValueProvider,
        parameter: &ParameterDescriptor,
    ) -> Result<ModelBindingResult, BindingError> {
        let metadata = self.metadata_for(parameter);
        let binding_info = parameter
            .binding_info
            .clone()
            .unwrap_or_default()
            .or(BindingInfo::from_metadata(&metadata));
        let binder = self.factory.create_binder(&metadata, &binding_info)?;

        let model_name = match binding_info.binder_model_name.as_deref() {
            Some(name) => name.to_string(),
            None => {
                let greedy = binding_info
                    .binding_source
                    .is_some_and(|source| source.is_greedy());
                if greedy || value_provider.contains_prefix(&parameter.name) {
                    parameter.name.clone()
                } else {
                    String::new()
                }
            }
        };

        tracing::debug!(
            parameter = %parameter.name,
            model_name = %model_name,
            binder = ?binder,
            "binding parameter"
        );
        let result = {
            let mut context = ModelBindingContext::top_level(
                request,
                model_state,
                value_provider.clone(),
                &self.factory,
                metadata.clone(),
                &binding_info,
                model_name.clone(),
            );
            binder.bind_model(&mut context).await?;
            context.take_result()
        };

        match result.model() {
            Some(BoundModel::Value(model)) => {
                self.validate(model_state, &metadata, &model_name, model)?;
            }
            Some(BoundModel::Service(_)) => {}
            None if metadata.is_binding_required() => {
                let message = self
                    .factory
                    .messages()
                    .missing_bind_required_value(&parameter.name);
                model_state.add_model_error(model_name, message);
            }
            None if metadata.validation_metadata().is_required == Some(true) => {
                self.validate(model_state, &metadata, &model_name, &Value::Null)?;
            }
            None => {}
        }

        if !result.is_model_set() {
            tracing::debug!(parameter = %parameter.name, "parameter left unbound");
        }
        Ok(result)
    }

    fn validate(
        &self,
        model_state: &mut ModelStateDictionary,
        metadata: &ModelMetadata,
        key: &str,
        model: &Value,
    ) -> Result<bool, BindingError> {
        let mut visitor = ValidationVisitor::new(&self.validator_cache, model_state)
            .max_depth(self.max_validation_depth);
        Ok(visitor.validate(metadata, key, model)?)
    }
}

impl std::fmt::Debug for ParameterBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterBinder")
            .field("factory", &self.factory)
            .field("max_validation_depth", &self.max_validation_depth)
            .finish_non_exhaustive()
    }
}
