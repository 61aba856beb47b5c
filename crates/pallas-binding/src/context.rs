//! Binding contexts and results.

use crate::factory::ModelBinderFactory;
use crate::messages::BindingMessages;
use crate::request::RequestContext;
use crate::value_provider::{CompositeValueProvider, ValueProvider};
use pallas_core::{ModelStateDictionary, Services};
use pallas_metadata::{BindingSource, ModelMetadata};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// A model produced by binding.
///
/// Request-sourced models are JSON values normalized through the declared
/// type; service parameters are the resolved service instance.
#[derive(Debug, Clone)]
pub enum BoundModel {
    /// A value read from the request.
    Value(Value),
    /// A service resolved from the registry.
    Service(Arc<dyn Any + Send + Sync>),
}

impl BoundModel {
    /// The JSON value, if this is a request value.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Service(_) => None,
        }
    }

    /// Downcasts a service model.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match self {
            Self::Service(service) => Arc::clone(service).downcast::<T>().ok(),
            Self::Value(_) => None,
        }
    }
}

/// Outcome of one binder invocation.
#[derive(Debug, Clone, Default)]
pub struct ModelBindingResult {
    model: Option<BoundModel>,
}

impl ModelBindingResult {
    /// A successful result.
    #[must_use]
    pub fn success(model: BoundModel) -> Self {
        Self { model: Some(model) }
    }

    /// No model was set.
    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }

    /// Whether a model was set.
    #[must_use]
    pub fn is_model_set(&self) -> bool {
        self.model.is_some()
    }

    /// The bound model.
    #[must_use]
    pub fn model(&self) -> Option<&BoundModel> {
        self.model.as_ref()
    }

    /// Takes the bound model out of the result.
    pub fn take(&mut self) -> Option<BoundModel> {
        self.model.take()
    }
}

/// How a parameter or property is bound.
///
/// Values come from the metadata of the member; a parameter descriptor may
/// override any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BindingInfo {
    /// Binding source.
    pub binding_source: Option<BindingSource>,
    /// Alternate model name.
    pub binder_model_name: Option<String>,
    /// Named binder.
    pub binder_type: Option<String>,
}

impl BindingInfo {
    /// Reads the binding facts of a metadata node.
    #[must_use]
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self {
            binding_source: metadata.binding_source(),
            binder_model_name: metadata.binder_model_name().map(str::to_string),
            binder_type: metadata.binder_type().map(str::to_string),
        }
    }

    /// Fills every unset field from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            binding_source: self.binding_source.or(fallback.binding_source),
            binder_model_name: self.binder_model_name.or(fallback.binder_model_name),
            binder_type: self.binder_type.or(fallback.binder_type),
        }
    }
}

/// Everything a binder needs for one model.
///
/// Nested contexts for properties and elements share the request, the model
/// state and the binder factory with their parent.
pub struct ModelBindingContext<'a> {
    request: &'a RequestContext,
    model_state: &'a mut ModelStateDictionary,
    value_provider: CompositeValueProvider,
    factory: &'a ModelBinderFactory,
    metadata: Arc<ModelMetadata>,
    model_name: String,
    field_name: String,
    binding_source: Option<BindingSource>,
    binder_model_name: Option<String>,
    is_top_level: bool,
    result: ModelBindingResult,
}

impl<'a> ModelBindingContext<'a> {
    /// Creates the context of a top-level model (an action parameter).
    #[must_use]
    pub fn top_level(
        request: &'a RequestContext,
        model_state: &'a mut ModelStateDictionary,
        value_provider: CompositeValueProvider,
        factory: &'a ModelBinderFactory,
        metadata: Arc<ModelMetadata>,
        binding_info: &BindingInfo,
        model_name: impl Into<String>,
    ) -> Self {
        let value_provider = filter_for(value_provider, binding_info.binding_source);
        Self {
            request,
            model_state,
            value_provider,
            factory,
            field_name: metadata.name().unwrap_or_default().to_string(),
            metadata,
            model_name: model_name.into(),
            binding_source: binding_info.binding_source,
            binder_model_name: binding_info.binder_model_name.clone(),
            is_top_level: true,
            result: ModelBindingResult::failed(),
        }
    }

    /// Creates the context of a nested model (a property or an element).
    pub fn nested(
        &mut self,
        metadata: Arc<ModelMetadata>,
        field_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> ModelBindingContext<'_> {
        let binding_info = BindingInfo::from_metadata(&metadata);
        let binding_source = binding_info.binding_source.or(self.binding_source);
        ModelBindingContext {
            request: self.request,
            model_state: &mut *self.model_state,
            value_provider: filter_for(self.value_provider.clone(), binding_info.binding_source),
            factory: self.factory,
            metadata,
            model_name: model_name.into(),
            field_name: field_name.into(),
            binding_source,
            binder_model_name: binding_info.binder_model_name,
            is_top_level: false,
            result: ModelBindingResult::failed(),
        }
    }

    /// The request.
    #[must_use]
    pub fn request(&self) -> &'a RequestContext {
        self.request
    }

    /// The request services.
    #[must_use]
    pub fn services(&self) -> &'a Services {
        self.request.services()
    }

    /// Model state shared by the whole request.
    pub fn model_state(&mut self) -> &mut ModelStateDictionary {
        &mut *self.model_state
    }

    /// Read-only model state.
    #[must_use]
    pub fn model_state_ref(&self) -> &ModelStateDictionary {
        &*self.model_state
    }

    /// Value providers visible to this model.
    #[must_use]
    pub fn value_provider(&self) -> &CompositeValueProvider {
        &self.value_provider
    }

    /// The binder factory, for nested models.
    #[must_use]
    pub fn factory(&self) -> &'a ModelBinderFactory {
        self.factory
    }

    /// Message templates.
    #[must_use]
    pub fn messages(&self) -> &'a BindingMessages {
        self.factory.messages()
    }

    /// Metadata of the model.
    #[must_use]
    pub fn metadata(&self) -> &Arc<ModelMetadata> {
        &self.metadata
    }

    /// The model-state key and value-provider prefix.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// The member name.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Binding source, inherited from the parent when unset.
    #[must_use]
    pub fn binding_source(&self) -> Option<BindingSource> {
        self.binding_source
    }

    /// Alternate model name.
    #[must_use]
    pub fn binder_model_name(&self) -> Option<&str> {
        self.binder_model_name.as_deref()
    }

    /// Whether this is an action parameter.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.is_top_level
    }

    /// Whether any value provider has values for this model.
    #[must_use]
    pub fn has_values(&self) -> bool {
        self.value_provider.contains_prefix(&self.model_name)
    }

    /// Records the result.
    pub fn set_result(&mut self, result: ModelBindingResult) {
        self.result = result;
    }

    /// The result so far.
    #[must_use]
    pub fn result(&self) -> &ModelBindingResult {
        &self.result
    }

    /// Takes the result out of the context.
    pub fn take_result(&mut self) -> ModelBindingResult {
        std::mem::take(&mut self.result)
    }
}

impl std::fmt::Debug for ModelBindingContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBindingContext")
            .field("model_name", &self.model_name)
            .field("metadata", &self.metadata.identity().to_string())
            .field("binding_source", &self.binding_source)
            .field("is_top_level", &self.is_top_level)
            .finish_non_exhaustive()
    }
}

fn filter_for(
    value_provider: CompositeValueProvider,
    source: Option<BindingSource>,
) -> CompositeValueProvider {
    match source {
        Some(source @ (BindingSource::Query | BindingSource::Path)) => value_provider.filter(source),
        _ => value_provider,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pallas_core::Services;

    #[derive(Debug)]
    struct Clock;

    #[test]
    fn test_bound_model_accessors() {
        let value = BoundModel::Value(serde_json::json!(3));
        assert_eq!(value.as_value(), Some(&serde_json::json!(3)));
        assert!(value.service::<Clock>().is_none());

        let service = BoundModel::Service(Arc::new(Clock));
        assert!(service.service::<Clock>().is_some());
        assert!(service.service::<Services>().is_none());
    }

    #[test]
    fn test_binding_info_override() {
        let descriptor = BindingInfo {
            binding_source: Some(BindingSource::Query),
            ..BindingInfo::default()
        };
        let metadata = BindingInfo {
            binding_source: Some(BindingSource::Body),
            binder_model_name: Some("item".into()),
            binder_type: None,
        };
        let merged = descriptor.or(metadata);
        assert_eq!(merged.binding_source, Some(BindingSource::Query));
        assert_eq!(merged.binder_model_name.as_deref(), Some("item"));
    }

    #[test]
    fn test_result_take() {
        let mut result = ModelBindingResult::success(BoundModel::Value(Value::Null));
        assert!(result.is_model_set());
        assert!(result.take().is_some());
        assert!(!result.is_model_set());
    }
}
