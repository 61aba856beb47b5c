//! Property-wise binding of complex types.

use super::ModelBinder;
use crate::context::{BoundModel, ModelBindingContext, ModelBindingResult};
use crate::error::BindingError;
use pallas_core::{keys, BoxFuture};
use pallas_metadata::ModelMetadata;
use serde_json::{Map, Value};

/// Binds a complex type one property at a time, then normalizes the
/// assembled object through the type.
///
/// Properties with no value, or an empty one, keep the type's defaults.
/// A nested model with no values under its prefix (and no property bound
/// from a greedy source such as the body or a header) is left unbound.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexTypeModelBinder;

impl ComplexTypeModelBinder {
    fn can_bind_any(context: &ModelBindingContext<'_>) -> bool {
        if context.is_top_level() || context.has_values() {
            return true;
        }
        context.metadata().properties().iter().any(|property| {
            property.is_binding_allowed()
                && property.binding_source().is_some_and(|source| source.is_greedy())
        })
    }

    fn is_bindable(property: &ModelMetadata) -> bool {
        property.is_binding_allowed() && !(property.is_read_only() && !property.is_complex_type())
    }
}

impl ModelBinder for ComplexTypeModelBinder {
    fn bind_model<'a>(
        &'a self,
        context: &'a mut ModelBindingContext<'_>,
    ) -> BoxFuture<'a, Result<(), BindingError>> {
        Box::pin(async move {
            if !Self::can_bind_any(context) {
                return Ok(());
            }

            let metadata = context.metadata().clone();
            let model_name = context.model_name().to_string();
            let factory = context.factory();
            let mut object = match metadata.model_type().default_value() {
                Value::Object(map) => map,
                _ => Map::new(),
            };

            for property in metadata.properties() {
                if !Self::is_bindable(property) {
                    continue;
                }
                let name = property.name().unwrap_or_default();
                let field_name = property.binder_model_name().unwrap_or(name);
                let key = keys::property(&model_name, field_name);
                let binder = factory.create_binder_for(property)?;

                let mut nested = context.nested(property.clone(), field_name, key.clone());
                binder.bind_model(&mut nested).await?;
                match nested.take_result().take() {
                    // An empty value keeps the property's default.
                    Some(BoundModel::Value(Value::Null)) => {}
                    Some(BoundModel::Value(value)) => {
                        object.insert(name.to_string(), value);
                    }
                    Some(BoundModel::Service(_)) => {
                        tracing::debug!(property = name, "service properties are not stored on models");
                    }
                    None if property.is_binding_required() => {
                        let message = context.messages().missing_bind_required_value(field_name);
                        context.model_state().add_model_error(key, message);
                    }
                    None => {}
                }
            }

            match metadata.model_type().decode(Value::Object(object)) {
                Ok(model) => {
                    context.set_result(ModelBindingResult::success(BoundModel::Value(model)));
                }
                Err(message) => {
                    tracing::debug!(key = %model_name, error = %message, "complex model did not decode");
                    context.model_state().add_model_error(model_name, message);
                }
            }
            Ok(())
        })
    }
}
