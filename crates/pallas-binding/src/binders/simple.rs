//! Binding of types that convert from a single string.

use super::ModelBinder;
use crate::context::{BoundModel, ModelBindingContext, ModelBindingResult};
use crate::error::BindingError;
use crate::messages::BindingMessages;
use crate::value_provider::ValueProvider;
use pallas_core::BoxFuture;
use pallas_metadata::{ModelMetadata, ScalarKind};
use serde_json::Value;

/// Binds scalars (numbers, booleans, strings, enums) from value providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTypeModelBinder;

/// Why a raw string did not convert.
enum Rejection {
    Invalid,
    NullForValueType,
}

impl SimpleTypeModelBinder {
    /// Converts a raw string to a model of the metadata's type.
    ///
    /// On failure, returns the model-state message for the value.
    pub fn convert(
        metadata: &ModelMetadata,
        raw: &str,
        messages: &BindingMessages,
    ) -> Result<Value, String> {
        match Self::try_convert(metadata, raw) {
            Ok(value) => Ok(value),
            Err(Rejection::Invalid) => {
                Err(messages.attempted_value_is_invalid(raw, metadata.display_name_or_default()))
            }
            Err(Rejection::NullForValueType) => Err(messages.value_must_not_be_null(raw)),
        }
    }

    fn try_convert(metadata: &ModelMetadata, raw: &str) -> Result<Value, Rejection> {
        let model_type = metadata.model_type();
        let scalar = model_type.scalar();
        let is_string = scalar == Some(ScalarKind::String);

        let empty = if is_string { raw.is_empty() } else { raw.trim().is_empty() };
        if empty && (!is_string || metadata.convert_empty_string_to_null()) {
            if !metadata.is_reference_or_nullable_type() {
                return Err(Rejection::NullForValueType);
            }
            return Ok(Value::Null);
        }

        let text = if is_string { raw } else { raw.trim() };
        let value = match scalar {
            Some(ScalarKind::Bool) => {
                if text.eq_ignore_ascii_case("true") {
                    Value::Bool(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Value::Bool(false)
                } else {
                    return Err(Rejection::Invalid);
                }
            }
            Some(ScalarKind::Integer) => text
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| Rejection::Invalid)?,
            Some(ScalarKind::Unsigned) => text
                .parse::<u64>()
                .map(Value::from)
                .map_err(|_| Rejection::Invalid)?,
            Some(ScalarKind::Float) => text
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or(Rejection::Invalid)?,
            Some(ScalarKind::Char) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::String(c.to_string()),
                    _ => return Err(Rejection::Invalid),
                }
            }
            Some(ScalarKind::Enum) => model_type
                .enum_values()
                .iter()
                .find(|v| v.name.eq_ignore_ascii_case(text) || v.value == text)
                .map(|v| Value::String(v.name.clone()))
                .ok_or(Rejection::Invalid)?,
            Some(ScalarKind::String) | None => Value::String(raw.to_string()),
        };

        model_type.decode(value).map_err(|_| Rejection::Invalid)
    }
}

impl ModelBinder for SimpleTypeModelBinder {
    fn bind_model<'a>(
        &'a self,
        context: &'a mut ModelBindingContext<'_>,
    ) -> BoxFuture<'a, Result<(), BindingError>> {
        Box::pin(async move {
            let model_name = context.model_name().to_string();
            let values = context.value_provider().get_value(&model_name);
            let Some(first) = values.first_value() else {
                return Ok(());
            };

            let attempted = values.to_string();
            let metadata = context.metadata().clone();
            match Self::convert(&metadata, first, context.messages()) {
                Ok(model) => {
                    context.model_state().set_model_value(
                        model_name,
                        Some(model.clone()),
                        Some(attempted),
                    );
                    context.set_result(ModelBindingResult::success(BoundModel::Value(model)));
                }
                Err(message) => {
                    tracing::debug!(key = %model_name, value = %attempted, "value conversion failed");
                    let state = context.model_state();
                    state.set_model_value(model_name.clone(), None, Some(attempted));
                    state.add_model_error(model_name, message);
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BindingInfo;
    use crate::factory::ModelBinderFactory;
    use crate::request::RequestContext;
    use crate::value_provider::CompositeValueProvider;
    use pallas_core::{ModelStateDictionary, RouteValues};
    use pallas_metadata::{
        DefaultModelMetadataProvider, EnumValue, ModelMetadataProvider, Reflect, TypeInfo,
    };
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    enum Color {
        Red,
        Blue,
    }

    impl Reflect for Color {
        fn type_info() -> TypeInfo {
            TypeInfo::builder::<Self>()
                .scalar(ScalarKind::Enum)
                .enum_values(vec![EnumValue::new("Red", "0"), EnumValue::new("Blue", "1")])
                .serde::<Self>()
                .build()
        }
    }

    fn convert<T: Reflect>(raw: &str) -> Result<Value, String> {
        let provider = DefaultModelMetadataProvider::with_defaults();
        let metadata = provider.get_metadata_for_type(&T::type_info());
        SimpleTypeModelBinder::convert(&metadata, raw, &BindingMessages::default())
    }

    #[test]
    fn test_numbers() {
        assert_eq!(convert::<i32>(" 42 "), Ok(Value::from(42)));
        assert_eq!(convert::<f64>("1.5"), Ok(Value::from(1.5)));
        assert_eq!(
            convert::<i32>("abc"),
            Err("The value 'abc' is not valid for i32.".to_string())
        );
        assert!(convert::<u8>("300").is_err());
        assert!(convert::<u32>("-1").is_err());
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(convert::<i32>(""), Err("The value '' is invalid.".to_string()));
        assert_eq!(convert::<Option<i32>>(""), Ok(Value::Null));
        assert_eq!(convert::<String>(""), Ok(Value::Null));
    }

    #[test]
    fn test_bool_char_enum() {
        assert_eq!(convert::<bool>("True"), Ok(Value::Bool(true)));
        assert_eq!(convert::<char>("x"), Ok(Value::from("x")));
        assert!(convert::<char>("xy").is_err());
        assert_eq!(convert::<Color>("blue"), Ok(Value::from("Blue")));
        assert_eq!(convert::<Color>("0"), Ok(Value::from("Red")));
        assert!(convert::<Color>("Green").is_err());
    }

    async fn bind<T: Reflect>(
        request: &RequestContext,
        model_state: &mut ModelStateDictionary,
        name: &str,
    ) -> Option<Value> {
        let provider = DefaultModelMetadataProvider::with_defaults();
        let metadata = provider.get_metadata_for_type(&T::type_info());
        let factory = ModelBinderFactory::new();
        let mut context = ModelBindingContext::top_level(
            request,
            model_state,
            CompositeValueProvider::for_request(request),
            &factory,
            metadata,
            &BindingInfo::default(),
            name,
        );
        SimpleTypeModelBinder.bind_model(&mut context).await.unwrap();
        context.result().model().and_then(BoundModel::as_value).cloned()
    }

    #[tokio::test]
    async fn test_bind_model_prefers_route_over_query() {
        let request = RequestContext::builder()
            .uri("/orders/7?id=9".parse().unwrap())
            .route_values(RouteValues::new().with("id", "7"))
            .build();
        let mut model_state = ModelStateDictionary::new();

        let bound = bind::<i32>(&request, &mut model_state, "id").await;

        assert_eq!(bound, Some(Value::from(7)));
        assert!(model_state.is_valid());
        assert_eq!(model_state.get("id").unwrap().attempted_value.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_bind_model_records_conversion_error() {
        let request = RequestContext::builder()
            .uri("/orders?id=abc".parse().unwrap())
            .build();
        let mut model_state = ModelStateDictionary::new();

        let bound = bind::<i32>(&request, &mut model_state, "id").await;

        assert_eq!(bound, None);
        let entry = model_state.get("id").unwrap();
        assert_eq!(entry.errors[0].message, "The value 'abc' is not valid for i32.");
    }

    #[tokio::test]
    async fn test_bind_model_without_value_leaves_result_unset() {
        let request = RequestContext::builder().build();
        let mut model_state = ModelStateDictionary::new();

        assert_eq!(bind::<i32>(&request, &mut model_state, "id").await, None);
        assert!(model_state.is_empty());
    }
}
