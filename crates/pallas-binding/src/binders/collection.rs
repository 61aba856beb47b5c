//! Binding of enumerable types.

use super::{ModelBinder, SimpleTypeModelBinder};
use crate::context::{BoundModel, ModelBindingContext, ModelBindingResult};
use crate::error::BindingError;
use crate::value_provider::ValueProvider;
use pallas_core::{keys, BoxFuture};
use serde_json::Value;

/// Binds collections either from repeated values of one key
/// (`?ids=1&ids=2`) or from indexed keys (`lines[0].Sku`, `lines[1].Sku`).
///
/// Indexed binding stops at the first missing index. A top-level collection
/// with no values binds as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionModelBinder;

impl CollectionModelBinder {
    async fn bind_items(context: &mut ModelBindingContext<'_>) -> Result<Option<Vec<Value>>, BindingError> {
        let Some(element) = context.metadata().element_metadata().cloned() else {
            return Ok(None);
        };
        let model_name = context.model_name().to_string();

        let values = context.value_provider().get_value(&model_name);
        if !values.is_none() && !element.is_complex_type() {
            let mut items = Vec::with_capacity(values.len());
            for raw in values.values() {
                match SimpleTypeModelBinder::convert(&element, raw, context.messages()) {
                    Ok(item) => items.push(item),
                    Err(message) => {
                        context.model_state().add_model_error(model_name.clone(), message);
                    }
                }
            }
            context
                .model_state()
                .set_model_value(model_name, None, Some(values.to_string()));
            return Ok(Some(items));
        }

        let factory = context.factory();
        let binder = factory.create_binder_for(&element)?;
        let mut items = Vec::new();
        for index in 0.. {
            let item_name = keys::index(&model_name, index);
            if !context.value_provider().contains_prefix(&item_name) {
                break;
            }
            let mut item_context =
                context.nested(element.clone(), format!("[{index}]"), item_name);
            binder.bind_model(&mut item_context).await?;
            if let Some(BoundModel::Value(item)) = item_context.take_result().take() {
                items.push(item);
            }
        }

        if items.is_empty() && !context.is_top_level() {
            return Ok(None);
        }
        Ok(Some(items))
    }
}

impl ModelBinder for CollectionModelBinder {
    fn bind_model<'a>(
        &'a self,
        context: &'a mut ModelBindingContext<'_>,
    ) -> BoxFuture<'a, Result<(), BindingError>> {
        Box::pin(async move {
            let Some(items) = Self::bind_items(context).await? else {
                return Ok(());
            };
            match context.metadata().model_type().decode(Value::Array(items)) {
                Ok(model) => {
                    context.set_result(ModelBindingResult::success(BoundModel::Value(model)));
                }
                Err(message) => {
                    let key = context.model_name().to_string();
                    context.model_state().add_model_error(key, message);
                }
            }
            Ok(())
        })
    }
}
