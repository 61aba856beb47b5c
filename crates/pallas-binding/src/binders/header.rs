//! Binding from request headers.

use super::{ModelBinder, SimpleTypeModelBinder};
use crate::context::{BoundModel, ModelBindingContext, ModelBindingResult};
use crate::error::BindingError;
use pallas_core::BoxFuture;
use serde_json::Value;

/// Binds a scalar, or a collection of scalars, from a header.
///
/// The header name is the binder model name when set, else the field name.
/// Collections split comma-separated values.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderModelBinder;

impl ModelBinder for HeaderModelBinder {
    fn bind_model<'a>(
        &'a self,
        context: &'a mut ModelBindingContext<'_>,
    ) -> BoxFuture<'a, Result<(), BindingError>> {
        Box::pin(async move {
            let header_name = context
                .binder_model_name()
                .unwrap_or_else(|| context.field_name())
                .to_string();
            let model_name = context.model_name().to_string();
            let metadata = context.metadata().clone();
            let messages = context.messages();

            let raw: Vec<&str> = context
                .request()
                .headers()
                .get_all(header_name.as_str())
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect();
            if raw.is_empty() {
                return Ok(());
            }
            let attempted = raw.join(",");

            let converted = match metadata.element_metadata() {
                Some(element) => attempted
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| SimpleTypeModelBinder::convert(element, item, messages))
                    .collect::<Result<Vec<_>, _>>()
                    .and_then(|items| metadata.model_type().decode(Value::Array(items))),
                None => SimpleTypeModelBinder::convert(&metadata, &attempted, messages),
            };

            match converted {
                Ok(model) => {
                    context.model_state().set_model_value(
                        model_name,
                        Some(model.clone()),
                        Some(attempted),
                    );
                    context.set_result(ModelBindingResult::success(BoundModel::Value(model)));
                }
                Err(message) => {
                    tracing::debug!(header = %header_name, "header value conversion failed");
                    let state = context.model_state();
                    state.set_model_value(model_name.clone(), None, Some(attempted));
                    state.add_model_error(model_name, message);
                }
            }
            Ok(())
        })
    }
}
