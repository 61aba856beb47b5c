//! Binding from the service registry.

use super::ModelBinder;
use crate::context::{BoundModel, ModelBindingContext, ModelBindingResult};
use crate::error::BindingError;
use pallas_core::{BoxFuture, ServiceError};

/// Resolves the model type from the request services.
///
/// A missing service is an error, not a model-state entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServicesModelBinder;

impl ModelBinder for ServicesModelBinder {
    fn bind_model<'a>(
        &'a self,
        context: &'a mut ModelBindingContext<'_>,
    ) -> BoxFuture<'a, Result<(), BindingError>> {
        Box::pin(async move {
            let model_type = context.metadata().model_type().clone();
            let service = context
                .services()
                .resolve_erased(model_type.type_id())
                .ok_or_else(|| ServiceError::not_registered_named(model_type.name()))?;
            context.set_result(ModelBindingResult::success(BoundModel::Service(service)));
            Ok(())
        })
    }
}
