//! Model binders.
//!
//! A binder reads one model from the request. Bad input never fails a
//! binder: it records an error in model state and leaves the result unset.
//! An `Err` means binding could not run and surfaces as an unhandled error.

mod body;
mod collection;
mod complex;
mod header;
mod services;
mod simple;

pub use body::BodyModelBinder;
pub use collection::CollectionModelBinder;
pub use complex::ComplexTypeModelBinder;
pub use header::HeaderModelBinder;
pub use services::ServicesModelBinder;
pub use simple::SimpleTypeModelBinder;

use crate::context::ModelBindingContext;
use crate::error::BindingError;
use pallas_core::BoxFuture;
use std::fmt;

/// Binds one model.
///
/// # Example
///
/// ```
/// use pallas_binding::{BindingError, BoundModel, ModelBinder, ModelBindingContext, ModelBindingResult};
/// use pallas_core::BoxFuture;
///
/// #[derive(Debug)]
/// struct AlwaysSeven;
///
/// impl ModelBinder for AlwaysSeven {
///     fn bind_model<'a>(
///         &'a self,
///         context: &'a mut ModelBindingContext<'_>,
///     ) -> BoxFuture<'a, Result<(), BindingError>> {
///         Box::pin(async move {
///             context.set_result(ModelBindingResult::success(BoundModel::Value(7.into())));
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait ModelBinder: Send + Sync + fmt::Debug {
    /// Binds the model described by `context`, setting its result or
    /// recording errors in model state.
    fn bind_model<'a>(
        &'a self,
        context: &'a mut ModelBindingContext<'_>,
    ) -> BoxFuture<'a, Result<(), BindingError>>;
}
