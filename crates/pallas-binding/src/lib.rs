//! # Pallas Binding
//!
//! Model binding: turns request data into action arguments.
//!
//! - [`RequestContext`] - The buffered request binding reads from
//! - [`ValueProvider`] - Keyed values from route data and the query string
//! - [`InputFormatter`] - Reads request bodies (JSON, plain text)
//! - [`ModelBinder`] / [`ModelBinderFactory`] - Binder selection and execution
//! - [`ParameterBinder`] - Binds and validates one action parameter
//!
//! Bad input never fails binding. Conversion failures, unreadable bodies
//! and missing required values are recorded in the request's
//! [`ModelStateDictionary`](pallas_core::ModelStateDictionary) and the
//! parameter is left unbound.

#![doc(html_root_url = "https://docs.rs/pallas-binding/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod binders;
mod context;
mod error;
mod factory;
pub mod formatters;
mod messages;
mod parameter;
mod request;
mod value_provider;

pub use binders::{
    BodyModelBinder, CollectionModelBinder, ComplexTypeModelBinder, HeaderModelBinder,
    ModelBinder, ServicesModelBinder, SimpleTypeModelBinder,
};
pub use context::{BindingInfo, BoundModel, ModelBindingContext, ModelBindingResult};
pub use error::BindingError;
pub use factory::{
    ModelBinderFactory, ModelBinderFactoryBuilder, ModelBinderProvider,
    ModelBinderProviderContext, ModelBinderRegistry,
};
pub use formatters::{
    InputFormatter, InputFormatterContext, InputFormatterResult, JsonInputFormatter,
    PlainTextInputFormatter,
};
pub use messages::BindingMessages;
pub use parameter::{ParameterBinder, ParameterDescriptor};
pub use request::{RequestContext, RequestContextBuilder};
pub use value_provider::{
    CompositeValueProvider, QueryStringValueProvider, RouteValueProvider, ValueProvider,
    ValueProviderResult,
};
