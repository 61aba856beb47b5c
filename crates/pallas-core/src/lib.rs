//! # Pallas Core
//!
//! Core types shared by every Pallas crate:
//!
//! - [`PallasError`] - Errors returned to the host
//! - [`RequestId`] - UUID v7 request identifier
//! - [`ModelStateDictionary`] - Binding and validation state of a request
//! - [`RouteValues`] - Route values handed over by the router
//! - [`Services`] - Typed service registry

#![doc(html_root_url = "https://docs.rs/pallas-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod keys;
mod model_state;
mod request_id;
mod route;
pub mod services;

pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, PallasError, PallasResult};
pub use model_state::{
    ModelError, ModelErrorKind, ModelStateDictionary, ModelStateEntry, ValidationState,
    DEFAULT_MAX_ALLOWED_ERRORS, TOO_MANY_ERRORS_MESSAGE,
};
pub use request_id::RequestId;
pub use route::RouteValues;
pub use services::{ServiceError, Services};

use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future, used by every async extension point.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
