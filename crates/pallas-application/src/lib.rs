//! # Pallas Application
//!
//! The application topology and its compilation into action descriptors.
//!
//! - [`ApplicationModel`] - Root of the topology, global filters and properties
//! - [`ControllerModel`] / [`ActionModel`] - Controllers, actions and their settings
//! - [`ParameterModel`], [`PropertyModel`], [`AttributeRouteModel`], [`ApiExplorerModel`] - Nested models
//! - [`Conventions`] - Adjust the model before it is compiled
//!
//! ## Example
//!
//! ```
//! use pallas_application::{ActionModel, ApplicationModel, ControllerModel};
//! use pallas_pipeline::{ActionMethod, ContentResult, ControllerTypeInfo};
//!
//! let application = ApplicationModel::new().controller(
//!     ControllerModel::new(ControllerTypeInfo::unit("HomeController"), vec![]).action(
//!         ActionModel::new("Index", vec![])
//!             .with_method(ActionMethod::from_fn(|_| async { Ok(ContentResult::new("hello")) })),
//!     ),
//! );
//!
//! let descriptors = application.build_descriptors().unwrap();
//! assert_eq!(descriptors[0].id, "Home.Index");
//! ```

#![doc(html_root_url = "https://docs.rs/pallas-application/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod build;
mod conventions;
mod models;
mod parts;

pub use build::{API_EXPLORER_GROUP, API_EXPLORER_VISIBLE};
pub use conventions::{
    ActionModelConvention, ApplicationModelConvention, ControllerModelConvention, Conventions,
    ParameterModelConvention,
};
pub use models::{ActionModel, ApplicationModel, ControllerModel};
pub use parts::{ApiExplorerModel, AttributeRouteModel, ParameterModel, PropertyModel};
