//! # Pallas
//!
//! **MVC action pipeline: model binding, validation and filters**
//!
//! Pallas turns an application model (controllers, actions, parameters and
//! their attributes) into compiled action invokers, and runs one request
//! through them:
//!
//! - **Metadata** – Lazily computed, cached model metadata per type, property and parameter
//! - **Binding** – Route, query, header and body values bound into typed parameters
//! - **Validation** – Attribute validators walked over bound models into model state
//! - **Filters** – Authorization, resource, action, exception and result filters
//! - **Diagnostics** – Structured logs and metrics at every pipeline stage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pallas::prelude::*;
//!
//! let application = ApplicationModel::new().controller(
//!     ControllerModel::new(ControllerTypeInfo::of::<OrdersController>(), vec![])
//!         .action(ActionModel::new("Get", vec![]).with_method(get_order)),
//! );
//!
//! let mvc = Mvc::builder(application)
//!     .config(ConfigLoader::new().with_production().with_env_prefix("PALLAS").load()?)
//!     .services(services)
//!     .build()?;
//!
//! let response = mvc
//!     .handle("Orders.Get", request, route_values, CancellationToken::new())
//!     .await?;
//! ```
//!
//! ## Architecture
//!
//! The stages of one request run in a fixed order:
//!
//! ```text
//! Authorization → Resource → Model binding → Action → Result
//!                                 ↓             ↓
//!                                 └─ Exception ─┘
//! ```

#![doc(html_root_url = "https://docs.rs/pallas/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod mvc;
mod options;

pub use mvc::{Mvc, MvcBuilder, REQUEST_ID_HEADER};
pub use options::{binder_factory, telemetry_config};

// Re-export core types
pub use pallas_core as core;

// Re-export metadata types
pub use pallas_metadata as metadata;

// Re-export validation types
pub use pallas_validation as validation;

// Re-export binding types
pub use pallas_binding as binding;

// Re-export pipeline types
pub use pallas_pipeline as pipeline;

// Re-export application model types
pub use pallas_application as application;

// Re-export telemetry types
pub use pallas_telemetry as telemetry;

// Re-export configuration types
pub use pallas_config as config;

// Cancellation token accepted by `Mvc::handle`
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use pallas::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Mvc, MvcBuilder};
    pub use tokio_util::sync::CancellationToken;

    pub use pallas_core::{
        BoxFuture, ModelStateDictionary, PallasError, PallasResult, RequestId, RouteValues,
        Services,
    };

    // Re-export metadata attributes
    pub use pallas_metadata::{Attribute, BindFrom, Reflect, TypeInfo};

    // Re-export validation attributes
    pub use pallas_validation::{Range, Required};

    // Re-export application models
    pub use pallas_application::{
        ActionModel, ApplicationModel, AttributeRouteModel, ControllerModel, Conventions,
        ParameterModel, PropertyModel,
    };

    // Re-export pipeline types
    pub use pallas_pipeline::{
        ActionCall, ActionContext, ActionMethod, ActionResult, ContentResult, Controller,
        ControllerTypeInfo, FilterMetadata, HttpMethodConstraint, JsonResult, PipelineError,
        StatusCodeResult,
    };

    // Re-export configuration
    pub use pallas_config::{ConfigLoader, PallasConfig};
}
