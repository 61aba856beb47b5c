//! # Pallas Pipeline
//!
//! The per-request state machine that invokes an action.
//!
//! - [`Pipeline`] / [`ActionInvoker`] - Runs filters, binding, the action and its result
//! - [`filters`] - Authorization, resource, action, exception and result filters
//! - [`ControllerActivator`] - Creates and releases controller instances
//! - [`ActionResult`] - Writes the response
//! - [`ConsumesConstraint`] / [`ConsumesFilter`] - Restrict an action to request media types
//! - [`diagnostics`] - Named events around every stage
//!
//! ## Stage order
//!
//! Authorization filters run first; a result set by one of them is executed
//! and nothing else runs. Resource filters wrap the rest. Inside them,
//! parameters are bound, then action filters wrap the action method.
//! Errors from binding and the action go to exception filters, and the
//! final result runs wrapped by result filters.
//!
//! Cancelling the request's token stops the pipeline before the next
//! binding, action or result step. Post-hooks of filters already entered
//! still run.

#![doc(html_root_url = "https://docs.rs/pallas-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod consumes;
mod context;
mod controller;
mod descriptor;
pub mod diagnostics;
mod error;
pub mod filters;
mod invoker;
mod results;

pub use consumes::{consumes, ConsumesConstraint, ConsumesFilter, MediaTypeSet};
pub use context::{ActionArguments, ActionContext, ActionResponse};
pub use controller::{
    Controller, ControllerActivator, ControllerInstance, ControllerTypeInfo,
    DefaultControllerActivator,
};
pub use descriptor::{
    ActionCall, ActionConstraint, ActionDescriptor, ActionMethod, HttpMethodConstraint,
    SharedModelState,
};
pub use diagnostics::{DiagnosticEvent, DiagnosticListener, Diagnostics, EventDetail, PipelineStage};
pub use error::PipelineError;
pub use filters::{sort_filters, FilterDescriptor, FilterFactory, FilterMetadata, FilterScope};
pub use invoker::{ActionInvoker, ActionNext, Pipeline, PipelineBuilder, ResourceNext, ResultNext};
pub use results::{
    ActionResult, BadRequestObjectResult, BoxedResult, ContentResult, EmptyResult, JsonResult,
    ObjectResult, StatusCodeResult, UnsupportedMediaTypeResult,
};
