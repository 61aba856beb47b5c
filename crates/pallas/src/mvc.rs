//! The host-facing application.
//!
//! [`Mvc`] owns the compiled invokers of an application. It is built once
//! from an [`ApplicationModel`] and then answers requests with
//! [`Mvc::handle`]. Routing is the host's job: the host passes the id of the
//! selected action and the route values it matched.

use crate::options::{binder_factory, max_validation_depth, telemetry_config};
use bytes::Bytes;
use http_body_util::Full;
use indexmap::IndexMap;
use pallas_application::{ApplicationModel, Conventions};
use pallas_binding::{ModelBinderFactory, ParameterBinder, RequestContext};
use pallas_config::PallasConfig;
use pallas_core::{ModelStateDictionary, PallasError, RequestId, RouteValues, Services};
use pallas_metadata::DefaultModelMetadataProvider;
use pallas_pipeline::filters::{ModelStateInvalidFilter, UnsupportedContentTypeFilter};
use pallas_pipeline::{
    ActionContext, ActionDescriptor, ActionInvoker, ControllerActivator, DiagnosticListener,
    FilterMetadata, Pipeline, PipelineBuilder,
};
use pallas_telemetry::TelemetryConfig;
use pallas_validation::{validator_providers, ValidatorCache};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Header carrying the request id, read from requests and echoed on responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

struct MvcInner {
    actions: IndexMap<String, Vec<ActionInvoker>>,
    services: Arc<Services>,
    config: PallasConfig,
    telemetry: TelemetryConfig,
    pipeline: Pipeline,
}

/// A compiled application.
///
/// Cheap to clone; clones share the invokers.
///
/// # Example
///
/// ```
/// use pallas::prelude::*;
/// use pallas::Mvc;
///
/// # tokio_test::block_on(async {
/// let application = ApplicationModel::new().controller(
///     ControllerModel::new(ControllerTypeInfo::unit("HealthController"), vec![]).action(
///         ActionModel::new("Get", vec![]).with_method(ActionMethod::from_fn(|_| async {
///             Ok(ContentResult::new("ok"))
///         })),
///     ),
/// );
///
/// let mvc = Mvc::builder(application).build()?;
/// let request = http::Request::new(http_body_util::Full::new(bytes::Bytes::new()));
/// let response = mvc
///     .handle("Health.Get", request, RouteValues::new(), CancellationToken::new())
///     .await?;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// # Ok::<(), PallasError>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Mvc {
    inner: Arc<MvcInner>,
}

impl Mvc {
    /// Starts configuring an application.
    #[must_use]
    pub fn builder(application: ApplicationModel) -> MvcBuilder {
        MvcBuilder {
            application,
            conventions: Conventions::new(),
            config: PallasConfig::default(),
            services: Arc::new(Services::new()),
            listeners: Vec::new(),
            binder_factory: None,
            activator: None,
        }
    }

    /// Runs the action `action_id` for one request.
    ///
    /// When several descriptors share the id (an action reachable through
    /// more than one route), the first whose constraints accept the request
    /// runs. If none does, the first one whose constraints allow a fallback
    /// (such as a [`ConsumesConstraint`](pallas_pipeline::ConsumesConstraint))
    /// runs and rejects the request through its filters. Filters that produce a result are not errors: a 400 from the
    /// model-state filter comes back as `Ok`.
    ///
    /// # Errors
    ///
    /// - [`PallasError::NotFound`] when no descriptor has the id, or none accepts the request
    /// - [`PallasError::Canceled`] when `cancellation` fired before the pipeline finished
    /// - [`PallasError::Internal`] for errors no exception filter handled
    pub async fn handle(
        &self,
        action_id: &str,
        request: http::Request<Full<Bytes>>,
        route_values: RouteValues,
        cancellation: CancellationToken,
    ) -> Result<http::Response<Full<Bytes>>, PallasError> {
        let Some(candidates) = self.inner.actions.get(action_id) else {
            tracing::debug!(action_id, "no action registered under id");
            return Err(PallasError::not_found(format!(
                "No action with id '{action_id}'."
            )));
        };

        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();
        let request =
            RequestContext::from_http(request, route_values, Arc::clone(&self.inner.services))
                .await;

        let Some(invoker) = candidates
            .iter()
            .find(|invoker| invoker.descriptor().accepts(&request))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|invoker| invoker.descriptor().accepts_as_fallback(&request))
            })
        else {
            tracing::debug!(
                action_id,
                method = %request.method(),
                path = request.uri().path(),
                candidates = candidates.len(),
                "no candidate accepted the request"
            );
            return Err(PallasError::not_found(format!(
                "No candidate of action '{action_id}' accepts {} {}.",
                request.method(),
                request.uri().path()
            )));
        };

        let mut context = ActionContext::new(Arc::clone(invoker.descriptor()), request)
            .with_request_id(request_id)
            .with_cancellation(cancellation)
            .with_model_state(ModelStateDictionary::with_max_errors(
                self.inner.config.mvc.max_model_validation_errors,
            ));

        invoker.invoke(&mut context).await?;

        let mut response = context.into_response().into_http();
        if let Ok(value) = http::HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Ok(response)
    }

    /// Ids of every registered action, in registration order.
    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.inner.actions.keys().map(String::as_str)
    }

    /// Descriptors registered under `action_id`.
    #[must_use]
    pub fn descriptors(&self, action_id: &str) -> Vec<Arc<ActionDescriptor>> {
        self.inner
            .actions
            .get(action_id)
            .map(|invokers| {
                invokers
                    .iter()
                    .map(|invoker| Arc::clone(invoker.descriptor()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `true` if an action is registered under `action_id`.
    #[must_use]
    pub fn contains(&self, action_id: &str) -> bool {
        self.inner.actions.contains_key(action_id)
    }

    /// The configuration the application was built with.
    #[must_use]
    pub fn config(&self) -> &PallasConfig {
        &self.inner.config
    }

    /// Telemetry options derived from the configuration.
    ///
    /// Hand `logging` to [`pallas_telemetry::init_logging`] once per process
    /// to install a subscriber.
    #[must_use]
    pub fn telemetry(&self) -> &TelemetryConfig {
        &self.inner.telemetry
    }

    /// The shared pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }
}

impl std::fmt::Debug for Mvc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mvc")
            .field("actions", &self.inner.actions.keys().collect::<Vec<_>>())
            .field("pipeline", &self.inner.pipeline)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Mvc`].
pub struct MvcBuilder {
    application: ApplicationModel,
    conventions: Conventions,
    config: PallasConfig,
    services: Arc<Services>,
    listeners: Vec<Arc<dyn DiagnosticListener>>,
    binder_factory: Option<ModelBinderFactory>,
    activator: Option<ConfigurePipeline>,
}

type ConfigurePipeline = Box<dyn FnOnce(PipelineBuilder) -> PipelineBuilder + Send>;

impl MvcBuilder {
    /// Conventions applied to a copy of the application model.
    #[must_use]
    pub fn conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: PallasConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the request services controllers and parameters resolve from.
    #[must_use]
    pub fn services(mut self, services: Arc<Services>) -> Self {
        self.services = services;
        self
    }

    /// Adds a diagnostic listener next to the configured ones.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn DiagnosticListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Replaces the binder factory built from the `[binding]` section.
    #[must_use]
    pub fn binder_factory(mut self, factory: ModelBinderFactory) -> Self {
        self.binder_factory = Some(factory);
        self
    }

    /// Replaces the controller activator.
    #[must_use]
    pub fn activator(mut self, activator: impl ControllerActivator + 'static) -> Self {
        self.activator = Some(Box::new(move |builder| builder.activator(activator)));
        self
    }

    /// Validates the configuration and compiles every action.
    ///
    /// The built-in filters for unsupported content types and invalid model
    /// state are registered globally unless the `[mvc]` section suppresses
    /// them, before conventions run. The model passed to
    /// [`Mvc::builder`] is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PallasError::Configuration`] if the configuration is invalid
    /// or an action cannot be compiled.
    pub fn build(self) -> Result<Mvc, PallasError> {
        self.config
            .validate()
            .map_err(|e| PallasError::configuration(e.to_string()))?;

        let mut application = self.application.deep_clone();
        let mut builtin = Vec::new();
        if !self.config.mvc.suppress_unsupported_media_type_filter {
            builtin.push(FilterMetadata::action(UnsupportedContentTypeFilter));
        }
        if !self.config.mvc.suppress_model_state_invalid_filter {
            builtin.push(FilterMetadata::action(ModelStateInvalidFilter));
        }
        application.filters.splice(0..0, builtin);
        self.conventions.apply(&mut application);

        let descriptors = application.build_descriptors()?;

        let (details, validators) = validator_providers();
        let factory = self
            .binder_factory
            .unwrap_or_else(|| binder_factory(&self.config.binding));
        let binder = ParameterBinder::new(
            DefaultModelMetadataProvider::new(Arc::new(details)),
            Arc::new(factory),
            Arc::new(ValidatorCache::new(Arc::new(validators))),
        )
        .max_validation_depth(max_validation_depth(&self.config));

        let telemetry = telemetry_config(&self.config.telemetry);
        let mut diagnostics = telemetry.diagnostics();
        for listener in self.listeners {
            diagnostics.add(listener);
        }
        let mut pipeline = Pipeline::builder(binder).diagnostics(diagnostics);
        if let Some(activator) = self.activator {
            pipeline = activator(pipeline);
        }
        let pipeline = pipeline.build();

        let mut actions: IndexMap<String, Vec<ActionInvoker>> = IndexMap::new();
        for descriptor in descriptors {
            let invoker = pipeline.invoker(Arc::new(descriptor));
            actions
                .entry(invoker.descriptor().id.clone())
                .or_default()
                .push(invoker);
        }

        tracing::info!(
            actions = actions.len(),
            listeners = pipeline.diagnostics().len(),
            service = %telemetry.service_name,
            "mvc application built"
        );

        Ok(Mvc {
            inner: Arc::new(MvcInner {
                actions,
                services: self.services,
                config: self.config,
                telemetry,
                pipeline,
            }),
        })
    }
}

impl std::fmt::Debug for MvcBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MvcBuilder")
            .field("controllers", &self.application.controllers.len())
            .field("conventions", &self.conventions.len())
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pallas_application::{ActionModel, ControllerModel};
    use pallas_pipeline::{ActionMethod, ContentResult, ControllerTypeInfo, HttpMethodConstraint};

    fn text(value: &'static str) -> ActionMethod {
        ActionMethod::from_fn(move |_| async move { Ok(ContentResult::new(value)) })
    }

    fn application() -> ApplicationModel {
        ApplicationModel::new().controller(
            ControllerModel::new(ControllerTypeInfo::unit("HomeController"), vec![])
                .action(
                    ActionModel::new("Index", vec![])
                        .with_method(text("get"))
                        .constraint(Arc::new(HttpMethodConstraint::new([http::Method::GET]))),
                )
                .action(ActionModel::new("About", vec![]).with_method(text("about"))),
        )
    }

    fn get() -> http::Request<Full<Bytes>> {
        http::Request::new(Full::new(Bytes::new()))
    }

    #[test]
    fn test_build_registers_builtin_filters() {
        let mvc = Mvc::builder(application()).build().unwrap();
        let descriptor = &mvc.descriptors("Home.Index")[0];
        assert_eq!(descriptor.filters.len(), 2);
        assert_eq!(mvc.action_ids().collect::<Vec<_>>(), ["Home.Index", "Home.About"]);
    }

    #[test]
    fn test_build_suppresses_builtin_filters() {
        let mut config = PallasConfig::default();
        config.mvc.suppress_unsupported_media_type_filter = true;
        config.mvc.suppress_model_state_invalid_filter = true;
        let mvc = Mvc::builder(application()).config(config).build().unwrap();
        assert!(mvc.descriptors("Home.Index")[0].filters.is_empty());
    }

    #[test]
    fn test_build_leaves_model_untouched() {
        let application = application();
        let conventions = Conventions::new()
            .controller(|controller: &mut ControllerModel| controller.controller_name = "Start".to_string());
        let mvc = Mvc::builder(application.deep_clone())
            .conventions(conventions)
            .build()
            .unwrap();

        assert!(mvc.contains("Start.Index"));
        assert!(!mvc.contains("Home.Index"));
        assert!(application.filters.is_empty());
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = PallasConfig::default();
        config.binding.max_body_size = 0;
        let err = Mvc::builder(application()).config(config).build().unwrap_err();
        assert!(err.to_string().contains("binding.max_body_size"));
    }

    #[tokio::test]
    async fn test_handle_runs_action_and_echoes_request_id() {
        let mvc = Mvc::builder(application()).build().unwrap();
        let mut request = get();
        let id = RequestId::new();
        request.headers_mut().insert(
            REQUEST_ID_HEADER,
            http::HeaderValue::from_str(&id.to_string()).unwrap(),
        );

        let response = mvc
            .handle("Home.Index", request, RouteValues::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(
            response.headers()[REQUEST_ID_HEADER].to_str().unwrap(),
            id.to_string()
        );
    }

    #[tokio::test]
    async fn test_handle_unknown_id_is_not_found() {
        let mvc = Mvc::builder(application()).build().unwrap();
        let err = mvc
            .handle("Home.Missing", get(), RouteValues::new(), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.category(), pallas_core::ErrorCategory::NotFound);
    }

    #[tokio::test]
    async fn test_handle_rejected_by_constraint_is_not_found() {
        let mvc = Mvc::builder(application()).build().unwrap();
        let mut request = get();
        *request.method_mut() = http::Method::DELETE;
        let err = mvc
            .handle("Home.Index", request, RouteValues::new(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("DELETE"));
    }

    #[tokio::test]
    async fn test_handle_canceled() {
        let mvc = Mvc::builder(application()).build().unwrap();
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let err = mvc
            .handle("Home.About", get(), RouteValues::new(), cancellation)
            .await
            .unwrap_err();
        assert_eq!(err.category(), pallas_core::ErrorCategory::Canceled);
    }
}
