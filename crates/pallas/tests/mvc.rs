//! `Mvc::handle` end to end: services, listeners, exception filters and
//! errors surfacing to the host.

use pallas::pipeline::diagnostics::events;
use pallas::pipeline::filters::ExceptionContext;
use pallas::pipeline::filters::ExceptionFilter;
use pallas::pipeline::{DiagnosticEvent, DiagnosticListener};
use pallas::prelude::*;
use pallas::core::{ErrorCategory, ServiceError};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

struct Greetings {
    salutation: &'static str,
}

struct GreetingController {
    greetings: Arc<Greetings>,
}

impl Controller for GreetingController {
    fn create(services: &Services) -> Result<Self, ServiceError> {
        Ok(Self {
            greetings: services.resolve_required()?,
        })
    }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<&'static str>>);

impl DiagnosticListener for EventLog {
    fn is_enabled(&self, name: &str) -> bool {
        name == events::BEFORE_ACTION || name == events::AFTER_ACTION
    }

    fn on_event(&self, event: &DiagnosticEvent<'_>) {
        self.0.lock().push(event.name);
    }
}

struct Recover;

impl ExceptionFilter for Recover {
    fn on_exception<'a>(
        &'a self,
        context: &'a mut ExceptionContext<'_>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            let message = format!("recovered: {}", context.error());
            context.handle(ContentResult::new(message).status(http::StatusCode::SERVICE_UNAVAILABLE));
            Ok(())
        })
    }
}

fn application() -> ApplicationModel {
    let hello = ActionModel::new("Hello", vec![])
        .with_method(ActionMethod::new(|call: ActionCall<GreetingController>| async move {
            let name: String = call.arguments.get_or_default("name");
            Ok(JsonResult::new(json!({
                "greeting": format!("{} {name}", call.controller.greetings.salutation)
            })))
        }))
        .parameter(ParameterModel::new(
            "name",
            String::type_info(),
            vec![Arc::new(BindFrom::route()) as Arc<dyn Attribute>],
        ));

    let broken = ActionModel::new("Broken", vec![]).with_method(ActionMethod::from_fn(|_| async {
        Err::<ContentResult, _>(anyhow::anyhow!("greeting store unavailable"))
    }));

    let recovered = ActionModel::new("Recovered", vec![])
        .with_method(ActionMethod::from_fn(|_| async {
            Err::<ContentResult, _>(anyhow::anyhow!("greeting store unavailable"))
        }))
        .filter(FilterMetadata::exception(Recover));

    ApplicationModel::new().controller(
        ControllerModel::new(ControllerTypeInfo::of::<GreetingController>(), vec![])
            .action(hello)
            .action(broken)
            .action(recovered),
    )
}

fn services() -> Arc<Services> {
    Arc::new(Services::new().with(Arc::new(Greetings { salutation: "hello" })))
}

fn request() -> http::Request<http_body_util::Full<bytes::Bytes>> {
    http::Request::new(http_body_util::Full::new(bytes::Bytes::new()))
}

async fn body_json(response: http::Response<http_body_util::Full<bytes::Bytes>>) -> Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_controller_resolves_services_and_route_values() {
    let mvc = Mvc::builder(application()).services(services()).build().unwrap();

    let response = mvc
        .handle(
            "Greeting.Hello",
            request(),
            RouteValues::new().with("name", "pallas"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), http::StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"greeting": "hello pallas"}));
}

#[tokio::test]
async fn test_missing_service_is_configuration_error() {
    let mvc = Mvc::builder(application()).build().unwrap();

    let err = mvc
        .handle("Greeting.Hello", request(), RouteValues::new(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("Unable to activate"), "{err}");
}

#[tokio::test]
async fn test_unhandled_action_error_reaches_host() {
    let mvc = Mvc::builder(application()).services(services()).build().unwrap();

    let err = mvc
        .handle("Greeting.Broken", request(), RouteValues::new(), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Internal);
    let source = std::error::Error::source(&err).map(ToString::to_string).unwrap_or_default();
    assert!(source.contains("greeting store unavailable"), "{source}");
}

#[tokio::test]
async fn test_exception_filter_turns_error_into_response() {
    let mvc = Mvc::builder(application()).services(services()).build().unwrap();

    let response = mvc
        .handle("Greeting.Recovered", request(), RouteValues::new(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.status(), http::StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_extra_listener_sees_action_boundaries() {
    let log = Arc::new(EventLog::default());
    let mvc = Mvc::builder(application())
        .services(services())
        .listener(Arc::clone(&log) as Arc<dyn DiagnosticListener>)
        .build()
        .unwrap();

    mvc.handle(
        "Greeting.Hello",
        request(),
        RouteValues::new().with("name", "a"),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(*log.0.lock(), [events::BEFORE_ACTION, events::AFTER_ACTION]);
}

#[tokio::test]
async fn test_clones_share_invokers() {
    let mvc = Mvc::builder(application()).services(services()).build().unwrap();
    let clone = mvc.clone();

    let (first, second) = tokio::join!(
        mvc.handle(
            "Greeting.Hello",
            request(),
            RouteValues::new().with("name", "first"),
            CancellationToken::new(),
        ),
        clone.handle(
            "Greeting.Hello",
            request(),
            RouteValues::new().with("name", "second"),
            CancellationToken::new(),
        ),
    );

    assert_eq!(body_json(first.unwrap()).await, json!({"greeting": "hello first"}));
    assert_eq!(body_json(second.unwrap()).await, json!({"greeting": "hello second"}));
    assert!(Arc::ptr_eq(&mvc.descriptors("Greeting.Hello")[0], &clone.descriptors("Greeting.Hello")[0]));
}
