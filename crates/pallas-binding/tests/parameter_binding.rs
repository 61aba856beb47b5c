//! Parameter binding end to end: value providers, formatters, binders and
//! validation of the bound value.

use pallas_binding::{
    BindingError, BoundModel, ModelBinder, ModelBinderFactory, ModelBindingContext,
    ModelBindingResult, ParameterBinder, ParameterDescriptor, RequestContext,
};
use pallas_core::{BoxFuture, ModelErrorKind, ModelStateDictionary, RouteValues, Services};
use pallas_metadata::{
    BindFrom, BindRequired, DefaultModelMetadataProvider, ModelBinderAttribute, ParameterInfo,
    PropertyInfo, Reflect, TypeInfo,
};
use pallas_validation::{Required, ValidatorCache};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct DummyClass {
    #[serde(rename = "SampleInt")]
    sample_int: i32,
}

impl Reflect for DummyClass {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(PropertyInfo::of::<i32>("SampleInt"))
            .serde::<Self>()
            .build()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct OrderFilter {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Page")]
    page: i32,
}

impl Reflect for OrderFilter {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(PropertyInfo::of::<String>("Status").attribute(Required::default()))
            .property(PropertyInfo::of::<i32>("Page").attribute(BindRequired))
            .serde::<Self>()
            .build()
    }
}

#[derive(Debug)]
struct Clock {
    now: u64,
}

impl Reflect for Clock {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>().build()
    }
}

#[derive(Debug)]
struct AlwaysSeven;

impl ModelBinder for AlwaysSeven {
    fn bind_model<'a>(
        &'a self,
        context: &'a mut ModelBindingContext<'_>,
    ) -> BoxFuture<'a, Result<(), BindingError>> {
        Box::pin(async move {
            context.set_result(ModelBindingResult::success(BoundModel::Value(json!(7))));
            Ok(())
        })
    }
}

fn parameter_binder(factory: ModelBinderFactory) -> ParameterBinder {
    let (details, validators) = pallas_validation::validator_providers();
    let metadata = DefaultModelMetadataProvider::new(Arc::new(details));
    let cache = Arc::new(ValidatorCache::new(Arc::new(validators)));
    ParameterBinder::new(metadata, Arc::new(factory), cache)
}

fn parameter(name: &str, parameter_type: TypeInfo) -> ParameterInfo {
    ParameterInfo::new("Home.Index", name, parameter_type)
}

async fn bind(
    request: &RequestContext,
    parameter: ParameterInfo,
) -> (Result<ModelBindingResult, BindingError>, ModelStateDictionary) {
    bind_with(ModelBinderFactory::new(), request, parameter).await
}

async fn bind_with(
    factory: ModelBinderFactory,
    request: &RequestContext,
    parameter: ParameterInfo,
) -> (Result<ModelBindingResult, BindingError>, ModelStateDictionary) {
    let binder = parameter_binder(factory);
    let mut state = ModelStateDictionary::new();
    let values = pallas_binding::CompositeValueProvider::for_request(request);
    let result = binder
        .bind_model(request, &mut state, &values, &ParameterDescriptor::new(parameter))
        .await;
    (result, state)
}

fn json_request(content_type: &str, body: &'static str) -> RequestContext {
    RequestContext::builder()
        .method(http::Method::POST)
        .header("content-type", content_type)
        .body(body)
        .build()
}

fn value_of(result: &ModelBindingResult) -> Option<&Value> {
    result.model().and_then(BoundModel::as_value)
}

#[tokio::test]
async fn test_json_body_binds_property() {
    for content_type in ["application/json", "text/json"] {
        let request = json_request(content_type, r#"{"SampleInt":10}"#);
        let dummy = parameter("dummy", DummyClass::type_info()).attribute(BindFrom::body());

        let (result, state) = bind(&request, dummy).await;
        let result = result.unwrap();
        assert_eq!(value_of(&result), Some(&json!({"SampleInt": 10})));
        assert!(state.is_valid(), "{content_type}: {state:?}");
    }
}

#[tokio::test]
async fn test_empty_json_object_binds_defaults() {
    let request = json_request("application/json", "{}");
    let dummy = parameter("dummy", DummyClass::type_info()).attribute(BindFrom::body());

    let (result, state) = bind(&request, dummy).await;
    let result = result.unwrap();
    assert_eq!(value_of(&result), Some(&json!({"SampleInt": 0})));
    assert_eq!(state.to_error_map().len(), 0);
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let request = json_request("image/png", r#"{"SampleInt":10}"#);
    let dummy = parameter("dummy", DummyClass::type_info()).attribute(BindFrom::body());

    let (result, state) = bind(&request, dummy).await;
    assert!(!result.unwrap().is_model_set());
    assert!(state.has_error_kind(ModelErrorKind::UnsupportedContentType));
    assert_eq!(
        state.to_error_map().get(""),
        Some(&vec!["Unsupported content type 'image/png'.".to_string()])
    );
}

#[tokio::test]
async fn test_missing_content_type() {
    let request = RequestContext::builder()
        .method(http::Method::POST)
        .body(r#"{"SampleInt":10}"#)
        .build();
    let dummy = parameter("dummy", DummyClass::type_info()).attribute(BindFrom::body());

    let (_, state) = bind(&request, dummy).await;
    assert_eq!(
        state.to_error_map().get(""),
        Some(&vec!["Unsupported content type ''.".to_string()])
    );
}

#[tokio::test]
async fn test_value_type_body_mismatch_leaves_parameter_unset() {
    for body in [r#""I'm a JSON string!""#, "true", r#""""#] {
        let request = json_request("application/json", body);
        let value = parameter("value", i32::type_info()).attribute(BindFrom::body());

        let (result, state) = bind(&request, value).await;
        assert!(!result.unwrap().is_model_set(), "{body}");
        assert!(state.has_error_kind(ModelErrorKind::InputFormat), "{body}");
    }

    let request = json_request("application/json", "1773");
    let value = parameter("value", i32::type_info()).attribute(BindFrom::body());
    let (result, state) = bind(&request, value).await;
    assert_eq!(value_of(&result.unwrap()), Some(&json!(1773)));
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_empty_body_requires_value() {
    let request = json_request("application/json", "");
    let dummy = parameter("dummy", DummyClass::type_info()).attribute(BindFrom::body());

    let (result, state) = bind(&request, dummy).await;
    assert!(!result.unwrap().is_model_set());
    assert_eq!(
        state.to_error_map().get(""),
        Some(&vec!["A non-empty request body is required.".to_string()])
    );
}

#[tokio::test]
async fn test_plain_text_body() {
    let request = json_request("text/plain", "Test Content");
    let text = parameter("text", String::type_info()).attribute(BindFrom::body());

    let (result, _) = bind(&request, text).await;
    assert_eq!(value_of(&result.unwrap()), Some(&json!("Test Content")));
}

#[tokio::test]
async fn test_route_value_wins_over_query() {
    let request = RequestContext::builder()
        .uri("/orders/5?id=9".parse().unwrap())
        .route_values(RouteValues::new().with("id", "5"))
        .build();

    let (result, state) = bind(&request, parameter("id", i32::type_info())).await;
    assert_eq!(value_of(&result.unwrap()), Some(&json!(5)));
    assert!(state.is_valid());

    let query_only = parameter("id", i32::type_info()).attribute(BindFrom::query());
    let (result, _) = bind(&request, query_only).await;
    assert_eq!(value_of(&result.unwrap()), Some(&json!(9)));
}

#[tokio::test]
async fn test_conversion_failure_message() {
    let request = RequestContext::builder()
        .uri("/orders?id=abc".parse().unwrap())
        .build();

    let (result, state) = bind(&request, parameter("id", i32::type_info())).await;
    assert!(!result.unwrap().is_model_set());
    assert_eq!(
        state.to_error_map().get("id"),
        Some(&vec!["The value 'abc' is not valid for id.".to_string()])
    );
    assert_eq!(state.get("id").unwrap().attempted_value.as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_complex_type_from_query() {
    let prefixed = RequestContext::builder()
        .uri("/orders?filter.Status=open&filter.Page=2".parse().unwrap())
        .build();
    let (result, state) = bind(&prefixed, parameter("filter", OrderFilter::type_info())).await;
    assert_eq!(
        value_of(&result.unwrap()),
        Some(&json!({"Status": "open", "Page": 2}))
    );
    assert!(state.is_valid(), "{state:?}");

    let unprefixed = RequestContext::builder()
        .uri("/orders?Status=closed&Page=1".parse().unwrap())
        .build();
    let (result, state) = bind(&unprefixed, parameter("filter", OrderFilter::type_info())).await;
    assert_eq!(
        value_of(&result.unwrap()),
        Some(&json!({"Status": "closed", "Page": 1}))
    );
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_bind_required_and_required_properties() {
    let request = RequestContext::builder()
        .uri("/orders?filter.Status=".parse().unwrap())
        .build();

    let (result, state) = bind(&request, parameter("filter", OrderFilter::type_info())).await;
    assert!(result.unwrap().is_model_set());
    let errors = state.to_error_map();
    assert_eq!(
        errors.get("filter.Page"),
        Some(&vec![
            "A value for the 'Page' parameter or property was not provided.".to_string()
        ])
    );
    assert_eq!(
        errors.get("filter.Status"),
        Some(&vec!["The Status field is required.".to_string()])
    );
}

#[tokio::test]
async fn test_header_binding() {
    let request = RequestContext::builder().header("x-tenant", "acme").build();
    let tenant = parameter("tenant", String::type_info()).attribute(BindFrom::header("X-Tenant"));

    let (result, _) = bind(&request, tenant).await;
    assert_eq!(value_of(&result.unwrap()), Some(&json!("acme")));
}

#[tokio::test]
async fn test_collection_from_repeated_keys() {
    let request = RequestContext::builder()
        .uri("/orders?ids=1&ids=2&ids=3".parse().unwrap())
        .build();

    let (result, state) = bind(&request, parameter("ids", Vec::<i32>::type_info())).await;
    assert_eq!(value_of(&result.unwrap()), Some(&json!([1, 2, 3])));
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_collection_from_indexed_keys() {
    let request = RequestContext::builder()
        .uri("/orders?lines%5B0%5D.SampleInt=4&lines%5B1%5D.SampleInt=5&lines%5B3%5D.SampleInt=9".parse().unwrap())
        .build();

    let (result, _) = bind(&request, parameter("lines", Vec::<DummyClass>::type_info())).await;
    assert_eq!(
        value_of(&result.unwrap()),
        Some(&json!([{"SampleInt": 4}, {"SampleInt": 5}]))
    );
}

#[tokio::test]
async fn test_services_binding() {
    let services = Arc::new(Services::new().with(Arc::new(Clock { now: 42 })));
    let request = RequestContext::builder().services(services).build();
    let clock = parameter("clock", Clock::type_info()).attribute(BindFrom::services());

    let (result, state) = bind(&request, clock.clone()).await;
    let result = result.unwrap();
    let resolved = result.model().and_then(BoundModel::service::<Clock>).unwrap();
    assert_eq!(resolved.now, 42);
    assert!(state.is_empty());

    let (missing, _) = bind(&RequestContext::builder().build(), clock).await;
    assert!(matches!(missing, Err(BindingError::Service(_))));
}

#[tokio::test]
async fn test_named_binder() {
    let factory = ModelBinderFactory::builder()
        .default_formatters()
        .binder("seven", AlwaysSeven)
        .build();
    let request = RequestContext::builder().build();
    let lucky = parameter("lucky", i32::type_info()).attribute(ModelBinderAttribute::new("seven"));

    let (result, _) = bind_with(factory, &request, lucky.clone()).await;
    assert_eq!(value_of(&result.unwrap()), Some(&json!(7)));

    let (unknown, _) = bind(&request, lucky).await;
    assert!(matches!(unknown, Err(BindingError::UnknownBinder { .. })));
}

#[tokio::test]
async fn test_missing_bind_required_parameter() {
    let request = RequestContext::builder().build();
    let id = parameter("id", i32::type_info()).attribute(BindRequired);

    let (result, state) = bind(&request, id).await;
    assert!(!result.unwrap().is_model_set());
    assert_eq!(
        state.to_error_map().get(""),
        Some(&vec![
            "A value for the 'id' parameter or property was not provided.".to_string()
        ])
    );
}
