//! Validator resolution through the cache and execution through the visitor.

use pallas_core::{ModelStateDictionary, ValidationState};
use pallas_metadata::{
    DefaultModelMetadataProvider, ModelMetadataProvider, ModelMetadataType, ParameterInfo,
    PropertyInfo, Reflect, TypeInfo,
};
use pallas_validation::{
    validator_providers, EmailAddress, ModelValidationContext, ModelValidationResult,
    ModelValidator, Range, RegularExpression, Required, StringLength, Validatable,
    ValidatableObject, ValidateNever, ValidationError, ValidationVisitor, ValidatorAttribute,
    ValidatorCache,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn setup() -> (Arc<DefaultModelMetadataProvider>, ValidatorCache) {
    let (details, validators) = validator_providers();
    (
        DefaultModelMetadataProvider::new(Arc::new(details)),
        ValidatorCache::new(Arc::new(validators)),
    )
}

#[derive(Debug)]
struct Named(&'static str);

impl ModelValidator for Named {
    fn validate(
        &self,
        _context: &ModelValidationContext<'_>,
    ) -> Result<Vec<ModelValidationResult>, ValidationError> {
        Ok(Vec::new())
    }
}

#[derive(Debug)]
struct Unavailable;

impl ModelValidator for Unavailable {
    fn validate(
        &self,
        context: &ModelValidationContext<'_>,
    ) -> Result<Vec<ModelValidationResult>, ValidationError> {
        Err(ValidationError::validator_failed(
            "Unavailable",
            context.key,
            "backend down",
        ))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Address {
    #[serde(rename = "City")]
    city: String,
}

impl Reflect for Address {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .attribute(ValidatorAttribute::new(Named("class")))
            .property(PropertyInfo::of::<String>("City"))
            .serde::<Self>()
            .build()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Person {
    #[serde(rename = "Home")]
    home: Address,
}

impl Reflect for Person {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(
                PropertyInfo::of::<Address>("Home")
                    .attribute(ValidatorAttribute::new(Named("property"))),
            )
            .serde::<Self>()
            .build()
    }
}

#[test]
fn test_class_and_property_validators_are_both_resolved() {
    let (provider, cache) = setup();
    let person = provider.metadata_for::<Person>();
    let home = person.property("Home").unwrap();

    let validators = cache.get_validators(home);
    let names: Vec<String> = validators.iter().map(|v| format!("{v:?}")).collect();
    assert_eq!(names, vec![r#"Named("class")"#, r#"Named("property")"#]);
    assert!(Arc::ptr_eq(&validators, &cache.get_validators(home)));

    let address = provider.metadata_for::<Address>();
    assert_eq!(cache.get_validators(&address).len(), 1);
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProductViewModel {
    #[serde(rename = "Id")]
    id: i32,
    #[serde(rename = "Name")]
    name: String,
}

impl Reflect for ProductViewModel {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .attribute(ModelMetadataType::of::<ProductMetadata>())
            .property(PropertyInfo::of::<i32>("Id"))
            .property(PropertyInfo::of::<String>("Name").attribute(StringLength::new(4)))
            .serde::<Self>()
            .build()
    }
}

struct ProductMetadata;

impl Reflect for ProductMetadata {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(PropertyInfo::of::<i32>("Id").attribute(Range::new(1.0, 100.0)))
            .property(
                PropertyInfo::of::<String>("Name")
                    .attribute(RegularExpression::new("[A-Z][a-z]*").expect("valid pattern")),
            )
            .build()
    }
}

#[test]
fn test_shadow_type_attributes_are_merged() {
    let (provider, cache) = setup();
    let product = provider.metadata_for::<ProductViewModel>();

    assert_eq!(cache.get_validators(product.property("Name").unwrap()).len(), 2);
    assert_eq!(cache.get_validators(product.property("Id").unwrap()).len(), 1);

    let mut state = ModelStateDictionary::new();
    let valid = ValidationVisitor::new(&cache, &mut state)
        .validate(&product, "product", &json!({"Id": 500, "Name": "toolong"}))
        .unwrap();

    assert!(!valid);
    let errors = state.to_error_map();
    assert_eq!(
        errors["product.Id"],
        vec!["The field Id must be between 1 and 100.".to_string()]
    );
    assert_eq!(
        errors["product.Name"],
        vec![
            "The field Name must be a string with a maximum length of 4.".to_string(),
            "The field Name must match the regular expression '[A-Z][a-z]*'.".to_string(),
        ]
    );
}

static ORDER_CHECKS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
struct OrderCheck;

impl ModelValidator for OrderCheck {
    fn validate(
        &self,
        _context: &ModelValidationContext<'_>,
    ) -> Result<Vec<ModelValidationResult>, ValidationError> {
        ORDER_CHECKS.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Customer {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Email")]
    email: Option<String>,
}

impl Reflect for Customer {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(PropertyInfo::of::<Option<String>>("Name").attribute(Required::new()))
            .property(PropertyInfo::of::<Option<String>>("Email").attribute(EmailAddress::new()))
            .serde::<Self>()
            .build()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Line {
    #[serde(rename = "Qty")]
    qty: i32,
}

impl Reflect for Line {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(PropertyInfo::of::<i32>("Qty").attribute(Range::new(1.0, 100.0)))
            .serde::<Self>()
            .build()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Order {
    #[serde(rename = "Customer")]
    customer: Customer,
    #[serde(rename = "Lines")]
    lines: Vec<Line>,
}

impl Reflect for Order {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .attribute(ValidatorAttribute::new(OrderCheck))
            .property(PropertyInfo::of::<Customer>("Customer"))
            .property(PropertyInfo::of::<Vec<Line>>("Lines"))
            .serde::<Self>()
            .build()
    }
}

#[test]
fn test_nested_errors_use_dotted_and_indexed_keys() {
    let (provider, cache) = setup();
    let order = provider.metadata_for::<Order>();
    let mut state = ModelStateDictionary::new();

    let invalid = json!({
        "Customer": {"Name": "  ", "Email": "nobody"},
        "Lines": [{"Qty": 3}, {"Qty": 0}]
    });
    let valid = ValidationVisitor::new(&cache, &mut state)
        .validate(&order, "order", &invalid)
        .unwrap();

    assert!(!valid);
    let errors = state.to_error_map();
    assert_eq!(
        errors["order.Customer.Name"],
        vec!["The Name field is required.".to_string()]
    );
    assert_eq!(
        errors["order.Customer.Email"],
        vec!["The Email field is not a valid e-mail address.".to_string()]
    );
    assert_eq!(
        errors["order.Lines[1].Qty"],
        vec!["The field Qty must be between 1 and 100.".to_string()]
    );
    assert!(!errors.contains_key("order.Lines[0].Qty"));
    assert_eq!(ORDER_CHECKS.load(Ordering::SeqCst), 0);

    let mut state = ModelStateDictionary::new();
    let good = json!({"Customer": {"Name": "Ada", "Email": "ada@example.com"}, "Lines": [{"Qty": 1}]});
    let valid = ValidationVisitor::new(&cache, &mut state)
        .validate(&order, "order", &good)
        .unwrap();
    assert!(valid);
    assert!(state.is_valid());
    assert_eq!(ORDER_CHECKS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_keys_invalid_from_binding_are_not_validated_again() {
    let (provider, cache) = setup();
    let parameter = ParameterInfo::new("Orders.Get", "id", i32::type_info())
        .attribute(Range::new(1.0, 10.0));
    let metadata = provider.get_metadata_for_parameter(&parameter);

    let mut state = ModelStateDictionary::new();
    state.add_model_error("id", "The value 'abc' is not valid for id.");
    let valid = ValidationVisitor::new(&cache, &mut state)
        .validate(&metadata, "id", &json!(0))
        .unwrap();

    assert!(!valid);
    assert_eq!(state.get("id").unwrap().errors.len(), 1);
}

#[test]
fn test_bound_entries_become_valid() {
    let (provider, cache) = setup();
    let parameter = ParameterInfo::new("Orders.Get", "page", i32::type_info());
    let metadata = provider.get_metadata_for_parameter(&parameter);

    let mut state = ModelStateDictionary::new();
    state.set_model_value("page", Some(json!(2)), Some("2".into()));
    assert_eq!(state.validation_state_of("page"), ValidationState::Unvalidated);

    ValidationVisitor::new(&cache, &mut state)
        .validate(&metadata, "page", &json!(2))
        .unwrap();
    assert_eq!(state.validation_state_of("page"), ValidationState::Valid);
}

#[test]
fn test_null_values_only_fail_when_required() {
    let (provider, cache) = setup();
    let optional = provider.get_metadata_for_parameter(&ParameterInfo::new(
        "Search.Run",
        "term",
        Option::<String>::type_info(),
    ));
    let required = provider.get_metadata_for_parameter(
        &ParameterInfo::new("Search.Run", "scope", String::type_info()).attribute(Required::new()),
    );

    let mut state = ModelStateDictionary::new();
    let mut visitor = ValidationVisitor::new(&cache, &mut state);
    assert!(visitor.validate(&optional, "term", &serde_json::Value::Null).unwrap());
    assert!(!visitor.validate(&required, "scope", &serde_json::Value::Null).unwrap());

    assert_eq!(
        state.to_error_map()["scope"],
        vec!["The scope field is required.".to_string()]
    );
    assert!(state.get("term").is_none());
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Upload {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Payload")]
    payload: Option<String>,
}

impl Reflect for Upload {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(PropertyInfo::of::<Option<String>>("Title").attribute(StringLength::new(20)))
            .property(
                PropertyInfo::of::<Option<String>>("Payload")
                    .attribute(ValidateNever)
                    .attribute(Required::new()),
            )
            .serde::<Self>()
            .build()
    }
}

#[test]
fn test_validate_never_marks_entries_skipped() {
    let (provider, cache) = setup();
    let upload = provider.metadata_for::<Upload>();
    let mut state = ModelStateDictionary::new();
    state.set_model_value("upload.Payload", None, None);

    let valid = ValidationVisitor::new(&cache, &mut state)
        .validate(&upload, "upload", &json!({"Title": "report"}))
        .unwrap();

    assert!(valid);
    assert_eq!(state.validation_state_of("upload.Payload"), ValidationState::Skipped);
    assert!(state.get("upload.Payload").unwrap().errors.is_empty());
    assert!(state.is_valid());
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Flaky {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Remote")]
    remote: Option<String>,
}

impl Reflect for Flaky {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(PropertyInfo::of::<Option<String>>("Code").attribute(Required::new()))
            .property(
                PropertyInfo::of::<Option<String>>("Remote")
                    .attribute(ValidatorAttribute::new(Unavailable)),
            )
            .serde::<Self>()
            .build()
    }
}

#[test]
fn test_validator_errors_abort_but_keep_sibling_results() {
    let (provider, cache) = setup();
    let flaky = provider.metadata_for::<Flaky>();
    let mut state = ModelStateDictionary::new();

    let err = ValidationVisitor::new(&cache, &mut state)
        .validate(&flaky, "m", &json!({"Remote": "x"}))
        .unwrap_err();

    assert!(matches!(err, ValidationError::ValidatorFailed { ref key, .. } if key == "m.Remote"));
    assert_eq!(
        state.to_error_map()["m.Code"],
        vec!["The Code field is required.".to_string()]
    );
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct TreeNode {
    #[serde(rename = "Children")]
    children: Vec<TreeNode>,
}

impl Reflect for TreeNode {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property(PropertyInfo::of::<Vec<TreeNode>>("Children"))
            .serde::<Self>()
            .build()
    }
}

#[test]
fn test_max_depth_is_enforced() {
    let (provider, cache) = setup();
    let node = provider.metadata_for::<TreeNode>();
    let deep = json!({"Children": [{"Children": [{"Children": []}]}]});

    let mut state = ModelStateDictionary::new();
    let err = ValidationVisitor::new(&cache, &mut state)
        .max_depth(Some(2))
        .validate(&node, "tree", &deep)
        .unwrap_err();
    assert!(matches!(err, ValidationError::MaxDepthExceeded { max_depth: 2, .. }));

    let mut state = ModelStateDictionary::new();
    assert!(ValidationVisitor::new(&cache, &mut state)
        .validate(&node, "tree", &deep)
        .unwrap());
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct DateRange {
    #[serde(rename = "Start")]
    start: i64,
    #[serde(rename = "End")]
    end: i64,
}

impl ValidatableObject for DateRange {
    fn validate(&self) -> Vec<ModelValidationResult> {
        if self.end < self.start {
            vec![ModelValidationResult::for_member("End", "End must not precede Start.")]
        } else {
            Vec::new()
        }
    }
}

impl Reflect for DateRange {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .attribute(Validatable::of::<Self>())
            .property(PropertyInfo::of::<i64>("Start"))
            .property(PropertyInfo::of::<i64>("End"))
            .serde::<Self>()
            .build()
    }
}

#[test]
fn test_validatable_objects_report_member_errors() {
    let (provider, cache) = setup();
    let range = provider.metadata_for::<DateRange>();
    let mut state = ModelStateDictionary::new();

    let valid = ValidationVisitor::new(&cache, &mut state)
        .validate(&range, "range", &json!({"Start": 10, "End": 5}))
        .unwrap();

    assert!(!valid);
    assert_eq!(
        state.to_error_map()["range.End"],
        vec!["End must not precede Start.".to_string()]
    );
}
