//! Declarative validation attributes.
//!
//! Each attribute checks one value in isolation. `null` passes every rule
//! except [`Required`]; pair a rule with `Required` to reject missing values.

use crate::validator::{ModelValidationResult, ModelValidator};
use pallas_metadata::Attribute;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A single declarative rule.
pub trait ValidationAttribute: Attribute {
    /// Whether `value` satisfies the rule.
    fn is_valid(&self, value: &Value) -> bool;

    /// The message used when no custom message was set.
    fn default_message(&self, display_name: &str) -> String;

    /// A custom message; `{0}` is replaced by the display name.
    fn custom_message(&self) -> Option<&str> {
        None
    }

    /// The message for a failed value.
    fn format_error_message(&self, display_name: &str) -> String {
        match self.custom_message() {
            Some(template) => template.replace("{0}", display_name),
            None => self.default_message(display_name),
        }
    }
}

macro_rules! with_message {
    ($ty:ty) => {
        impl $ty {
            /// Overrides the error message; `{0}` is replaced by the display name.
            #[must_use]
            pub fn with_message(mut self, message: impl Into<String>) -> Self {
                self.message = Some(message.into());
                self
            }
        }
    };
}

/// The value must be present (and, for strings, non-blank).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Required {
    /// Accept empty and whitespace-only strings.
    pub allow_empty_strings: bool,
    message: Option<String>,
}

impl Required {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts blank strings.
    #[must_use]
    pub fn allow_empty_strings(mut self) -> Self {
        self.allow_empty_strings = true;
        self
    }
}

with_message!(Required);
impl Attribute for Required {}

impl ValidationAttribute for Required {
    fn is_valid(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::String(s) => self.allow_empty_strings || !s.trim().is_empty(),
            _ => true,
        }
    }

    fn default_message(&self, display_name: &str) -> String {
        format!("The {display_name} field is required.")
    }

    fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// A number (or numeric string) within an inclusive range.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    /// Lower bound.
    pub minimum: f64,
    /// Upper bound.
    pub maximum: f64,
    message: Option<String>,
}

impl Range {
    /// Creates the rule.
    #[must_use]
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self {
            minimum,
            maximum,
            message: None,
        }
    }
}

with_message!(Range);
impl Attribute for Range {}

impl ValidationAttribute for Range {
    fn is_valid(&self, value: &Value) -> bool {
        let number = match value {
            Value::Null => return true,
            Value::String(s) if s.is_empty() => return true,
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.is_some_and(|n| n >= self.minimum && n <= self.maximum)
    }

    fn default_message(&self, display_name: &str) -> String {
        format!(
            "The field {display_name} must be between {} and {}.",
            self.minimum, self.maximum
        )
    }

    fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// A string whose length (in characters) is within bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLength {
    /// Maximum length.
    pub maximum_length: usize,
    /// Minimum length.
    pub minimum_length: usize,
    message: Option<String>,
}

impl StringLength {
    /// Creates the rule with a maximum length.
    #[must_use]
    pub fn new(maximum_length: usize) -> Self {
        Self {
            maximum_length,
            minimum_length: 0,
            message: None,
        }
    }

    /// Sets the minimum length.
    #[must_use]
    pub fn minimum(mut self, minimum_length: usize) -> Self {
        self.minimum_length = minimum_length;
        self
    }
}

with_message!(StringLength);
impl Attribute for StringLength {}

impl ValidationAttribute for StringLength {
    fn is_valid(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => {
                let length = s.chars().count();
                length >= self.minimum_length && length <= self.maximum_length
            }
            _ => false,
        }
    }

    fn default_message(&self, display_name: &str) -> String {
        if self.minimum_length > 0 {
            format!(
                "The field {display_name} must be a string with a minimum length of {} and a maximum length of {}.",
                self.minimum_length, self.maximum_length
            )
        } else {
            format!(
                "The field {display_name} must be a string with a maximum length of {}.",
                self.maximum_length
            )
        }
    }

    fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// The whole string must match a regular expression.
#[derive(Debug, Clone)]
pub struct RegularExpression {
    pattern: String,
    regex: Regex,
    message: Option<String>,
}

impl RegularExpression {
    /// Compiles the rule. The pattern is anchored at both ends.
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            pattern,
            regex,
            message: None,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

with_message!(RegularExpression);
impl Attribute for RegularExpression {}

impl ValidationAttribute for RegularExpression {
    fn is_valid(&self, value: &Value) -> bool {
        let text = match value {
            Value::Null => return true,
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return false,
        };
        text.is_empty() || self.regex.is_match(&text)
    }

    fn default_message(&self, display_name: &str) -> String {
        format!(
            "The field {display_name} must match the regular expression '{}'.",
            self.pattern
        )
    }

    fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

fn collection_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// A string or array with at least `length` items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinLength {
    /// Minimum length.
    pub length: usize,
    message: Option<String>,
}

impl MinLength {
    /// Creates the rule.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length,
            message: None,
        }
    }
}

with_message!(MinLength);
impl Attribute for MinLength {}

impl ValidationAttribute for MinLength {
    fn is_valid(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        collection_length(value).is_some_and(|n| n >= self.length)
    }

    fn default_message(&self, display_name: &str) -> String {
        format!(
            "The field {display_name} must be a string or array type with a minimum length of '{}'.",
            self.length
        )
    }

    fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// A string or array with at most `length` items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxLength {
    /// Maximum length.
    pub length: usize,
    message: Option<String>,
}

impl MaxLength {
    /// Creates the rule.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length,
            message: None,
        }
    }
}

with_message!(MaxLength);
impl Attribute for MaxLength {}

impl ValidationAttribute for MaxLength {
    fn is_valid(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        collection_length(value).is_some_and(|n| n <= self.length)
    }

    fn default_message(&self, display_name: &str) -> String {
        format!(
            "The field {display_name} must be a string or array type with a maximum length of '{}'.",
            self.length
        )
    }

    fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// A string with exactly one `@` that is neither first nor last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailAddress {
    message: Option<String>,
}

impl EmailAddress {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

with_message!(EmailAddress);
impl Attribute for EmailAddress {}

impl ValidationAttribute for EmailAddress {
    fn is_valid(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => {
                let mut at = s.match_indices('@').map(|(i, _)| i);
                match (at.next(), at.next()) {
                    (Some(index), None) => index > 0 && index + 1 < s.len(),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn default_message(&self, display_name: &str) -> String {
        format!("The {display_name} field is not a valid e-mail address.")
    }

    fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Attaches a hand-written validator to a type or member.
#[derive(Debug, Clone)]
pub struct ValidatorAttribute(pub Arc<dyn ModelValidator>);

impl ValidatorAttribute {
    /// Wraps a validator.
    #[must_use]
    pub fn new(validator: impl ModelValidator + 'static) -> Self {
        Self(Arc::new(validator))
    }
}

impl Attribute for ValidatorAttribute {}

/// Excludes a member (or every use of a type) from validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateNever;

impl Attribute for ValidateNever {}

/// Types that validate themselves as a whole.
pub trait ValidatableObject: DeserializeOwned + 'static {
    /// Returns the failed rules; member names are relative to `self`.
    fn validate(&self) -> Vec<ModelValidationResult>;
}

/// Type-level marker wiring a [`ValidatableObject`] into validation.
#[derive(Clone)]
pub struct Validatable {
    type_name: &'static str,
    validate: fn(&Value) -> Result<Vec<ModelValidationResult>, String>,
}

impl Validatable {
    /// Marks `T` as self-validating.
    #[must_use]
    pub fn of<T: ValidatableObject>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            validate: validate_as::<T>,
        }
    }

    /// Decodes `value` as the marked type and runs its validation.
    pub fn run(&self, value: &Value) -> Result<Vec<ModelValidationResult>, String> {
        (self.validate)(value)
    }

    /// The marked type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

fn validate_as<T: ValidatableObject>(value: &Value) -> Result<Vec<ModelValidationResult>, String> {
    let typed: T = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
    Ok(typed.validate())
}

impl fmt::Debug for Validatable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validatable").field(&self.type_name).finish()
    }
}

impl Attribute for Validatable {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required() {
        let rule = Required::new();
        assert!(!rule.is_valid(&Value::Null));
        assert!(!rule.is_valid(&json!("   ")));
        assert!(rule.is_valid(&json!("x")));
        assert!(rule.is_valid(&json!(0)));
        assert!(Required::new().allow_empty_strings().is_valid(&json!("")));
        assert_eq!(rule.format_error_message("Name"), "The Name field is required.");
    }

    #[test]
    fn test_range() {
        let rule = Range::new(1.0, 10.0);
        assert!(rule.is_valid(&json!(1)));
        assert!(rule.is_valid(&json!("7.5")));
        assert!(!rule.is_valid(&json!(11)));
        assert!(!rule.is_valid(&json!("abc")));
        assert!(rule.is_valid(&Value::Null));
        assert_eq!(
            rule.format_error_message("Qty"),
            "The field Qty must be between 1 and 10."
        );
    }

    #[test]
    fn test_string_length_messages() {
        assert_eq!(
            StringLength::new(4).format_error_message("Name"),
            "The field Name must be a string with a maximum length of 4."
        );
        assert_eq!(
            StringLength::new(4).minimum(2).format_error_message("Name"),
            "The field Name must be a string with a minimum length of 2 and a maximum length of 4."
        );
        assert!(!StringLength::new(4).is_valid(&json!("héllo")));
        assert!(StringLength::new(5).is_valid(&json!("héllo")));
    }

    #[test]
    fn test_regular_expression_is_anchored() {
        let rule = RegularExpression::new("[a-z]+").unwrap();
        assert!(rule.is_valid(&json!("abc")));
        assert!(!rule.is_valid(&json!("abc1")));
        assert!(rule.is_valid(&json!("")));
        assert!(RegularExpression::new("(").is_err());
    }

    #[test]
    fn test_lengths_on_arrays() {
        assert!(MinLength::new(2).is_valid(&json!([1, 2])));
        assert!(!MinLength::new(2).is_valid(&json!([1])));
        assert!(MaxLength::new(1).is_valid(&json!("a")));
        assert!(!MaxLength::new(1).is_valid(&json!({"a": 1})));
    }

    #[test]
    fn test_email() {
        let rule = EmailAddress::new();
        assert!(rule.is_valid(&json!("a@b")));
        assert!(!rule.is_valid(&json!("@b")));
        assert!(!rule.is_valid(&json!("a@")));
        assert!(!rule.is_valid(&json!("a@b@c")));
    }

    #[test]
    fn test_custom_message() {
        let rule = Required::new().with_message("{0} is mandatory");
        assert_eq!(rule.format_error_message("Email"), "Email is mandatory");
    }
}
