//! Binding error messages.

use serde::{Deserialize, Serialize};

/// Templates for the errors binding records in model state.
///
/// `{0}` and `{1}` are replaced positionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingMessages {
    /// A value could not be converted. `{0}` is the value, `{1}` the member.
    pub attempted_value_is_invalid: String,
    /// A bind-required member had no value. `{0}` is the member.
    pub missing_bind_required_value: String,
    /// A key was present without a value.
    pub missing_key_or_value: String,
    /// A body model was bound from an empty body.
    pub missing_request_body_required_value: String,
    /// `null` for a value type. `{0}` is the value.
    pub value_must_not_be_null: String,
    /// No input formatter could read the body. `{0}` is the content type.
    pub unsupported_content_type: String,
}

impl Default for BindingMessages {
    fn default() -> Self {
        Self {
            attempted_value_is_invalid: "The value '{0}' is not valid for {1}.".to_string(),
            missing_bind_required_value:
                "A value for the '{0}' parameter or property was not provided.".to_string(),
            missing_key_or_value: "A value is required.".to_string(),
            missing_request_body_required_value: "A non-empty request body is required."
                .to_string(),
            value_must_not_be_null: "The value '{0}' is invalid.".to_string(),
            unsupported_content_type: "Unsupported content type '{0}'.".to_string(),
        }
    }
}

impl BindingMessages {
    /// `The value '{value}' is not valid for {name}.`
    #[must_use]
    pub fn attempted_value_is_invalid(&self, value: &str, name: &str) -> String {
        format_template(&self.attempted_value_is_invalid, &[value, name])
    }

    /// `A value for the '{name}' parameter or property was not provided.`
    #[must_use]
    pub fn missing_bind_required_value(&self, name: &str) -> String {
        format_template(&self.missing_bind_required_value, &[name])
    }

    /// `A value is required.`
    #[must_use]
    pub fn missing_key_or_value(&self) -> String {
        self.missing_key_or_value.clone()
    }

    /// `A non-empty request body is required.`
    #[must_use]
    pub fn missing_request_body_required_value(&self) -> String {
        self.missing_request_body_required_value.clone()
    }

    /// `The value '{value}' is invalid.`
    #[must_use]
    pub fn value_must_not_be_null(&self, value: &str) -> String {
        format_template(&self.value_must_not_be_null, &[value])
    }

    /// `Unsupported content type '{content_type}'.`
    #[must_use]
    pub fn unsupported_content_type(&self, content_type: &str) -> String {
        format_template(&self.unsupported_content_type, &[content_type])
    }
}

fn format_template(template: &str, args: &[&str]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_string(), |acc, (i, arg)| {
            acc.replace(&format!("{{{i}}}"), arg)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages() {
        let messages = BindingMessages::default();
        assert_eq!(
            messages.attempted_value_is_invalid("abc", "Age"),
            "The value 'abc' is not valid for Age."
        );
        assert_eq!(
            messages.missing_bind_required_value("id"),
            "A value for the 'id' parameter or property was not provided."
        );
        assert_eq!(
            messages.unsupported_content_type("image/png"),
            "Unsupported content type 'image/png'."
        );
        assert_eq!(
            messages.unsupported_content_type(""),
            "Unsupported content type ''."
        );
    }

    #[test]
    fn test_custom_template() {
        let messages = BindingMessages {
            attempted_value_is_invalid: "{1}: bad value {0}".into(),
            ..BindingMessages::default()
        };
        assert_eq!(messages.attempted_value_is_invalid("x", "Age"), "Age: bad value x");
    }
}
