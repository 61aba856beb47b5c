//! Validation pass errors.
//!
//! These are failures of the validation machinery, not validation results.
//! A model that fails its rules records errors in model state; a validator
//! that cannot run at all returns a [`ValidationError`], which aborts the pass.

use thiserror::Error;

/// Error raised while running validators.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A validator failed to run.
    #[error("Validator '{validator}' failed on '{key}': {message}")]
    ValidatorFailed {
        /// The validator name.
        validator: String,
        /// The model-state key being validated.
        key: String,
        /// What went wrong.
        message: String,
    },

    /// The object graph is deeper than the configured limit.
    #[error(
        "Validation exceeded the maximum configured validation depth '{max_depth}' when validating type '{type_name}'"
    )]
    MaxDepthExceeded {
        /// The configured limit.
        max_depth: usize,
        /// The type being visited when the limit was hit.
        type_name: String,
    },
}

impl ValidationError {
    /// Creates a validator failure.
    #[must_use]
    pub fn validator_failed(
        validator: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ValidatorFailed {
            validator: validator.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ValidationError::validator_failed("Checksum", "order", "backend unavailable");
        assert_eq!(
            err.to_string(),
            "Validator 'Checksum' failed on 'order': backend unavailable"
        );

        let err = ValidationError::MaxDepthExceeded {
            max_depth: 32,
            type_name: "Node".into(),
        };
        assert!(err.to_string().contains("'32'"));
        assert!(err.to_string().contains("'Node'"));
    }
}
