//! Binding errors.
//!
//! Bad input is never a [`BindingError`]: it is recorded in model state and
//! binding carries on. A `BindingError` means binding itself could not run
//! (missing service, unknown binder, no binder for a type) and is treated by
//! the pipeline as an unhandled exception.

use pallas_core::ServiceError;
use pallas_validation::ValidationError;
use thiserror::Error;

/// Error raised while binding or validating a parameter.
#[derive(Debug, Error)]
pub enum BindingError {
    /// No binder provider could bind the type.
    #[error("Could not create a model binder for model object of type '{type_name}'.")]
    BinderNotFound {
        /// The model type.
        type_name: String,
    },

    /// A named binder was requested but never registered.
    #[error("No model binder named '{name}' is registered.")]
    UnknownBinder {
        /// The requested binder name.
        name: String,
    },

    /// A service parameter could not be resolved.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// An input formatter failed to run.
    #[error("Input formatter '{formatter}' failed: {message}")]
    Formatter {
        /// The formatter name.
        formatter: &'static str,
        /// What went wrong.
        message: String,
    },

    /// Validation of the bound value could not run.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A custom binder failed.
    #[error("Model binder '{binder}' failed: {message}")]
    Binder {
        /// The binder name.
        binder: String,
        /// What went wrong.
        message: String,
    },
}

impl BindingError {
    /// Creates a binder-not-found error.
    #[must_use]
    pub fn binder_not_found(type_name: impl Into<String>) -> Self {
        Self::BinderNotFound {
            type_name: type_name.into(),
        }
    }

    /// Creates an unknown-binder error.
    #[must_use]
    pub fn unknown_binder(name: impl Into<String>) -> Self {
        Self::UnknownBinder { name: name.into() }
    }

    /// Creates a custom binder failure.
    #[must_use]
    pub fn binder(binder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Binder {
            binder: binder.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            BindingError::binder_not_found("Widget").to_string(),
            "Could not create a model binder for model object of type 'Widget'."
        );
        assert_eq!(
            BindingError::unknown_binder("csv").to_string(),
            "No model binder named 'csv' is registered."
        );
        let err: BindingError = ServiceError::not_registered::<String>().into();
        assert!(err.to_string().contains("String"));
    }
}
