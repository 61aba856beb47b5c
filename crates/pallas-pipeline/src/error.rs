//! Pipeline error types.

use pallas_binding::BindingError;
use pallas_core::PallasError;
use thiserror::Error;

/// Errors raised while invoking an action.
///
/// Errors raised during model binding or by the action (and its action
/// filters) are offered to exception filters first. Anything left unhandled
/// is returned to the host.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request's cancellation token fired.
    #[error("Request canceled before {stage}")]
    Canceled {
        /// The step that was about to run.
        stage: &'static str,
    },

    /// A filter returned an error.
    #[error("Filter '{filter}' failed: {source}")]
    Filter {
        /// Filter name.
        filter: String,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// The action method returned an error.
    #[error("Action '{action}' failed: {source}")]
    Action {
        /// Action display name.
        action: String,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// The action method panicked.
    #[error("Action '{action}' panicked: {message}")]
    Panic {
        /// Action display name.
        action: String,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// Executing an action result failed.
    #[error("Result execution failed: {source}")]
    ResultExecution {
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// Binder selection or a binder failed.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The action or one of its filters is misconfigured.
    #[error("{message}")]
    Configuration {
        /// Description naming the offending type.
        message: String,
    },
}

impl PipelineError {
    /// Creates a cancellation error.
    #[must_use]
    pub fn canceled(stage: &'static str) -> Self {
        Self::Canceled { stage }
    }

    /// Wraps an error raised by a filter.
    pub fn filter(filter: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Filter {
            filter: filter.into(),
            source: source.into(),
        }
    }

    /// Wraps an error raised by an action method.
    pub fn action(action: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Action {
            action: action.into(),
            source: source.into(),
        }
    }

    /// Wraps an error raised while executing a result.
    pub fn result_execution(source: impl Into<anyhow::Error>) -> Self {
        Self::ResultExecution {
            source: source.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` for cancellation.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }
}

impl From<PipelineError> for PallasError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Canceled { .. } => Self::canceled(error.to_string()),
            PipelineError::Configuration { message } => Self::configuration(message),
            PipelineError::Binding(BindingError::Service(source)) => {
                Self::internal_with_source("Service resolution failed during binding", source)
            }
            other => Self::internal_with_source("Unhandled error while invoking action", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pallas_core::ErrorCategory;

    #[test]
    fn test_canceled_maps_to_canceled_category() {
        let err: PallasError = PipelineError::canceled("action method").into();
        assert_eq!(err.category(), ErrorCategory::Canceled);
        assert!(err.to_string().contains("action method"));
    }

    #[test]
    fn test_configuration_keeps_message() {
        let err: PallasError = PipelineError::configuration("bad controller").into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.to_string(), "Configuration error: bad controller");
    }

    #[test]
    fn test_action_error_is_internal_with_source() {
        let err = PipelineError::action("Orders.Get", anyhow::anyhow!("db down"));
        assert_eq!(err.to_string(), "Action 'Orders.Get' failed: db down");
        let err: PallasError = err.into();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(std::error::Error::source(&err).is_some());
    }
}
