//! Error types for Pallas.
//!
//! This module provides the [`PallasError`] type, which is the error returned
//! to the host when a request cannot be turned into a response by the
//! framework itself (configuration faults, unhandled action exceptions,
//! cancellation).
//!
//! Binding and validation problems are *not* reported through this type.
//! They are recorded in the [`ModelStateDictionary`](crate::ModelStateDictionary)
//! and only become responses when a filter or the action decides so.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`PallasError`].
pub type PallasResult<T> = Result<T, PallasError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Application or framework misconfiguration detected at runtime.
    Configuration,
    /// Request validation errors surfaced to the host.
    Validation,
    /// Authorization denied.
    Authorization,
    /// Unknown action or resource.
    NotFound,
    /// The request was canceled (client disconnect or host shutdown).
    Canceled,
    /// Internal server errors, including unhandled action exceptions.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Canceled => StatusCode::REQUEST_TIMEOUT,
            Self::Configuration | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Pallas.
///
/// # Example
///
/// ```
/// use pallas_core::{ErrorCategory, PallasError};
///
/// let err = PallasError::configuration("no input formatter registered");
/// assert_eq!(err.category(), ErrorCategory::Configuration);
/// ```
#[derive(Error, Debug)]
pub enum PallasError {
    /// The framework or application is misconfigured.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Validation failed in a way the host must see.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
    },

    /// Authorization denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
    },

    /// The requested action or resource does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// The request was canceled before it completed.
    #[error("Request canceled: {message}")]
    Canceled {
        /// Where the cancellation was observed.
        message: String,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl PallasError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::Canceled {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Canceled { .. } => ErrorCategory::Canceled,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_DENIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Canceled { .. } => "CANCELED",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Serializable error envelope written by hosts that turn a [`PallasError`]
/// into a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// The error detail.
    pub error: ErrorDetail,
    /// Request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail inside an [`ErrorEnvelope`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let err = PallasError::configuration("bad activator");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Configuration error: bad activator");
    }

    #[test]
    fn test_internal_with_source_keeps_chain() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = PallasError::internal_with_source("action failed", source);
        let chained = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(chained.as_deref(), Some("disk gone"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PallasError::authorization("no").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            PallasError::not_found("missing").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PallasError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_envelope_serialization() {
        let err = PallasError::canceled("before action");
        let envelope = err.to_envelope(Some("req-1"));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"]["code"], "CANCELED");
        assert_eq!(json["error"]["category"], "canceled");
        assert_eq!(json["request_id"], "req-1");
    }

    #[test]
    fn test_envelope_without_request_id() {
        let envelope = PallasError::internal("boom").to_envelope(None);
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("request_id"));
    }
}
