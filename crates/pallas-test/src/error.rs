//! Test error types.

use pallas::core::PallasError;

/// Errors that can occur while sending a test request.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// A header name or value is invalid.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The response body could not be read.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The application answered with an error instead of a response.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PallasError),
}

impl TestError {
    /// The application error, if the pipeline failed.
    #[must_use]
    pub fn pallas_error(&self) -> Option<&PallasError> {
        match self {
            Self::Pipeline(error) => Some(error),
            _ => None,
        }
    }
}
