//! Internal error types for synthesis service calls.
//!
//! These errors are mapped to `SynthesisPortError` at the port boundary.

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors related to synthesis service calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request failed with an HTTP error status.
    #[error("Synthesis request failed with status {status}: {url}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The service returned an invalid or inconsistent response.
    #[error("Invalid response from synthesis service: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// The polled job does not exist.
    #[error("Synthesis job '{job_id}' not found")]
    JobNotFound {
        /// The job ID that was not found
        job_id: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
