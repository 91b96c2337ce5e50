//! Synthesis service port.
//!
//! The engine consumes the remote service through exactly two operations:
//! starting a streaming job and polling its status.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{JobId, StreamRequest, StreamStart, SynthesisJob};

/// Errors from synthesis service operations.
///
/// Implementation-specific errors (HTTP, JSON) are mapped to these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisPortError {
    /// The service could not be reached.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error
        message: String,
    },

    /// The service answered with an error status.
    #[error("Synthesis service returned status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response summary
        message: String,
    },

    /// The polled job does not exist (expired or never created).
    #[error("Synthesis job not found: {job_id}")]
    JobNotFound {
        /// The job that was polled
        job_id: String,
    },

    /// Credentials were missing or rejected.
    #[error("Authentication required by the synthesis service")]
    AuthRequired,

    /// The service answered with something unparseable or inconsistent.
    #[error("Invalid response from synthesis service: {message}")]
    InvalidResponse {
        /// What was invalid
        message: String,
    },

    /// The client is misconfigured (bad base URL, etc.).
    #[error("Configuration error: {message}")]
    Configuration {
        /// What's wrong with the configuration
        message: String,
    },
}

/// Result type alias for synthesis port operations.
pub type SynthesisPortResult<T> = Result<T, SynthesisPortError>;

/// Port for the remote speech-synthesis service.
///
/// Implementations perform a single attempt per call; retry policy belongs
/// to the caller.
#[async_trait]
pub trait SynthesisClientPort: Send + Sync {
    /// Start synthesizing `request`.
    ///
    /// Returns [`StreamStart::Cached`] when the service already holds the
    /// full utterance, otherwise the job to poll.
    async fn start_stream(&self, request: &StreamRequest) -> SynthesisPortResult<StreamStart>;

    /// Fetch the current snapshot of a job.
    ///
    /// Idempotent: repeated calls never change server state.
    async fn poll_status(&self, job_id: &JobId) -> SynthesisPortResult<SynthesisJob>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = SynthesisPortError::Api {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert!(err.to_string().contains("503"));

        let err = SynthesisPortError::JobNotFound {
            job_id: "job-9".to_string(),
        };
        assert!(err.to_string().contains("job-9"));
    }
}
