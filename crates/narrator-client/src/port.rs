//! Port trait implementation for `SynthesisClient`.
//!
//! Implements the core-owned `SynthesisClientPort` and maps internal
//! client errors onto `SynthesisPortError`.

use async_trait::async_trait;
use narrator_core::{
    JobId, StreamRequest, StreamStart, SynthesisClientPort, SynthesisJob, SynthesisPortError,
    SynthesisPortResult,
};

use crate::client::SynthesisClient;
use crate::error::ClientError;
use crate::http::HttpBackend;

// ============================================================================
// Error Mapping
// ============================================================================

/// Convert internal `ClientError` to core `SynthesisPortError`.
fn map_error(err: ClientError) -> SynthesisPortError {
    match err {
        ClientError::ApiRequestFailed { status, url } => match status {
            401 | 403 => SynthesisPortError::AuthRequired,
            _ => SynthesisPortError::Api {
                status,
                message: url,
            },
        },
        ClientError::InvalidResponse { message } => SynthesisPortError::InvalidResponse { message },
        ClientError::JobNotFound { job_id } => SynthesisPortError::JobNotFound { job_id },
        ClientError::Network(e) => SynthesisPortError::Network {
            message: e.to_string(),
        },
        ClientError::InvalidUrl(e) => SynthesisPortError::Configuration {
            message: e.to_string(),
        },
        ClientError::JsonParse(e) => SynthesisPortError::InvalidResponse {
            message: e.to_string(),
        },
    }
}

// ============================================================================
// Port Implementation
// ============================================================================

#[async_trait]
impl<B: HttpBackend + Send + Sync> SynthesisClientPort for SynthesisClient<B> {
    async fn start_stream(&self, request: &StreamRequest) -> SynthesisPortResult<StreamStart> {
        self.start_stream(request).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to start synthesis stream");
            map_error(e)
        })
    }

    async fn poll_status(&self, job_id: &JobId) -> SynthesisPortResult<SynthesisJob> {
        self.poll_status(job_id).await.map_err(|e| {
            tracing::warn!(%job_id, error = %e, "Failed to poll synthesis job");
            map_error(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesisClientConfig;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use crate::models::ClientSettings;
    use narrator_core::{JobStatus, Voice};
    use serde_json::json;
    use std::sync::Arc;

    fn port(backend: FakeBackend) -> Arc<dyn SynthesisClientPort> {
        let settings = ClientSettings::from_config(&SynthesisClientConfig::new()).unwrap();
        Arc::new(SynthesisClient::with_backend(settings, backend))
    }

    #[test]
    fn test_map_error_auth() {
        for status in [401, 403] {
            let err = map_error(ClientError::ApiRequestFailed {
                status,
                url: "u".to_string(),
            });
            assert_eq!(err, SynthesisPortError::AuthRequired);
        }
    }

    #[test]
    fn test_map_error_keeps_status() {
        let err = map_error(ClientError::ApiRequestFailed {
            status: 503,
            url: "https://tts/job/1".to_string(),
        });
        assert!(matches!(err, SynthesisPortError::Api { status: 503, .. }));
    }

    #[test]
    fn test_map_error_json_is_invalid_response() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            map_error(ClientError::JsonParse(json_err)),
            SynthesisPortError::InvalidResponse { .. }
        ));
    }

    #[tokio::test]
    async fn test_port_round_trip_through_fake_backend() {
        let port = port(
            FakeBackend::new()
                .with_response(
                    "start-stream",
                    CannedResponse::ok(json!({"jobId": "j1", "totalChunks": 2})),
                )
                .with_response(
                    "job/j1",
                    CannedResponse::ok(json!({
                        "status": "completed",
                        "totalChunks": 2,
                        "completedChunks": 2,
                        "chunkUrls": ["https://cdn/0.mp3", "https://cdn/1.mp3"]
                    })),
                ),
        );

        let start = port
            .start_stream(&StreamRequest::new("Two sentences. Here.", Voice::Onyx))
            .await
            .unwrap();
        let StreamStart::Job { job_id, .. } = start else {
            panic!("expected a job, got {start:?}");
        };

        let job = port.poll_status(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.available_chunks().count(), 2);
    }

    #[tokio::test]
    async fn test_port_maps_missing_job() {
        let port = port(FakeBackend::new());
        let err = port.poll_status(&JobId::new("expired")).await.unwrap_err();
        assert_eq!(
            err,
            SynthesisPortError::JobNotFound {
                job_id: "expired".to_string()
            }
        );
    }
}
