//! Synthesis service client.
//!
//! Wraps the two service endpoints. Holds no state between calls.

use narrator_core::{JobId, StreamRequest, StreamStart, SynthesisJob};
use url::Url;

use crate::config::SynthesisClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::{ClientSettings, JobStatusResponse, StartStreamBody, StartStreamResponse};

// ============================================================================
// Type Aliases
// ============================================================================

/// Default synthesis client using the reqwest HTTP backend.
pub type DefaultSynthesisClient = SynthesisClient<ReqwestBackend>;

// ============================================================================
// Client
// ============================================================================

/// Client for the speech-synthesis service.
///
/// Generic over an HTTP backend so tests can run without a network. Use
/// [`DefaultSynthesisClient`] in production code.
pub struct SynthesisClient<B: HttpBackend> {
    pub(crate) backend: B,
    pub(crate) settings: ClientSettings,
}

impl DefaultSynthesisClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &SynthesisClientConfig) -> ClientResult<Self> {
        let settings = ClientSettings::from_config(config)?;
        let backend = ReqwestBackend::new(&settings)?;
        tracing::debug!(base_url = %settings.base_url, "Created synthesis client");
        Ok(Self { backend, settings })
    }
}

impl<B: HttpBackend> SynthesisClient<B> {
    /// Create a new client with a custom backend.
    #[cfg(test)]
    pub(crate) const fn with_backend(settings: ClientSettings, backend: B) -> Self {
        Self { backend, settings }
    }

    fn start_stream_url(&self) -> ClientResult<Url> {
        Ok(self.settings.base_url.join("start-stream")?)
    }

    fn job_url(&self, job_id: &JobId) -> ClientResult<Url> {
        let mut url = self.settings.base_url.join("job/")?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(job_id.as_str());
        Ok(url)
    }

    /// Start synthesizing `request`.
    pub async fn start_stream(&self, request: &StreamRequest) -> ClientResult<StreamStart> {
        let url = self.start_stream_url()?;
        tracing::debug!(
            %url,
            voice = %request.voice,
            chars = request.text.len(),
            "Starting synthesis stream"
        );

        let response: StartStreamResponse = self
            .backend
            .post_json(&url, &StartStreamBody::from(request))
            .await?;
        response.into_stream_start()
    }

    /// Fetch the current snapshot of `job_id`.
    ///
    /// A 404 means the job expired or never existed.
    pub async fn poll_status(&self, job_id: &JobId) -> ClientResult<SynthesisJob> {
        let url = self.job_url(job_id)?;
        tracing::trace!(%url, "Polling synthesis job");

        match self.backend.get_json::<JobStatusResponse>(&url).await {
            Ok(response) => Ok(response.into_job(job_id)),
            Err(ClientError::ApiRequestFailed { status: 404, .. }) => Err(ClientError::JobNotFound {
                job_id: job_id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use narrator_core::{JobStatus, Voice};
    use serde_json::json;

    fn test_settings() -> ClientSettings {
        ClientSettings::from_config(
            &SynthesisClientConfig::new().with_base_url("https://tts.example.edu/api"),
        )
        .unwrap()
    }

    fn client(backend: FakeBackend) -> SynthesisClient<FakeBackend> {
        SynthesisClient::with_backend(test_settings(), backend)
    }

    #[test]
    fn test_default_client_creation() {
        let config = SynthesisClientConfig::new();
        assert!(DefaultSynthesisClient::new(&config).is_ok());
    }

    #[test]
    fn test_default_client_rejects_invalid_base_url() {
        let config = SynthesisClientConfig::new().with_base_url("::nope::");
        assert!(matches!(
            DefaultSynthesisClient::new(&config),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_job_url_escapes_id() {
        let client = client(FakeBackend::new());
        let url = client.job_url(&JobId::new("a b/c")).unwrap();
        assert_eq!(url.as_str(), "https://tts.example.edu/api/job/a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_start_stream_posts_request() {
        let client = client(FakeBackend::new().with_response(
            "start-stream",
            CannedResponse::ok(json!({"cached": false, "jobId": "job-1", "totalChunks": 3})),
        ));

        let start = client
            .start_stream(&StreamRequest::new("Hello there.", Voice::Echo))
            .await
            .unwrap();

        assert_eq!(
            start,
            StreamStart::Job {
                job_id: JobId::new("job-1"),
                total_chunks: 3
            }
        );
        let requests = client.backend.requests();
        assert_eq!(requests[0].url, "https://tts.example.edu/api/start-stream");
        assert_eq!(
            requests[0].body,
            Some(json!({"text": "Hello there.", "voice": "echo", "responseFormat": "mp3"}))
        );
    }

    #[tokio::test]
    async fn test_start_stream_cache_hit() {
        let client = client(FakeBackend::new().with_response(
            "start-stream",
            CannedResponse::ok(json!({"cached": true, "cacheUrl": "https://cdn/full.mp3"})),
        ));

        let start = client
            .start_stream(&StreamRequest::new("Hi.", Voice::Alloy))
            .await
            .unwrap();
        assert!(matches!(start, StreamStart::Cached { url } if url == "https://cdn/full.mp3"));
    }

    #[tokio::test]
    async fn test_start_stream_server_error() {
        let client =
            client(FakeBackend::new().with_response("start-stream", CannedResponse::status(500)));

        let result = client
            .start_stream(&StreamRequest::new("Hi.", Voice::Alloy))
            .await;
        assert!(matches!(
            result,
            Err(ClientError::ApiRequestFailed { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_poll_status_parses_sparse_urls() {
        let client = client(FakeBackend::new().with_response(
            "job/job-1",
            CannedResponse::ok(json!({
                "status": "processing",
                "totalChunks": 3,
                "completedChunks": 2,
                "chunkUrls": ["https://cdn/0.mp3", null, "https://cdn/2.mp3"]
            })),
        ));

        let job = client.poll_status(&JobId::new("job-1")).await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.chunk_url(0), Some("https://cdn/0.mp3"));
        assert_eq!(job.chunk_url(1), None);
        assert_eq!(job.chunk_url(2), Some("https://cdn/2.mp3"));
    }

    #[tokio::test]
    async fn test_poll_status_missing_job() {
        let client = client(FakeBackend::new());
        let result = client.poll_status(&JobId::new("gone")).await;
        assert!(matches!(result, Err(ClientError::JobNotFound { job_id }) if job_id == "gone"));
    }
}
