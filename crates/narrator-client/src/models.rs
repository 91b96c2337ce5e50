//! Internal settings and wire types for the synthesis service.
//!
//! These types are internal to `narrator-client`. Consumers only see the
//! domain types from `narrator-core` through `SynthesisClientPort`.

use narrator_core::{JobId, JobStatus, StreamRequest, StreamStart, SynthesisJob};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::config::SynthesisClientConfig;
use crate::error::{ClientError, ClientResult};

// ============================================================================
// Settings (derived from the public config)
// ============================================================================

/// Validated client settings.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base URL, always ending in `/`
    pub base_url: Url,
    pub user_agent: String,
    pub timeout: Duration,
    pub token: Option<String>,
}

impl ClientSettings {
    /// Validate a public config.
    ///
    /// The base URL gets a trailing slash so that `Url::join` keeps its last
    /// path segment.
    pub fn from_config(config: &SynthesisClientConfig) -> ClientResult<Self> {
        let mut raw = config.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        Ok(Self {
            base_url,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
            token: config.token.clone(),
        })
    }
}

// ============================================================================
// Start stream
// ============================================================================

/// Body of `POST start-stream`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartStreamBody<'a> {
    pub text: &'a str,
    pub voice: &'static str,
    pub response_format: &'static str,
}

impl<'a> From<&'a StreamRequest> for StartStreamBody<'a> {
    fn from(request: &'a StreamRequest) -> Self {
        Self {
            text: &request.text,
            voice: request.voice.as_str(),
            response_format: request.response_format.as_str(),
        }
    }
}

/// Response of `POST start-stream`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartStreamResponse {
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub cache_url: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub total_chunks: Option<usize>,
}

impl StartStreamResponse {
    /// Interpret the response as a cache hit or a job to poll.
    pub fn into_stream_start(self) -> ClientResult<StreamStart> {
        if self.cached {
            let url = non_blank(self.cache_url).ok_or_else(|| ClientError::InvalidResponse {
                message: "cached response without cacheUrl".to_string(),
            })?;
            return Ok(StreamStart::Cached { url });
        }

        let job_id = non_blank(self.job_id).ok_or_else(|| ClientError::InvalidResponse {
            message: "stream response without jobId".to_string(),
        })?;
        Ok(StreamStart::Job {
            job_id: JobId::new(job_id),
            total_chunks: self.total_chunks.unwrap_or(0),
        })
    }
}

// ============================================================================
// Job status
// ============================================================================

/// Response of `GET job/{jobId}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub total_chunks: usize,
    #[serde(default)]
    pub completed_chunks: usize,
    #[serde(default)]
    pub chunk_urls: Vec<Option<String>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl JobStatusResponse {
    /// Convert to a domain snapshot for `job_id`.
    ///
    /// Empty-string URLs become holes.
    pub fn into_job(self, job_id: &JobId) -> SynthesisJob {
        SynthesisJob {
            id: job_id.clone(),
            status: self.status,
            total_chunks: self.total_chunks,
            completed_chunks: self.completed_chunks,
            chunk_urls: self.chunk_urls.into_iter().map(non_blank).collect(),
            error_message: self.error_message,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_core::{AudioFormat, Voice};
    use serde_json::json;

    #[test]
    fn test_settings_add_trailing_slash() {
        let config = SynthesisClientConfig::new().with_base_url("https://tts.example.edu/api");
        let settings = ClientSettings::from_config(&config).unwrap();
        assert_eq!(settings.base_url.as_str(), "https://tts.example.edu/api/");
        assert_eq!(
            settings.base_url.join("start-stream").unwrap().as_str(),
            "https://tts.example.edu/api/start-stream"
        );
    }

    #[test]
    fn test_settings_reject_bad_base_url() {
        let config = SynthesisClientConfig::new().with_base_url("not a url");
        assert!(matches!(
            ClientSettings::from_config(&config),
            Err(ClientError::InvalidUrl(_))
        ));

        let config = SynthesisClientConfig::new().with_base_url("mailto:someone@example.edu");
        assert!(ClientSettings::from_config(&config).is_err());
    }

    #[test]
    fn test_start_body_wire_names() {
        let request = StreamRequest::new("Chapter one.", Voice::Fable).with_format(AudioFormat::Opus);
        let body = serde_json::to_value(StartStreamBody::from(&request)).unwrap();
        assert_eq!(
            body,
            json!({"text": "Chapter one.", "voice": "fable", "responseFormat": "opus"})
        );
    }

    #[test]
    fn test_cached_response() {
        let response: StartStreamResponse =
            serde_json::from_value(json!({"cached": true, "cacheUrl": "https://cdn/full.mp3"}))
                .unwrap();
        assert_eq!(
            response.into_stream_start().unwrap(),
            StreamStart::Cached {
                url: "https://cdn/full.mp3".to_string()
            }
        );
    }

    #[test]
    fn test_cached_response_without_url_is_invalid() {
        let response: StartStreamResponse =
            serde_json::from_value(json!({"cached": true, "cacheUrl": ""})).unwrap();
        assert!(matches!(
            response.into_stream_start(),
            Err(ClientError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_job_response() {
        let response: StartStreamResponse =
            serde_json::from_value(json!({"cached": false, "jobId": "job-3", "totalChunks": 5}))
                .unwrap();
        assert_eq!(
            response.into_stream_start().unwrap(),
            StreamStart::Job {
                job_id: JobId::new("job-3"),
                total_chunks: 5
            }
        );
    }

    #[test]
    fn test_job_status_blank_urls_become_holes() {
        let response: JobStatusResponse = serde_json::from_value(json!({
            "status": "processing",
            "totalChunks": 3,
            "completedChunks": 2,
            "chunkUrls": ["https://cdn/0.mp3", "", "https://cdn/2.mp3"]
        }))
        .unwrap();

        let job = response.into_job(&JobId::new("job-3"));
        assert_eq!(job.id.as_str(), "job-3");
        assert_eq!(job.chunk_urls[1], None);
        assert_eq!(job.available_chunks().count(), 2);
    }

    #[test]
    fn test_job_status_failed_with_message() {
        let response: JobStatusResponse = serde_json::from_value(json!({
            "status": "failed",
            "totalChunks": 3,
            "completedChunks": 0,
            "chunkUrls": [],
            "errorMessage": "bad input"
        }))
        .unwrap();

        let job = response.into_job(&JobId::new("job-4"));
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.failure_message(), Some("bad input"));
    }
}
