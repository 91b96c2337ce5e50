//! Synthesis job model: requests, start outcomes and polled job snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::voice::Voice;

/// Opaque identifier of a server-side synthesis job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a raw job identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Status reported by the synthesis service for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted but not yet started.
    #[default]
    Pending,
    /// Chunks are being synthesized.
    Processing,
    /// Every chunk has been produced.
    Completed,
    /// The job failed server-side.
    Failed,
}

impl JobStatus {
    /// Whether polling should stop after observing this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Wire label of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Audio container requested from the synthesis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Opus,
    Aac,
    Flac,
}

impl AudioFormat {
    /// Wire label of the format.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
        }
    }
}

/// Everything the synthesis service needs to start a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    /// Text to synthesize.
    pub text: String,
    /// Voice to synthesize with.
    pub voice: Voice,
    /// Container of the produced audio.
    pub response_format: AudioFormat,
}

impl StreamRequest {
    /// Build a request with the default response format.
    pub fn new(text: impl Into<String>, voice: Voice) -> Self {
        Self {
            text: text.into(),
            voice,
            response_format: AudioFormat::default(),
        }
    }

    /// Override the response format.
    #[must_use]
    pub const fn with_format(mut self, format: AudioFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// Outcome of starting a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStart {
    /// The whole utterance is already synthesized; play `url` directly.
    Cached {
        /// Location of the complete audio.
        url: String,
    },
    /// A chunked job was started and must be polled.
    Job {
        /// Job to poll.
        job_id: JobId,
        /// Number of chunks the service expects to produce.
        total_chunks: usize,
    },
}

/// Snapshot of a synthesis job as returned by a status poll.
///
/// `chunk_urls` is index-aligned and sparse: a later index may carry a URL
/// while an earlier one is still `None` (or an empty string on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisJob {
    /// Job identifier.
    pub id: JobId,
    /// Current status.
    pub status: JobStatus,
    /// Number of chunks the job will produce.
    pub total_chunks: usize,
    /// Number of chunks produced so far.
    pub completed_chunks: usize,
    /// Index-aligned chunk URLs.
    #[serde(default)]
    pub chunk_urls: Vec<Option<String>>,
    /// Failure description when `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SynthesisJob {
    /// A freshly started job with no chunks yet.
    pub fn new(id: JobId, total_chunks: usize) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            total_chunks,
            completed_chunks: 0,
            chunk_urls: Vec::new(),
            error_message: None,
        }
    }

    /// URL of the chunk at `index`, if the service has produced it.
    pub fn chunk_url(&self, index: usize) -> Option<&str> {
        self.chunk_urls
            .get(index)
            .and_then(Option::as_deref)
            .filter(|url| !url.is_empty())
    }

    /// All chunks that currently have a URL, in index order.
    pub fn available_chunks(&self) -> impl Iterator<Item = (usize, &str)> {
        self.chunk_urls.iter().enumerate().filter_map(|(index, url)| {
            url.as_deref()
                .filter(|url| !url.is_empty())
                .map(|url| (index, url))
        })
    }

    /// Number of chunk slots the job spans.
    ///
    /// Services occasionally report more URLs than `total_chunks`; the larger
    /// of the two wins so no produced chunk is left unplayed.
    pub fn expected_chunks(&self) -> usize {
        self.total_chunks.max(self.chunk_urls.len())
    }

    /// Non-blank error message reported by the service.
    pub fn failure_message(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }
}
