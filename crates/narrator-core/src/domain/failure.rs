//! User-visible failure taxonomy of the playback pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a playback session stopped without finishing.
///
/// The `Display` text is what the player shows; `detail` fields carry the
/// underlying cause for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackFailure {
    /// The synthesis service could not be reached when starting the job.
    #[error("Failed to start audio generation")]
    StartFailed { detail: String },

    /// A status poll failed in transport.
    #[error("Failed to check generation status")]
    PollFailed { detail: String },

    /// The service reported the job as failed.
    #[error("{}", job_failure_message(.message))]
    JobFailed { message: Option<String> },

    /// The cached full-utterance audio could not be played.
    #[error("Failed to play cached audio")]
    CachedAudioFailed { detail: String },

    /// The job ended without a single chunk becoming audible.
    #[error("No playable audio was produced")]
    NoAudio,
}

#[allow(clippy::ref_option)] // thiserror hands fields over by reference
fn job_failure_message(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("Audio generation failed")
}
