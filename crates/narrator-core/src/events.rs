//! Events emitted by the playback engine to its host.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag so hosts can forward them to a
//! frontend unchanged:
//!
//! ```json
//! { "type": "chunk_started", "index": 2 }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{JobId, PlaybackFailure, PlaybackPhase};

/// Something observable happened in the playback pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// The transport moved to a new lifecycle phase.
    PhaseChanged { phase: PlaybackPhase },

    /// A chunked synthesis job was accepted by the service.
    JobStarted {
        #[serde(rename = "jobId")]
        job_id: JobId,
        #[serde(rename = "totalChunks")]
        total_chunks: usize,
    },

    /// The service already had the whole utterance; playing it directly.
    CacheHit,

    /// Playback of a chunk began.
    ChunkStarted { index: usize },

    /// A chunk could not be played and was skipped.
    ChunkSkipped { index: usize, reason: String },

    /// Synthesis progress changed.
    Progress { completed: usize, total: usize },

    /// Every chunk has played.
    Finished,

    /// The session stopped on an error.
    Failed { failure: PlaybackFailure },

    /// The engine was closed; the host should dismiss the player.
    Closed,
}

impl PlaybackEvent {
    /// Whether this event ends the current session.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed { .. } | Self::Closed)
    }
}
