//! Transport state read by the hosting UI.

use serde::{Deserialize, Serialize};

use super::rate::PlaybackRate;
use super::voice::Voice;

/// Coarse lifecycle of the playback pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    /// A job is starting or running but nothing is audible yet.
    Loading,
    /// A chunk is audible.
    Playing,
    /// The listener paused playback.
    Paused,
    /// The previous chunk ended and the next one is not buffered yet.
    Buffering,
    /// Every chunk has played.
    Finished,
    /// The pipeline stopped on an error.
    Failed,
    /// The engine was closed by its host.
    Closed,
}

impl PlaybackPhase {
    /// Whether no further playback can happen without a new request.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Closed)
    }
}

/// Synthesis progress as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    /// Chunks produced so far.
    pub completed: usize,
    /// Chunks expected in total.
    pub total: usize,
}

impl Progress {
    pub const fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Fraction complete in `0.0..=1.0`; zero when the total is unknown.
    #[allow(clippy::cast_precision_loss)] // chunk counts are small
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed.min(self.total) as f32) / (self.total as f32)
        }
    }
}

/// Snapshot of everything the UI renders for the player.
///
/// Hosts only read this; every mutation goes through the engine's
/// transport controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportState {
    /// Lifecycle phase.
    pub phase: PlaybackPhase,
    /// True until the first playable resource exists.
    pub is_loading: bool,
    /// True while a resource is audibly playing.
    pub is_playing: bool,
    /// Voice used for the current (or next) job.
    pub voice: Voice,
    /// Rate applied to every resource.
    pub rate: PlaybackRate,
    /// Synthesis progress.
    pub progress: Progress,
    /// Index of the chunk that plays next (or is playing).
    pub cursor: usize,
    /// Number of chunk resources currently held in memory.
    pub buffered: usize,
    /// User-facing error message; never set by cancellation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransportState {
    /// Initial state before any request.
    pub fn new(voice: Voice, rate: PlaybackRate) -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            is_loading: false,
            is_playing: false,
            voice,
            rate,
            progress: Progress::default(),
            cursor: 0,
            buffered: 0,
            error: None,
        }
    }

    /// Reset per-job fields for a new job, keeping voice and rate.
    pub fn reset_for_new_job(&mut self) {
        self.phase = PlaybackPhase::Loading;
        self.is_loading = true;
        self.is_playing = false;
        self.progress = Progress::default();
        self.cursor = 0;
        self.buffered = 0;
        self.error = None;
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(Voice::default(), PlaybackRate::default())
    }
}
