//! Errors returned by [`TransportController`](crate::TransportController).
//!
//! Playback failures are not errors of the handle: they end up in
//! `TransportState::error` and in `PlaybackEvent::Failed`.

use thiserror::Error;

/// Errors from transport control calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine was closed; create a new one to play again.
    #[error("Playback engine is closed")]
    Closed,

    /// `speak` was called with nothing to say.
    #[error("Nothing to speak: text is empty")]
    EmptyText,
}
