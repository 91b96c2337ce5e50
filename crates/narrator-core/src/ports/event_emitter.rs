//! Event emitter trait for playback events.
//!
//! Implementations handle transport details (channels, SSE, UI bridges).

use tokio::sync::mpsc;

use crate::events::PlaybackEvent;

/// Trait for emitting playback events.
///
/// This abstraction keeps channel types out of the engine's public API.
///
/// # Implementations
///
/// - [`NoopEmitter`] - For contexts that only read transport state
/// - [`ChannelEmitter`] - Forwards into a tokio channel (CLI, tests)
pub trait PlaybackEventEmitter: Send + Sync {
    /// Emit a playback event.
    ///
    /// This method must not block.
    fn emit(&self, event: PlaybackEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl PlaybackEventEmitter for NoopEmitter {
    fn emit(&self, _event: PlaybackEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter> {
        Box::new(self.clone())
    }
}

/// Emitter that forwards every event into an unbounded tokio channel.
///
/// Events emitted after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiver that observes it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PlaybackEventEmitter for ChannelEmitter {
    fn emit(&self, event: PlaybackEvent) {
        let _ = self.tx.send(event);
    }

    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_noop_emitter() {
        let emitter: Arc<dyn PlaybackEventEmitter> = Arc::new(NoopEmitter::new());
        emitter.emit(PlaybackEvent::Finished);
        let _boxed = emitter.clone_box();
    }

    #[test]
    fn test_channel_emitter_forwards() {
        let (emitter, mut rx) = ChannelEmitter::new();
        emitter.emit(PlaybackEvent::ChunkStarted { index: 0 });
        emitter.clone_box().emit(PlaybackEvent::Finished);

        assert_eq!(rx.try_recv().unwrap(), PlaybackEvent::ChunkStarted { index: 0 });
        assert_eq!(rx.try_recv().unwrap(), PlaybackEvent::Finished);
    }

    #[test]
    fn test_channel_emitter_survives_dropped_receiver() {
        let (emitter, rx) = ChannelEmitter::new();
        drop(rx);
        emitter.emit(PlaybackEvent::Closed);
    }
}
