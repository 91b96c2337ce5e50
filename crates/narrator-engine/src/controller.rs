//! Public control surface of the engine.

use std::sync::Arc;

use narrator_core::{
    MediaBackend, NoopEmitter, PlaybackEventEmitter, PlaybackRate, SynthesisClientPort,
    TransportState, Voice,
};
use tokio::sync::{mpsc, oneshot, watch};

use crate::actor::{Command, EngineActor};
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Builder for a playback engine.
///
/// Nothing runs until [`spawn`](Self::spawn) moves the engine onto its own
/// task and hands back a [`TransportController`].
pub struct NarratorEngine {
    config: EngineConfig,
    client: Arc<dyn SynthesisClientPort>,
    media: Arc<dyn MediaBackend>,
    emitter: Box<dyn PlaybackEventEmitter>,
}

impl NarratorEngine {
    pub fn new(
        config: EngineConfig,
        client: Arc<dyn SynthesisClientPort>,
        media: Arc<dyn MediaBackend>,
    ) -> Self {
        Self {
            config,
            client,
            media,
            emitter: Box::new(NoopEmitter::new()),
        }
    }

    /// Receive [`PlaybackEvent`](narrator_core::PlaybackEvent)s through `emitter`.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Box<dyn PlaybackEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Start the engine task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(self) -> TransportController {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let initial = TransportState::new(self.config.voice, self.config.rate);
        let (state_tx, state_rx) = watch::channel(initial);

        let actor = EngineActor::new(
            self.config,
            self.client,
            self.media,
            self.emitter,
            state_tx,
            notices_tx,
        );
        tokio::spawn(actor.run(commands_rx, notices_rx));

        TransportController {
            commands: commands_tx,
            state: state_rx,
        }
    }
}

/// Cloneable handle for driving playback.
///
/// Every method only enqueues a command, so none of them block. Dropping
/// the last controller closes the engine.
#[derive(Clone)]
pub struct TransportController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<TransportState>,
}

impl TransportController {
    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands.send(command).map_err(|_| EngineError::Closed)
    }

    /// Speak `text` with the current voice and rate, replacing whatever
    /// is playing.
    pub fn speak(&self, text: impl Into<String>) -> Result<(), EngineError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(EngineError::EmptyText);
        }
        self.send(Command::Speak(text))
    }

    /// Pause or resume the chunk at the cursor. No-op when nothing is loaded.
    pub fn toggle_play_pause(&self) -> Result<(), EngineError> {
        self.send(Command::TogglePlayPause)
    }

    /// Apply `rate` to the current resource and every later one.
    pub fn set_playback_rate(&self, rate: PlaybackRate) -> Result<(), EngineError> {
        self.send(Command::SetRate(rate))
    }

    /// Step to the next rate preset, wrapping around.
    pub fn cycle_playback_rate(&self) -> Result<(), EngineError> {
        self.send(Command::CycleRate)
    }

    /// Switch voice. The current text restarts from the beginning with the
    /// new voice; buffered audio is discarded.
    pub fn set_voice(&self, voice: Voice) -> Result<(), EngineError> {
        self.send(Command::SetVoice(voice))
    }

    /// Stop everything and shut the engine down.
    ///
    /// Safe to call in any state, including after the engine has closed.
    /// Returns once every resource has been stopped.
    pub async fn close(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.commands.send(Command::Close(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Whether the engine has shut down.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Snapshot of the transport state.
    pub fn state(&self) -> TransportState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published transport state.
    pub fn subscribe(&self) -> watch::Receiver<TransportState> {
        self.state.clone()
    }

    /// Wait until playback finishes, fails or the engine closes.
    pub async fn wait_until_done(&self) -> TransportState {
        let mut rx = self.subscribe();
        let done = rx
            .wait_for(|state| state.phase.is_terminal())
            .await
            .map(|state| state.clone());
        done.unwrap_or_else(|_| self.state())
    }
}

impl std::fmt::Debug for TransportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportController")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
