//! Dedicated audio output thread.
//!
//! `rodio::OutputStream` is `!Send` on some platforms. It lives on one OS
//! thread together with every sink created from it, and the rest of the
//! crate talks to that thread through [`AudioThreadHandle`].
//!
//! Each media resource owns one sink, addressed by a [`ResourceId`]. Sinks
//! are created paused and only start when the resource is told to play.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::error::AudioError;
use crate::fetch::AudioSource;

/// Identifies one resource's sink on the audio thread.
pub(crate) type ResourceId = u64;

/// Callback invoked when a sink drains naturally.
pub(crate) type PlaybackDoneCallback = Box<dyn FnOnce() + Send + 'static>;

// ── Commands ───────────────────────────────────────────────────────

enum AudioCommand {
    /// Queue decoded audio on a fresh, paused sink.
    Prepare {
        id: ResourceId,
        source: AudioSource,
        rate: f32,
        stopped: Arc<AtomicBool>,
        on_done: PlaybackDoneCallback,
        reply: mpsc::Sender<Result<(), AudioError>>,
    },

    Play {
        id: ResourceId,
    },

    Pause {
        id: ResourceId,
    },

    SetRate {
        id: ResourceId,
        rate: f32,
    },

    /// Stop and drop the sink (fire-and-forget).
    Stop {
        id: ResourceId,
    },

    Shutdown,
}

/// Per-resource state on the audio thread.
///
/// Commands may arrive before `Prepare` (the download is still running), in
/// which case they are recorded and applied once the sink exists.
#[derive(Default)]
struct Slot {
    sink: Option<Arc<Sink>>,
    wants_play: bool,
    rate: Option<f32>,
    stopped: Option<Arc<AtomicBool>>,
    on_done: Option<PlaybackDoneCallback>,
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// `Send + Sync` handle to the audio output thread.
///
/// Fire-and-forget commands never block. [`prepare`](Self::prepare) waits
/// for the audio thread to acknowledge, which takes microseconds.
pub(crate) struct AudioThreadHandle {
    cmd_tx: mpsc::Sender<AudioCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AudioThreadHandle {
    /// Spawn the audio thread and open the default output device on it.
    pub(crate) fn spawn(volume: f32) -> Result<Self, AudioError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), AudioError>>();

        let thread = thread::Builder::new()
            .name("narrator-audio".into())
            .spawn(move || Self::run(volume, &cmd_rx, &init_tx))
            .map_err(|e| AudioError::OutputStreamError(format!("failed to spawn audio thread: {e}")))?;

        init_rx.recv().map_err(|_| AudioError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    /// A handle whose thread is already gone. Every call fails or is dropped.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        let (cmd_tx, _) = mpsc::channel();
        Self {
            cmd_tx,
            thread: None,
        }
    }

    /// Queue `source` on a paused sink for resource `id`.
    pub(crate) fn prepare(
        &self,
        id: ResourceId,
        source: AudioSource,
        rate: f32,
        stopped: Arc<AtomicBool>,
        on_done: PlaybackDoneCallback,
    ) -> Result<(), AudioError> {
        let (reply, rx) = mpsc::channel();
        self.cmd_tx
            .send(AudioCommand::Prepare {
                id,
                source,
                rate,
                stopped,
                on_done,
                reply,
            })
            .map_err(|_| AudioError::AudioThreadDied)?;
        rx.recv().map_err(|_| AudioError::AudioThreadDied)?
    }

    pub(crate) fn play(&self, id: ResourceId) {
        let _ = self.cmd_tx.send(AudioCommand::Play { id });
    }

    pub(crate) fn pause(&self, id: ResourceId) {
        let _ = self.cmd_tx.send(AudioCommand::Pause { id });
    }

    pub(crate) fn set_rate(&self, id: ResourceId, rate: f32) {
        let _ = self.cmd_tx.send(AudioCommand::SetRate { id, rate });
    }

    pub(crate) fn stop(&self, id: ResourceId) {
        let _ = self.cmd_tx.send(AudioCommand::Stop { id });
    }

    // ── Audio thread event loop ────────────────────────────────────

    fn run(
        volume: f32,
        cmd_rx: &mpsc::Receiver<AudioCommand>,
        init_tx: &mpsc::Sender<Result<(), AudioError>>,
    ) {
        let (_stream, stream_handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(AudioError::OutputStreamError(e.to_string())));
                return;
            }
        };
        if init_tx.send(Ok(())).is_err() {
            return;
        }
        tracing::info!("Audio output initialized on default device");

        let mut slots: HashMap<ResourceId, Slot> = HashMap::new();

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::Prepare {
                    id,
                    source,
                    rate,
                    stopped,
                    on_done,
                    reply,
                } => {
                    let result = Self::prepare_slot(
                        &stream_handle,
                        slots.entry(id).or_default(),
                        source,
                        rate,
                        volume,
                        stopped,
                        on_done,
                    );
                    if result.is_err() || slots.get(&id).is_some_and(|s| s.sink.is_none()) {
                        slots.remove(&id);
                    }
                    let _ = reply.send(result);
                }

                AudioCommand::Play { id } => {
                    let slot = slots.entry(id).or_default();
                    slot.wants_play = true;
                    Self::start_if_wanted(slot);
                }

                AudioCommand::Pause { id } => {
                    if let Some(slot) = slots.get_mut(&id) {
                        slot.wants_play = false;
                        if let Some(sink) = &slot.sink {
                            sink.pause();
                        }
                    }
                }

                AudioCommand::SetRate { id, rate } => {
                    let slot = slots.entry(id).or_default();
                    slot.rate = Some(rate);
                    if let Some(sink) = &slot.sink {
                        sink.set_speed(rate.max(0.1));
                    }
                }

                AudioCommand::Stop { id } => {
                    if let Some(slot) = slots.remove(&id) {
                        if let Some(sink) = slot.sink {
                            sink.stop();
                        }
                    }
                }

                AudioCommand::Shutdown => break,
            }
        }

        for (_, slot) in slots.drain() {
            if let Some(sink) = slot.sink {
                sink.stop();
            }
        }
        tracing::debug!("Audio thread shutting down");
    }

    fn prepare_slot(
        stream_handle: &OutputStreamHandle,
        slot: &mut Slot,
        source: AudioSource,
        rate: f32,
        volume: f32,
        stopped: Arc<AtomicBool>,
        on_done: PlaybackDoneCallback,
    ) -> Result<(), AudioError> {
        if stopped.load(Ordering::SeqCst) {
            return Ok(());
        }
        let sink = Sink::try_new(stream_handle)
            .map_err(|e| AudioError::OutputStreamError(e.to_string()))?;
        sink.pause();
        sink.set_volume(volume);
        sink.set_speed(slot.rate.unwrap_or(rate).max(0.1));
        sink.append(source);

        slot.sink = Some(Arc::new(sink));
        slot.stopped = Some(stopped);
        slot.on_done = Some(on_done);
        Self::start_if_wanted(slot);
        Ok(())
    }

    fn start_if_wanted(slot: &mut Slot) {
        if !slot.wants_play {
            return;
        }
        let Some(sink) = &slot.sink else {
            return;
        };
        sink.play();
        if let (Some(on_done), Some(stopped)) = (slot.on_done.take(), slot.stopped.clone()) {
            spawn_completion_watcher(Arc::clone(sink), stopped, on_done);
        }
    }
}

/// Block a helper thread until `sink` drains, then report a natural end.
///
/// `Sink::stop` also wakes the watcher; the `stopped` flag tells the two
/// apart.
fn spawn_completion_watcher(
    sink: Arc<Sink>,
    stopped: Arc<AtomicBool>,
    on_done: PlaybackDoneCallback,
) {
    thread::spawn(move || {
        sink.sleep_until_end();
        if stopped.load(Ordering::SeqCst) {
            return;
        }
        tracing::trace!("Sink drained");
        on_done();
    });
}

impl Drop for AudioThreadHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::decode;
    use crate::fetch::testing::wav_bytes;

    #[test]
    fn detached_handle_reports_dead_thread() {
        let handle = AudioThreadHandle::detached();
        let source = decode(wav_bytes(8000, 80)).unwrap();

        let err = handle
            .prepare(1, source, 1.0, Arc::new(AtomicBool::new(false)), Box::new(|| {}))
            .unwrap_err();
        assert!(matches!(err, AudioError::AudioThreadDied));

        // Fire-and-forget commands are silently dropped.
        handle.play(1);
        handle.stop(1);
    }
}
