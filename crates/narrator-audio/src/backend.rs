//! [`MediaBackend`] implementation on top of rodio.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use narrator_core::{MediaBackend, MediaEvent, MediaEventSink, MediaResource};

use crate::audio_thread::{AudioThreadHandle, ResourceId};
use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::fetch::{AudioFetcher, decode};

/// Event sink that goes quiet once its resource is stopped.
#[derive(Clone)]
struct GatedEvents {
    sink: MediaEventSink,
    stopped: Arc<AtomicBool>,
}

impl GatedEvents {
    fn emit(&self, event: MediaEvent) {
        if !self.stopped.load(Ordering::SeqCst) {
            self.sink.emit(event);
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Plays chunk URLs on the default output device.
///
/// Each [`load`](MediaBackend::load) downloads the URL on the current tokio
/// runtime, decodes it and parks it on a paused sink, then reports
/// [`MediaEvent::Ready`]. Download and decode failures are reported as
/// [`MediaEvent::Error`] for that resource only.
pub struct RodioMediaBackend {
    audio: Arc<AudioThreadHandle>,
    fetcher: AudioFetcher,
    next_id: AtomicU64,
}

impl RodioMediaBackend {
    /// Open the default output device.
    pub fn new(config: AudioConfig) -> Result<Self, AudioError> {
        let fetcher = AudioFetcher::new(&config)?;
        let audio = AudioThreadHandle::spawn(config.volume)?;
        Ok(Self::with_parts(Arc::new(audio), fetcher))
    }

    fn with_parts(audio: Arc<AudioThreadHandle>, fetcher: AudioFetcher) -> Self {
        Self {
            audio,
            fetcher,
            next_id: AtomicU64::new(1),
        }
    }
}

impl std::fmt::Debug for RodioMediaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioMediaBackend")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl MediaBackend for RodioMediaBackend {
    fn load(&self, url: &str, rate: f32, events: MediaEventSink) -> Box<dyn MediaResource> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stopped = Arc::new(AtomicBool::new(false));
        let events = GatedEvents {
            sink: events,
            stopped: Arc::clone(&stopped),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(load_resource(
                    id,
                    url.to_string(),
                    rate,
                    self.fetcher.clone(),
                    Arc::clone(&self.audio),
                    events,
                ));
            }
            Err(_) => events.emit(MediaEvent::Error(AudioError::NoRuntime.to_string())),
        }

        Box::new(RodioResource {
            id,
            audio: Arc::clone(&self.audio),
            stopped,
        })
    }
}

async fn load_resource(
    id: ResourceId,
    url: String,
    rate: f32,
    fetcher: AudioFetcher,
    audio: Arc<AudioThreadHandle>,
    events: GatedEvents,
) {
    if events.is_stopped() {
        return;
    }

    let result = async {
        let bytes = fetcher.fetch(&url).await?;
        if events.is_stopped() {
            return Ok(false);
        }
        let source = decode(bytes)?;
        let on_end = events.clone();
        audio.prepare(
            id,
            source,
            rate,
            Arc::clone(&events.stopped),
            Box::new(move || on_end.emit(MediaEvent::Ended)),
        )?;
        Ok::<_, AudioError>(true)
    }
    .await;

    match result {
        Ok(true) => {
            tracing::debug!(id, %url, "Audio resource ready");
            events.emit(MediaEvent::Ready);
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(id, %url, error = %e, "Audio resource failed to load");
            events.emit(MediaEvent::Error(e.to_string()));
        }
    }
}

/// Handle to one sink on the audio thread.
struct RodioResource {
    id: ResourceId,
    audio: Arc<AudioThreadHandle>,
    stopped: Arc<AtomicBool>,
}

impl MediaResource for RodioResource {
    fn play(&mut self) {
        if !self.stopped.load(Ordering::SeqCst) {
            self.audio.play(self.id);
        }
    }

    fn pause(&mut self) {
        if !self.stopped.load(Ordering::SeqCst) {
            self.audio.pause(self.id);
        }
    }

    fn stop(&mut self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.audio.stop(self.id);
        }
    }

    fn set_rate(&mut self, rate: f32) {
        if !self.stopped.load(Ordering::SeqCst) {
            self.audio.set_rate(self.id, rate);
        }
    }
}

impl Drop for RodioResource {
    fn drop(&mut self) {
        self.stop();
    }
}
