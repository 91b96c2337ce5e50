//! Single-resource playback for cache hits.
//!
//! When the service already holds the whole utterance there is no job to
//! poll and nothing to buffer: one resource plays from start to end.

use narrator_core::{MediaBackend, MediaEventSink, MediaResource, PlaybackFailure};

use crate::scheduler::ToggleOutcome;

/// Lifecycle of the cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedState {
    Loading,
    /// Loaded while the listener had paused; starts on the next toggle.
    Ready,
    Playing,
    Paused,
    Finished,
    Failed,
    Stopped,
}

/// Playback of one fully synthesized utterance.
pub struct CachedPlayback {
    url: String,
    resource: Box<dyn MediaResource>,
    state: CachedState,
    hold: bool,
}

impl CachedPlayback {
    /// Begin loading `url`.
    pub fn load(url: &str, rate: f32, media: &dyn MediaBackend, events: MediaEventSink) -> Self {
        Self {
            url: url.to_string(),
            resource: media.load(url, rate, events),
            state: CachedState::Loading,
            hold: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn state(&self) -> CachedState {
        self.state
    }

    pub const fn is_playing(&self) -> bool {
        matches!(self.state, CachedState::Playing)
    }

    pub const fn is_paused(&self) -> bool {
        self.hold || matches!(self.state, CachedState::Paused)
    }

    /// The resource can play through. Returns whether playback started.
    pub fn on_ready(&mut self) -> bool {
        if self.state != CachedState::Loading {
            return false;
        }
        if self.hold {
            self.state = CachedState::Ready;
            return false;
        }
        self.resource.play();
        self.state = CachedState::Playing;
        true
    }

    /// Natural end: the utterance is complete.
    pub fn on_ended(&mut self) -> bool {
        if self.state != CachedState::Playing {
            return false;
        }
        self.resource.stop();
        self.state = CachedState::Finished;
        true
    }

    /// Load or playback failure. Always terminal.
    pub fn on_error(&mut self, reason: &str) -> Option<PlaybackFailure> {
        if matches!(
            self.state,
            CachedState::Finished | CachedState::Failed | CachedState::Stopped
        ) {
            return None;
        }
        self.resource.stop();
        self.state = CachedState::Failed;
        Some(PlaybackFailure::CachedAudioFailed {
            detail: reason.to_string(),
        })
    }

    /// Pause or resume.
    pub fn toggle_pause(&mut self) -> ToggleOutcome {
        match self.state {
            CachedState::Playing => {
                self.resource.pause();
                self.state = CachedState::Paused;
                ToggleOutcome::Paused
            }
            CachedState::Paused => {
                self.resource.play();
                self.state = CachedState::Playing;
                ToggleOutcome::Resumed
            }
            CachedState::Loading => {
                self.hold = !self.hold;
                if self.hold {
                    ToggleOutcome::Paused
                } else {
                    ToggleOutcome::Resumed
                }
            }
            CachedState::Ready => {
                self.hold = false;
                self.resource.play();
                self.state = CachedState::Playing;
                ToggleOutcome::Started(0)
            }
            CachedState::Finished | CachedState::Failed | CachedState::Stopped => {
                ToggleOutcome::NoResource
            }
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        if !matches!(self.state, CachedState::Failed | CachedState::Stopped) {
            self.resource.set_rate(rate);
        }
    }

    /// Silence and release the resource. Idempotent.
    pub fn stop(&mut self) {
        if matches!(self.state, CachedState::Failed | CachedState::Stopped) {
            return;
        }
        if self.state != CachedState::Finished {
            self.resource.stop();
        }
        self.state = CachedState::Stopped;
    }
}

impl std::fmt::Debug for CachedPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPlayback")
            .field("url", &self.url)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_core::testing::{FakeMediaBackend, MediaCall};

    const URL: &str = "https://cdn/full.mp3";

    fn cached(media: &FakeMediaBackend) -> CachedPlayback {
        CachedPlayback::load(URL, 1.0, media, MediaEventSink::noop())
    }

    #[test]
    fn plays_once_ready_and_finishes_on_end() {
        let media = FakeMediaBackend::new();
        let mut playback = cached(&media);
        assert!(media.started().is_empty());

        assert!(playback.on_ready());
        assert!(media.is_playing(URL));

        assert!(playback.on_ended());
        assert_eq!(playback.state(), CachedState::Finished);
    }

    #[test]
    fn error_is_terminal_and_distinct() {
        let media = FakeMediaBackend::new();
        let mut playback = cached(&media);

        let failure = playback.on_error("unsupported codec").unwrap();
        assert_eq!(failure.to_string(), "Failed to play cached audio");
        assert!(playback.on_error("again").is_none());
        assert!(!playback.on_ready());
    }

    #[test]
    fn pause_while_loading_holds_start() {
        let media = FakeMediaBackend::new();
        let mut playback = cached(&media);

        assert_eq!(playback.toggle_pause(), ToggleOutcome::Paused);
        assert!(!playback.on_ready());
        assert_eq!(playback.state(), CachedState::Ready);
        assert!(media.started().is_empty());

        assert_eq!(playback.toggle_pause(), ToggleOutcome::Started(0));
        assert!(playback.is_playing());
    }

    #[test]
    fn pause_resume_and_rate() {
        let media = FakeMediaBackend::new();
        let mut playback = cached(&media);
        playback.on_ready();

        assert_eq!(playback.toggle_pause(), ToggleOutcome::Paused);
        assert!(!media.is_playing(URL));
        playback.set_rate(0.75);
        assert_eq!(playback.toggle_pause(), ToggleOutcome::Resumed);

        assert!(media.is_playing(URL));
        assert_eq!(media.rate_of(URL), Some(0.75));
    }

    #[test]
    fn stop_is_idempotent() {
        let media = FakeMediaBackend::new();
        let mut playback = cached(&media);
        playback.on_ready();

        playback.stop();
        playback.stop();

        let stops = media
            .calls()
            .into_iter()
            .filter(|call| matches!(call, MediaCall::Stop { .. }))
            .count();
        assert_eq!(stops, 1);
        assert_eq!(playback.toggle_pause(), ToggleOutcome::NoResource);
    }
}
