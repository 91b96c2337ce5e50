//! Media playback port.
//!
//! A [`MediaBackend`] turns a URL into a [`MediaResource`] that loads in the
//! background. Loading, natural end and errors are reported asynchronously
//! through the [`MediaEventSink`] handed to [`MediaBackend::load`], the same
//! way a browser audio element fires `canplaythrough`, `ended` and `error`.

use std::fmt;
use std::sync::Arc;

/// Lifecycle notification from a media resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// Enough audio is buffered to play through.
    Ready,
    /// Playback reached the end of the resource.
    Ended,
    /// Loading or playback failed.
    Error(String),
}

/// Callback target for [`MediaEvent`]s.
///
/// Cheap to clone; the engine builds one per resource so every event arrives
/// already tagged with the chunk it belongs to.
#[derive(Clone)]
pub struct MediaEventSink {
    deliver: Arc<dyn Fn(MediaEvent) + Send + Sync>,
}

impl MediaEventSink {
    /// Wrap a delivery callback.
    pub fn new(deliver: impl Fn(MediaEvent) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// A sink that drops every event.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Deliver an event. Never blocks.
    pub fn emit(&self, event: MediaEvent) {
        (self.deliver)(event);
    }
}

impl fmt::Debug for MediaEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaEventSink").finish_non_exhaustive()
    }
}

/// A single playable audio resource.
///
/// All methods are non-blocking commands. Calling them before the resource
/// reported [`MediaEvent::Ready`] is allowed; implementations apply them once
/// loading completes.
pub trait MediaResource: Send {
    /// Start or resume playback.
    fn play(&mut self);

    /// Pause playback, keeping the position.
    fn pause(&mut self);

    /// Stop playback for good and release the underlying audio handle.
    ///
    /// No further events are delivered after `stop`.
    fn stop(&mut self);

    /// Change the playback speed multiplier.
    fn set_rate(&mut self, rate: f32);
}

/// Factory for [`MediaResource`]s.
pub trait MediaBackend: Send + Sync {
    /// Begin loading `url` at the given speed multiplier.
    ///
    /// Returns immediately; readiness and failures arrive through `events`.
    fn load(&self, url: &str, rate: f32, events: MediaEventSink) -> Box<dyn MediaResource>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn sink_delivers_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::clone(&seen);
        let sink = MediaEventSink::new(move |event| target.lock().unwrap().push(event));

        sink.emit(MediaEvent::Ready);
        sink.clone().emit(MediaEvent::Ended);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![MediaEvent::Ready, MediaEvent::Ended]
        );
    }

    #[test]
    fn noop_sink_accepts_events() {
        MediaEventSink::noop().emit(MediaEvent::Error("ignored".to_string()));
    }
}
