//! Engine configuration.

use std::time::Duration;

use narrator_core::{AudioFormat, PlaybackRate, Voice};

/// Interval between job status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Configuration for [`NarratorEngine`](crate::NarratorEngine).
///
/// # Example
///
/// ```
/// use narrator_core::{PlaybackRate, Voice};
/// use narrator_engine::EngineConfig;
///
/// let config = EngineConfig::new()
///     .with_voice(Voice::Nova)
///     .with_rate(PlaybackRate::Fast);
/// assert_eq!(config.voice, Voice::Nova);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Delay between a poll response and the next poll.
    pub poll_interval: Duration,
    /// Container requested from the synthesis service.
    pub response_format: AudioFormat,
    /// Voice used until the listener picks another one.
    pub voice: Voice,
    /// Rate used until the listener picks another one.
    pub rate: PlaybackRate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            response_format: AudioFormat::default(),
            voice: Voice::default(),
            rate: PlaybackRate::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_response_format(mut self, format: AudioFormat) -> Self {
        self.response_format = format;
        self
    }

    #[must_use]
    pub const fn with_voice(mut self, voice: Voice) -> Self {
        self.voice = voice;
        self
    }

    #[must_use]
    pub const fn with_rate(mut self, rate: PlaybackRate) -> Self {
        self.rate = rate;
        self
    }
}
