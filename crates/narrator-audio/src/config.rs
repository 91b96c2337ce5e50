//! Configuration for the rodio backend.

use std::time::Duration;

/// Settings for chunk downloads and playback.
///
/// # Example
///
/// ```
/// use narrator_audio::AudioConfig;
/// use std::time::Duration;
///
/// let config = AudioConfig::new().with_fetch_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Timeout for downloading one audio resource
    pub(crate) fetch_timeout: Duration,
    /// User agent string for downloads
    pub(crate) user_agent: String,
    /// Output volume, 0.0 to 1.0
    pub(crate) volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            user_agent: concat!("narrator-audio/", env!("CARGO_PKG_VERSION")).to_string(),
            volume: 1.0,
        }
    }
}

impl AudioConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the download timeout for a single resource.
    ///
    /// Defaults to 30 seconds. A timed-out download is reported as a media
    /// error for that resource.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the output volume. Values outside `0.0..=1.0` are clamped.
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub const fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub const fn volume(&self) -> f32 {
        self.volume
    }
}
