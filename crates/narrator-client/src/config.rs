//! Builder for [`SynthesisClientConfig`].
//!
//! Validation (URL parsing, trailing slash) happens later, when the client
//! turns this into its internal settings.

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/tts/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the synthesis service lives and how to talk to it.
///
/// Each client call is a single HTTP request. There is no retry setting:
/// a failed start or poll is reported to the engine as is.
///
/// ```
/// use narrator_client::SynthesisClientConfig;
/// use std::time::Duration;
///
/// let config = SynthesisClientConfig::new()
///     .with_base_url("https://tts.example.edu/api/")
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct SynthesisClientConfig {
    /// `start-stream` and `job/{id}` are joined onto this
    pub(crate) base_url: String,
    pub(crate) user_agent: String,
    /// Applies to each request as a whole
    pub(crate) timeout: Duration,
    /// Sent as `Authorization: Bearer ...` when present
    pub(crate) token: Option<String>,
}

impl Default for SynthesisClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("narrator-client/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: DEFAULT_TIMEOUT,
            token: None,
        }
    }
}

impl SynthesisClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at another service root.
    ///
    /// A missing trailing slash is tolerated.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Per-request timeout, 30 seconds unless set.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.with_optional_token(Some(token.into()))
    }

    /// Replace the bearer token; `None` sends requests unauthenticated.
    #[must_use]
    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_local_service() {
        let config = SynthesisClientConfig::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.user_agent.starts_with("narrator-client/"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_builders_override_each_field() {
        let config = SynthesisClientConfig::new()
            .with_base_url("https://tts.example.edu/api")
            .with_user_agent("test-agent")
            .with_timeout(Duration::from_secs(5))
            .with_token("secret");

        assert_eq!(config.base_url, "https://tts.example.edu/api");
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_optional_token_can_clear() {
        let config = SynthesisClientConfig::new()
            .with_token("t")
            .with_optional_token(None);
        assert!(config.token.is_none());
    }
}
