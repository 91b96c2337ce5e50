//! Audio backend error types.

use thiserror::Error;

/// Errors that can occur while fetching or playing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to open the audio output device.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The audio thread exited or never started.
    #[error("Audio thread is not running")]
    AudioThreadDied,

    /// Downloading the resource failed.
    #[error("Failed to download audio: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("Audio download failed with status {status}: {url}")]
    FetchStatus {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The bytes are not a supported audio format.
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// No tokio runtime to run the download on.
    #[error("No async runtime available to fetch audio")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = AudioError::FetchStatus {
            status: 404,
            url: "https://cdn/0.mp3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Audio download failed with status 404: https://cdn/0.mp3"
        );

        let err = AudioError::Decode("unrecognized format".to_string());
        assert!(err.to_string().contains("unrecognized format"));
    }
}
