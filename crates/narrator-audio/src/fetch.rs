//! Downloading and decoding audio resources.

use std::io::Cursor;

use rodio::Decoder;

use crate::config::AudioConfig;
use crate::error::AudioError;

/// Decoded audio ready to be queued on a sink.
pub(crate) type AudioSource = Decoder<Cursor<Vec<u8>>>;

/// HTTP downloader for chunk audio.
#[derive(Debug, Clone)]
pub(crate) struct AudioFetcher {
    http: reqwest::Client,
}

impl AudioFetcher {
    pub(crate) fn new(config: &AudioConfig) -> Result<Self, AudioError> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { http })
    }

    /// Download the full body of `url`.
    pub(crate) async fn fetch(&self, url: &str) -> Result<Vec<u8>, AudioError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AudioError::FetchStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        tracing::trace!(%url, bytes = bytes.len(), "Audio downloaded");
        Ok(bytes.to_vec())
    }
}

/// Open a decoder over `bytes`, sniffing the container format.
pub(crate) fn decode(bytes: Vec<u8>) -> Result<AudioSource, AudioError> {
    if bytes.is_empty() {
        return Err(AudioError::Decode("empty response body".to_string()));
    }
    Decoder::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    /// A short 16-bit mono PCM WAV file of silence.
    pub fn wav_bytes(sample_rate: u32, samples: u32) -> Vec<u8> {
        let data_len = samples * 2;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(44 + data_len as usize, 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::testing::wav_bytes;
    use super::*;
    use rodio::Source;

    #[test]
    fn decodes_wav() {
        let source = decode(wav_bytes(8000, 800)).unwrap();
        assert_eq!(source.sample_rate(), 8000);
        assert_eq!(source.channels(), 1);
    }

    #[test]
    fn rejects_garbage_and_empty_bodies() {
        let err = decode(b"<html>not audio</html>".to_vec()).err().unwrap();
        assert!(matches!(err, AudioError::Decode(_)));

        let err = decode(Vec::new()).err().unwrap();
        assert_eq!(err.to_string(), "Failed to decode audio: empty response body");
    }

    #[tokio::test]
    async fn invalid_url_fails_without_network() {
        let fetcher = AudioFetcher::new(&AudioConfig::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, AudioError::Fetch(_)));
    }
}
