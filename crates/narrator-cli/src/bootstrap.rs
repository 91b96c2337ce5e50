//! Composition root: wires the HTTP client and audio output into an engine.

use std::sync::Arc;

use anyhow::Context;
use narrator_audio::{AudioConfig, RodioMediaBackend};
use narrator_client::{DefaultSynthesisClient, SynthesisClientConfig};
use narrator_core::{MediaBackend, SynthesisClientPort};
use narrator_engine::{EngineConfig, NarratorEngine};

/// Settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub server_url: String,
    pub token: Option<String>,
}

/// Shared adapters for command handlers.
pub struct CliContext {
    client: Arc<dyn SynthesisClientPort>,
    media: Arc<dyn MediaBackend>,
}

impl CliContext {
    /// An engine builder over this context's adapters.
    pub fn engine(&self, config: EngineConfig) -> NarratorEngine {
        NarratorEngine::new(config, Arc::clone(&self.client), Arc::clone(&self.media))
    }
}

/// Build the synthesis client and open the audio device.
pub fn bootstrap(config: &CliConfig) -> anyhow::Result<CliContext> {
    let client_config = SynthesisClientConfig::new()
        .with_base_url(&config.server_url)
        .with_optional_token(config.token.clone());
    let client = DefaultSynthesisClient::new(&client_config)
        .with_context(|| format!("invalid synthesis service URL '{}'", config.server_url))?;

    let media = RodioMediaBackend::new(AudioConfig::default())
        .context("could not open the audio output device")?;

    tracing::debug!(server_url = %config.server_url, "CLI context ready");
    Ok(CliContext {
        client: Arc::new(client),
        media: Arc::new(media),
    })
}
