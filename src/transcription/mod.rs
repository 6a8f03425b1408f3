//! Pluggable transcription backends.

mod cloud;
mod whisper_cli;

pub use cloud::CloudBackend;
pub use whisper_cli::WhisperCliBackend;

use crate::audio_toolkit::AudioChunk;
use crate::error::TranscriptionError;
use crate::settings::{TranscriptionMode, TranscriptionSettings};
use anyhow::anyhow;
use async_trait::async_trait;

/// One capability: turn an audio chunk into raw text. Embedded newlines are
/// treated as sentence breaks by the caller.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    async fn transcribe(&self, chunk: &AudioChunk) -> Result<String, TranscriptionError>;
}

/// Build the backend selected by the settings. Fails early on missing
/// credentials or model paths so a batch does not get halfway before the
/// first chunk errors.
pub fn backend_from_settings(
    settings: &TranscriptionSettings,
    language: &str,
) -> anyhow::Result<Box<dyn TranscriptionBackend>> {
    match settings.mode {
        TranscriptionMode::Cloud => {
            let api_key = settings
                .resolved_api_key()
                .ok_or_else(|| anyhow!("cloud transcription requires an API key"))?;
            Ok(Box::new(CloudBackend::new(
                &settings.base_url,
                &settings.model,
                &api_key,
                language,
            )))
        }
        TranscriptionMode::Local => {
            let model_path = settings.whisper_model_path.as_deref().ok_or_else(|| {
                anyhow!("local transcription requires whisper_model_path in the settings")
            })?;
            Ok(Box::new(WhisperCliBackend::new(
                &settings.whisper_binary,
                model_path,
                language,
            )))
        }
    }
}
