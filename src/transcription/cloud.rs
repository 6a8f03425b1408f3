//! Hosted OpenAI-compatible transcription backend.

use super::TranscriptionBackend;
use crate::audio_toolkit::AudioChunk;
use crate::error::TranscriptionError;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct CloudBackend {
    base_url: String,
    model: String,
    api_key: String,
    language: String,
}

impl CloudBackend {
    pub fn new(base_url: &str, model: &str, api_key: &str, language: &str) -> Self {
        CloudBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            language: language.to_string(),
        }
    }

    fn build_headers(&self, offset: u64) -> Result<HeaderMap, TranscriptionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|e| {
                TranscriptionError::Backend {
                    offset,
                    message: format!("invalid authorization header value: {}", e),
                }
            })?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl TranscriptionBackend for CloudBackend {
    fn name(&self) -> &str {
        "cloud"
    }

    async fn transcribe(&self, chunk: &AudioChunk) -> Result<String, TranscriptionError> {
        let offset = chunk.start_offset_seconds;
        let wav_data = std::fs::read(&chunk.path)
            .map_err(|source| TranscriptionError::Io { offset, source })?;

        let url = format!("{}/audio/transcriptions", self.base_url);
        debug!(
            "Sending chunk at {}s ({} bytes) to {} (model: {})",
            offset,
            wav_data.len(),
            url,
            self.model
        );

        let headers = self.build_headers(offset)?;
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| TranscriptionError::Http { offset, source })?;

        let audio_part = Part::bytes(wav_data)
            .file_name("chunk.wav")
            .mime_str("audio/wav")
            .map_err(|source| TranscriptionError::Http { offset, source })?;

        let mut form = Form::new()
            .part("file", audio_part)
            .text("model", self.model.clone())
            .text("response_format", "text")
            .text("temperature", "0");
        if !self.language.is_empty() && self.language != "auto" {
            form = form.text("language", self.language.clone());
        }

        let response = client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| TranscriptionError::Http { offset, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error response".to_string());
            return Err(TranscriptionError::Api {
                offset,
                status,
                body,
            });
        }

        let transcription = response
            .text()
            .await
            .map_err(|source| TranscriptionError::Http { offset, source })?;

        debug!(
            "Chunk at {}s transcribed: {} chars",
            offset,
            transcription.len()
        );
        Ok(transcription.trim().to_string())
    }
}
