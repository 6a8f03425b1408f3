use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

// Environment variable names checked when no API key is configured.
const API_KEY_ENVS: &[&str] = &["SIMSCRIBE_API_KEY", "OPENAI_API_KEY"];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionMode {
    Cloud,
    Local,
}

/// Settings for the per-chunk transcription backend.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TranscriptionSettings {
    #[serde(default = "default_transcription_mode")]
    pub mode: TranscriptionMode,
    /// Base URL of the hosted OpenAI-compatible endpoint.
    #[serde(default = "default_transcription_base_url")]
    pub base_url: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// whisper.cpp CLI binary for local mode. Resolved from PATH when relative.
    #[serde(default = "default_whisper_binary")]
    pub whisper_binary: String,
    /// GGML model file for local mode.
    #[serde(default)]
    pub whisper_model_path: Option<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        TranscriptionSettings {
            mode: default_transcription_mode(),
            base_url: default_transcription_base_url(),
            model: default_transcription_model(),
            api_key: None,
            whisper_binary: default_whisper_binary(),
            whisper_model_path: None,
        }
    }
}

impl TranscriptionSettings {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref())
    }
}

/// Settings for the chat-completions backend used by the merge and scoring
/// steps.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatSettings {
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        ChatSettings {
            base_url: default_chat_base_url(),
            model: default_chat_model(),
            api_key: None,
        }
    }
}

impl ChatSettings {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref())
    }
}

/// All knobs of one pipeline run. Passed explicitly into each call; the
/// pipeline holds no process-wide state.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Settings {
    /// Chunk duration handed to the segmenter, in seconds.
    #[serde(default = "default_chunk_length_seconds")]
    pub chunk_length_seconds: u64,
    /// Minimum trimmed character count for a segment to be considered.
    #[serde(default = "default_min_segment_length")]
    pub min_segment_length: usize,
    /// Similarity ratio above which an arriving segment is rejected as a
    /// repeat of recent context.
    #[serde(default = "default_online_similarity_threshold")]
    pub online_similarity_threshold: f64,
    /// Similarity ratio above which the consolidation pass treats two lines
    /// as duplicates.
    #[serde(default = "default_consolidation_similarity_threshold")]
    pub consolidation_similarity_threshold: f64,
    /// How many recently accepted segments the online filter compares against.
    #[serde(default = "default_online_lookback")]
    pub online_lookback: usize,
    /// How many already-kept lines the consolidation pass compares against.
    #[serde(default = "default_consolidation_lookback")]
    pub consolidation_lookback: usize,
    /// Spoken-language hint forwarded to the transcription backend (ISO 639-1).
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub transcription: TranscriptionSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            chunk_length_seconds: default_chunk_length_seconds(),
            min_segment_length: default_min_segment_length(),
            online_similarity_threshold: default_online_similarity_threshold(),
            consolidation_similarity_threshold: default_consolidation_similarity_threshold(),
            online_lookback: default_online_lookback(),
            consolidation_lookback: default_consolidation_lookback(),
            language: default_language(),
            transcription: TranscriptionSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Settings> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }
}

/// Resolve an API key: configured value first, then the well-known
/// environment variables.
pub fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    if let Some(key) = configured {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    for name in API_KEY_ENVS {
        if let Ok(value) = env::var(name) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                debug!("Using API key from environment variable {}", name);
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn default_transcription_mode() -> TranscriptionMode {
    TranscriptionMode::Cloud
}

fn default_transcription_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_transcription_model() -> String {
    "gpt-4o-transcribe".to_string()
}

fn default_whisper_binary() -> String {
    "whisper-cli".to_string()
}

fn default_chat_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_chunk_length_seconds() -> u64 {
    300
}

fn default_min_segment_length() -> usize {
    3
}

fn default_online_similarity_threshold() -> f64 {
    0.8
}

fn default_consolidation_similarity_threshold() -> f64 {
    0.85
}

fn default_online_lookback() -> usize {
    5
}

fn default_consolidation_lookback() -> usize {
    3
}

fn default_language() -> String {
    "he".to_string()
}
