//! Local whisper.cpp CLI backend.

use super::TranscriptionBackend;
use crate::audio_toolkit::AudioChunk;
use crate::error::TranscriptionError;
use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use std::process::Command;

pub struct WhisperCliBackend {
    binary: String,
    model_path: PathBuf,
    language: String,
}

impl WhisperCliBackend {
    pub fn new(binary: &str, model_path: impl Into<PathBuf>, language: &str) -> Self {
        WhisperCliBackend {
            binary: binary.to_string(),
            model_path: model_path.into(),
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl TranscriptionBackend for WhisperCliBackend {
    fn name(&self) -> &str {
        "whisper-cli"
    }

    async fn transcribe(&self, chunk: &AudioChunk) -> Result<String, TranscriptionError> {
        let offset = chunk.start_offset_seconds;
        if !self.model_path.exists() {
            return Err(TranscriptionError::Backend {
                offset,
                message: format!("model not found: {}", self.model_path.display()),
            });
        }

        // -otxt -of writes the text next to the chunk: stdout capture from
        // whisper builds is unreliable.
        let of_base = chunk.path.with_extension("");
        debug!(
            "Running {} on chunk at {}s (model: {:?})",
            self.binary, offset, self.model_path
        );
        let output = Command::new(&self.binary)
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(&chunk.path)
            .arg("-l")
            .arg(&self.language)
            .args(["-np", "-nt", "-otxt"])
            .arg("-of")
            .arg(&of_base)
            .output()
            .map_err(|e| TranscriptionError::Backend {
                offset,
                message: format!("failed to run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptionError::Backend {
                offset,
                message: format!(
                    "whisper exited with {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            });
        }

        let txt_path = chunk.path.with_extension("txt");
        let raw = std::fs::read_to_string(&txt_path)
            .map_err(|source| TranscriptionError::Io { offset, source })?;
        let _ = std::fs::remove_file(&txt_path);

        Ok(strip_timing_brackets(&raw))
    }
}

/// Depending on the build, whisper's -otxt output may still carry
/// "[00:00:00 --> 00:00:05]" timing brackets; keep only the spoken text.
/// Line structure is preserved so each segment stays a sentence break.
fn strip_timing_brackets(raw: &str) -> String {
    raw.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.starts_with('[') && trimmed.contains("-->") {
                trimmed
                    .find(']')
                    .map(|i| trimmed[i + 1..].trim().to_string())
                    .filter(|text| !text.is_empty())
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_timing_brackets() {
        let raw = "[00:00:00 --> 00:00:04]  Hello there.\n\n[00:00:04 --> 00:00:09]  How are you?\n";
        assert_eq!(strip_timing_brackets(raw), "Hello there.\nHow are you?");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let raw = "  Hello there.\nHow are you?  ";
        assert_eq!(strip_timing_brackets(raw), "Hello there.\nHow are you?");
    }

    #[test]
    fn test_bracketed_line_without_text_is_dropped() {
        let raw = "[00:00:00 --> 00:00:04]\nreal text";
        assert_eq!(strip_timing_brackets(raw), "real text");
    }
}
