//! Single-source pipeline: extract, chunk, transcribe, filter, consolidate.

use crate::audio_toolkit::{extract_audio, split_audio};
use crate::error::ExtractionError;
use crate::settings::Settings;
use crate::transcript::consolidate::consolidate_lines;
use crate::transcript::filter::SegmentFilter;
use crate::transcript::{SourceTranscript, TranscriptLine};
use crate::transcription::TranscriptionBackend;
use log::{debug, info, warn};
use std::path::Path;

/// Characters that end a sentence when flattening a backend's block output.
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];

/// Process one recording into an ordered, deduplicated transcript.
///
/// Every intermediate audio artifact (extracted stream, chunk files) lives
/// in a run-scoped temp directory that is removed on all exit paths. A
/// chunk-level transcription failure is logged and skipped; an extraction
/// failure is fatal for the file.
pub async fn run_pipeline_for_file(
    input: &Path,
    backend: &dyn TranscriptionBackend,
    settings: &Settings,
) -> Result<SourceTranscript, ExtractionError> {
    info!("Processing {:?} with {} backend", input, backend.name());
    let workdir = tempfile::tempdir().map_err(ExtractionError::Workspace)?;
    let audio = extract_audio(input, workdir.path())?;
    run_pipeline_for_audio(&audio, workdir.path(), backend, settings).await
}

/// Same as [`run_pipeline_for_file`] for callers that already hold a
/// normalized mono WAV. Chunk files are written into `chunk_dir` and removed
/// as soon as their transcription resolves; the audio file itself stays
/// owned by the caller.
pub async fn run_pipeline_for_audio(
    audio: &Path,
    chunk_dir: &Path,
    backend: &dyn TranscriptionBackend,
    settings: &Settings,
) -> Result<SourceTranscript, ExtractionError> {
    let chunks = split_audio(audio, chunk_dir, settings.chunk_length_seconds)?;
    info!(
        "Transcribing {} chunk(s) of up to {}s",
        chunks.len(),
        settings.chunk_length_seconds
    );

    let mut filter = SegmentFilter::new(
        settings.min_segment_length,
        settings.online_similarity_threshold,
        settings.online_lookback,
    );
    let mut lines: Vec<TranscriptLine> = Vec::new();

    for chunk in &chunks {
        match backend.transcribe(chunk).await {
            Ok(raw) => {
                let mut accepted = 0usize;
                for sentence in split_sentences(&raw) {
                    if filter.accept(&sentence) {
                        lines.push(TranscriptLine {
                            timestamp_seconds: chunk.start_offset_seconds,
                            text: sentence,
                        });
                        accepted += 1;
                    }
                }
                debug!(
                    "Chunk at {}s: {} line(s) accepted",
                    chunk.start_offset_seconds, accepted
                );
            }
            Err(e) => {
                warn!("Skipping chunk at {}s: {}", chunk.start_offset_seconds, e);
            }
        }
        if let Err(e) = std::fs::remove_file(&chunk.path) {
            debug!("Could not remove chunk file {:?}: {}", chunk.path, e);
        }
    }

    let consolidated = consolidate_lines(
        &lines,
        settings.consolidation_similarity_threshold,
        settings.consolidation_lookback,
    );
    info!(
        "Transcript has {} line(s) after consolidation ({} before)",
        consolidated.len(),
        lines.len()
    );
    Ok(SourceTranscript {
        lines: consolidated,
    })
}

/// Split a backend's raw output into sentence-sized lines: newlines are
/// sentence breaks, and whitespace following terminal punctuation starts a
/// new sentence within a line.
fn split_sentences(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in raw.lines() {
        let mut current = String::new();
        let mut previous_was_terminal = false;
        for ch in line.chars() {
            if ch.is_whitespace() && previous_was_terminal {
                push_trimmed(&mut out, &current);
                current.clear();
                previous_was_terminal = false;
                continue;
            }
            if !ch.is_whitespace() {
                previous_was_terminal = SENTENCE_TERMINATORS.contains(&ch);
            }
            current.push(ch);
        }
        push_trimmed(&mut out, &current);
    }
    out
}

fn push_trimmed(out: &mut Vec<String>, sentence: &str) {
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_toolkit::{write_wav_file, AudioChunk};
    use crate::error::TranscriptionError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct ScriptedBackend {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(responses: &[&str]) -> Self {
            ScriptedBackend {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl TranscriptionBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn transcribe(&self, _chunk: &AudioChunk) -> Result<String, TranscriptionError> {
            Ok(self.responses.lock().unwrap().pop().unwrap_or_default())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl TranscriptionBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn transcribe(&self, chunk: &AudioChunk) -> Result<String, TranscriptionError> {
            Err(TranscriptionError::Backend {
                offset: chunk.start_offset_seconds,
                message: "simulated backend outage".to_string(),
            })
        }
    }

    fn test_settings(chunk_length_seconds: u64) -> Settings {
        Settings {
            chunk_length_seconds,
            ..Settings::default()
        }
    }

    fn make_wav(dir: &Path, seconds: f64) -> PathBuf {
        let path = dir.join("audio.wav");
        let count = (seconds * 16_000.0) as usize;
        let samples: Vec<i16> = (0..count).map(|i| (i % 64) as i16).collect();
        write_wav_file(&path, &samples, 16_000).unwrap();
        path
    }

    fn wav_files_in(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "wav"))
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn test_lines_carry_chunk_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let audio = make_wav(dir.path(), 2.0);
        let backend = ScriptedBackend::new(&[
            "Good morning. I am your nurse today.",
            "Does anything hurt right now?",
        ]);
        let transcript =
            run_pipeline_for_audio(&audio, dir.path(), &backend, &test_settings(1))
                .await
                .unwrap();

        let rendered: Vec<String> = transcript.lines.iter().map(|l| l.render()).collect();
        assert_eq!(
            rendered,
            vec![
                "[00:00:00] Good morning.",
                "[00:00:00] I am your nurse today.",
                "[00:00:01] Does anything hurt right now?",
            ]
        );
    }

    #[tokio::test]
    async fn test_chunk_failures_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let audio = make_wav(dir.path(), 3.0);
        let transcript = run_pipeline_for_audio(&audio, dir.path(), &FailingBackend, &test_settings(1))
            .await
            .unwrap();
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn test_chunk_files_removed_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let audio = make_wav(dir.path(), 2.0);
        let backend = ScriptedBackend::new(&["hello there", "more dialogue here"]);
        run_pipeline_for_audio(&audio, dir.path(), &backend, &test_settings(1))
            .await
            .unwrap();
        // Only the source audio survives the run.
        assert_eq!(wav_files_in(dir.path()), vec![audio]);
    }

    #[tokio::test]
    async fn test_chunk_files_removed_after_backend_failure() {
        let dir = tempfile::tempdir().unwrap();
        let audio = make_wav(dir.path(), 2.0);
        run_pipeline_for_audio(&audio, dir.path(), &FailingBackend, &test_settings(1))
            .await
            .unwrap();
        assert_eq!(wav_files_in(dir.path()), vec![audio]);
    }

    #[tokio::test]
    async fn test_missing_input_reports_extraction_error() {
        let result = run_pipeline_for_file(
            Path::new("/nonexistent/recording.mp4"),
            &FailingBackend,
            &test_settings(300),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_boundary_repetition_is_consolidated() {
        let dir = tempfile::tempdir().unwrap();
        let audio = make_wav(dir.path(), 2.0);
        // The second chunk re-emits the tail of the first, a typical
        // chunk-boundary artifact.
        let backend = ScriptedBackend::new(&[
            "I will listen to your lungs now.",
            "I will listen to your lungs now. Please breathe deeply.",
        ]);
        let transcript =
            run_pipeline_for_audio(&audio, dir.path(), &backend, &test_settings(1))
                .await
                .unwrap();
        let texts: Vec<&str> = transcript.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["I will listen to your lungs now.", "Please breathe deeply."]
        );
    }

    #[test]
    fn test_split_sentences_on_newlines_and_punctuation() {
        let raw = "Hello there. How are you?\nI am fine";
        assert_eq!(
            split_sentences(raw),
            vec!["Hello there.", "How are you?", "I am fine"]
        );
    }

    #[test]
    fn test_split_sentences_keeps_ellipsis_together() {
        assert_eq!(split_sentences("..."), vec!["..."]);
    }

    #[test]
    fn test_split_sentences_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("\n\n").is_empty());
    }
}
