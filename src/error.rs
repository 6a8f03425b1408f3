use std::path::PathBuf;
use thiserror::Error;

/// Audio could not be demuxed or prepared. Fatal for the input file.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to launch ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with status {status} while extracting {input:?}:\n{stderr}")]
    Ffmpeg {
        input: PathBuf,
        status: i32,
        stderr: String,
    },

    #[error("unusable audio stream {path:?}: {message}")]
    InvalidAudio { path: PathBuf, message: String },

    #[error("audio workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}

/// A single chunk failed to transcribe. Recoverable: the orchestrator skips
/// the chunk and continues with the rest of the file.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("failed to read chunk at {offset}s: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed for chunk at {offset}s: {source}")]
    Http {
        offset: u64,
        #[source]
        source: reqwest::Error,
    },

    #[error("transcription API error {status} for chunk at {offset}s: {body}")]
    Api {
        offset: u64,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("transcription backend failed for chunk at {offset}s: {message}")]
    Backend { offset: u64, message: String },
}

/// Shared failure modes of the chat-completions calls behind the merge and
/// scoring steps.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("API response has no choices")]
    NoChoices,
}

/// The multi-source merge failed. Fatal for the session: there is no
/// reconciled transcript without it.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("merge request failed: {0}")]
    Chat(#[from] ChatError),

    #[error("merge response was empty")]
    EmptyResponse,

    #[error("merge response contained no parseable transcript lines:\n{raw}")]
    MalformedResponse { raw: String },
}

/// The empathy scoring step failed. Does not invalidate a reconciled
/// transcript that was already produced.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring request failed: {0}")]
    Chat(#[from] ChatError),

    #[error("scoring response was empty")]
    EmptyResponse,

    #[error("could not parse verdict line: {raw}")]
    MalformedVerdict { raw: String },
}
