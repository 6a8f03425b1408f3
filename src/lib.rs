pub mod audio_toolkit;
pub mod cli;
pub mod empathy;
pub mod error;
pub mod llm_client;
pub mod pipeline;
pub mod reconcile;
pub mod settings;
pub mod transcript;
pub mod transcription;

pub use empathy::{score_empathy, EmpathyVerdict};
pub use error::{ChatError, ExtractionError, MergeError, ScoringError, TranscriptionError};
pub use pipeline::{run_pipeline_for_audio, run_pipeline_for_file};
pub use reconcile::reconcile;
pub use settings::{Settings, TranscriptionMode};
pub use transcript::{ReconciledLine, Role, SourceTranscript, TranscriptLine};
pub use transcription::{backend_from_settings, TranscriptionBackend};
