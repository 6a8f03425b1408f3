mod chunk;
mod extract;
mod wav;

pub use chunk::{split_audio, AudioChunk};
pub use extract::extract_audio;
pub use wav::{load_wav_file, write_wav_file};

/// Sample rate the extractor normalizes every recording to.
pub const PIPELINE_SAMPLE_RATE: u32 = 16_000;
