use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "simscribe",
    about = "Transcribe nursing simulation recordings and assess empathetic language"
)]
pub struct CliArgs {
    /// Recordings of one simulation session (video or audio), in upload order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Settings file (JSON); omitted fields take their defaults
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Transcription mode override: "cloud" or "local"
    #[arg(long)]
    pub mode: Option<String>,

    /// API key for the hosted transcription and chat backends
    #[arg(long)]
    pub api_key: Option<String>,

    /// Chunk length override, in seconds
    #[arg(long)]
    pub chunk_length: Option<u64>,

    /// Spoken-language hint override (ISO 639-1)
    #[arg(long)]
    pub language: Option<String>,

    /// Where to write the merged transcript
    #[arg(long, default_value = "transcript.txt")]
    pub output: PathBuf,

    /// Also score the nurse's empathetic language after the merge
    #[arg(long)]
    pub score: bool,

    /// Enable debug mode with verbose logging
    #[arg(long)]
    pub debug: bool,
}
