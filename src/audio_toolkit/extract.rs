use crate::audio_toolkit::PIPELINE_SAMPLE_RATE;
use crate::error::ExtractionError;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Demux a video/audio recording into a mono 16 kHz WAV suitable for
/// chunked transcription. The output lands in `out_dir` and is owned by the
/// caller's run workspace.
pub fn extract_audio(input: &Path, out_dir: &Path) -> Result<PathBuf, ExtractionError> {
    let output = out_dir.join("extracted.wav");
    debug!("Extracting audio: {:?} -> {:?}", input, output);

    let result = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(input)
        .args(["-vn", "-ac", "1", "-ar"])
        .arg(PIPELINE_SAMPLE_RATE.to_string())
        .arg(&output)
        .output()
        .map_err(ExtractionError::Spawn)?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        return Err(ExtractionError::Ffmpeg {
            input: input.to_path_buf(),
            status: result.status.code().unwrap_or(-1),
            stderr,
        });
    }

    debug!("Extraction finished: {:?}", output);
    Ok(output)
}
