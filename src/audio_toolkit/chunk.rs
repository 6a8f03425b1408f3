use crate::audio_toolkit::wav::mono_spec;
use crate::error::ExtractionError;
use hound::{SampleFormat, WavReader, WavWriter};
use log::debug;
use std::path::{Path, PathBuf};

/// A fixed-duration slice of the normalized audio, materialized as its own
/// file. Owned exclusively by the pipeline run that created it; deleted once
/// its transcription is obtained.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub path: PathBuf,
    /// Whole seconds from the start of the source recording.
    pub start_offset_seconds: u64,
    pub duration_seconds: f64,
}

/// Split a mono 16-bit WAV into consecutive chunks of `chunk_length_seconds`,
/// written into `out_dir`. The final chunk may be shorter; zero-length audio
/// yields no chunks.
pub fn split_audio(
    audio: &Path,
    out_dir: &Path,
    chunk_length_seconds: u64,
) -> Result<Vec<AudioChunk>, ExtractionError> {
    if chunk_length_seconds == 0 {
        return Err(ExtractionError::InvalidAudio {
            path: audio.to_path_buf(),
            message: "chunk length must be positive".to_string(),
        });
    }

    let mut reader = WavReader::open(audio).map_err(|e| ExtractionError::InvalidAudio {
        path: audio.to_path_buf(),
        message: e.to_string(),
    })?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int
    {
        return Err(ExtractionError::InvalidAudio {
            path: audio.to_path_buf(),
            message: format!(
                "expected mono 16-bit PCM, got {}ch {}bit {:?}",
                spec.channels, spec.bits_per_sample, spec.sample_format
            ),
        });
    }

    let samples_per_chunk = (chunk_length_seconds * spec.sample_rate as u64) as usize;
    let mut samples = reader.samples::<i16>();
    let mut chunks = Vec::new();
    let mut index: u64 = 0;

    loop {
        let mut buffer: Vec<i16> = Vec::with_capacity(samples_per_chunk);
        for sample in samples.by_ref().take(samples_per_chunk) {
            buffer.push(sample.map_err(|e| ExtractionError::InvalidAudio {
                path: audio.to_path_buf(),
                message: e.to_string(),
            })?);
        }
        if buffer.is_empty() {
            break;
        }

        let path = out_dir.join(format!("chunk_{:04}.wav", index));
        write_chunk(&path, &buffer, spec.sample_rate)?;
        chunks.push(AudioChunk {
            path,
            start_offset_seconds: index * chunk_length_seconds,
            duration_seconds: buffer.len() as f64 / spec.sample_rate as f64,
        });

        let partial = buffer.len() < samples_per_chunk;
        index += 1;
        if partial {
            break;
        }
    }

    debug!(
        "Split {:?} into {} chunk(s) of up to {}s",
        audio,
        chunks.len(),
        chunk_length_seconds
    );
    Ok(chunks)
}

fn write_chunk(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), ExtractionError> {
    let to_invalid = |message: String| ExtractionError::InvalidAudio {
        path: path.to_path_buf(),
        message,
    };
    let mut writer =
        WavWriter::create(path, mono_spec(sample_rate)).map_err(|e| to_invalid(e.to_string()))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| to_invalid(e.to_string()))?;
    }
    writer.finalize().map_err(|e| to_invalid(e.to_string()))?;
    Ok(())
}
