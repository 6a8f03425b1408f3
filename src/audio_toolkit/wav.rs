use anyhow::Result;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;
use std::path::Path;

pub(crate) fn mono_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Save mono 16-bit samples as a WAV file.
pub fn write_wav_file<P: AsRef<Path>>(path: P, samples: &[i16], sample_rate: u32) -> Result<()> {
    let mut writer = WavWriter::create(path.as_ref(), mono_spec(sample_rate))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    debug!("Saved WAV file: {:?}", path.as_ref());
    Ok(())
}

/// Load mono 16-bit samples from a WAV file.
pub fn load_wav_file<P: AsRef<Path>>(path: P) -> Result<Vec<i16>> {
    let mut reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        return Err(anyhow::anyhow!(
            "expected mono 16-bit PCM, got {}ch {}bit {:?}",
            spec.channels,
            spec.bits_per_sample,
            spec.sample_format
        ));
    }
    let samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
    Ok(samples?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<i16> = (0..640).map(|i| (i % 128) as i16).collect();
        write_wav_file(&path, &samples, 16_000).unwrap();
        assert_eq!(load_wav_file(&path).unwrap(), samples);
    }
}
