//! Mono WAV file I/O.

use std::path::Path;

use crate::{Error, Result};

/// Read a mono WAV file, return (samples, sample_rate).
///
/// Samples are f64 in [-1, 1]; integer PCM is scaled by its bit depth,
/// float PCM passes through. A multi-channel file is an audio error — the
/// corpus contract is mono speech, and silently downmixing would change
/// what a sample count means.
pub fn read_wav(path: impl AsRef<Path>) -> Result<(Vec<f64>, u32)> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(Error::Audio(format!(
            "{}: expected mono, got {} channels",
            path.display(),
            spec.channels
        )));
    }

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1u32 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec.sample_rate))
}

/// Write mono f64 samples as a 32-bit float WAV file.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f64], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s as f32)?;
    }
    writer.finalize()?;
    Ok(())
}
