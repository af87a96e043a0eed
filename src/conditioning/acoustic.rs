//! Acoustic parameter stream loading.
//!
//! Three co-indexed binary files per utterance, each a raw little-endian
//! `f32` stream in the external vocoder's native format (opaque beyond
//! shape): cepstral coefficients `(-1, 40)`, spectral envelope `(-1,)` and
//! log fundamental frequency `(-1,)`.
//!
//! Unvoiced regions carry a sentinel value in the scalar streams and are
//! filled by linear interpolation across the nearest voiced neighbors; the
//! log-F0 interpolation also yields the binary voicing flag. The envelope
//! is log-compressed after interpolation. Channel layout of the result:
//! 40 cepstral + log-envelope + log-F0 + voicing = 43, normalized with the
//! speaker's acoustic statistics.

use std::path::Path;

use crate::corpus::{Stats, UtterancePaths};
use crate::{Error, Result};

/// Cepstral coefficients per frame in the `.cc` stream.
pub const CEPSTRUM_WIDTH: usize = 40;

/// Channels of the loaded stream: cepstrum + envelope + log-F0 + voicing.
pub const CHANNELS: usize = CEPSTRUM_WIDTH + 3;

/// Sentinel marking unvoiced frames in the envelope stream.
///
/// Both sentinels are exactly representable in f32, so equality against
/// the widened f64 value is reliable.
pub const ENVELOPE_UNVOICED: f64 = 1e3;

/// Sentinel marking unvoiced frames in the log-F0 stream.
pub const LF0_UNVOICED: f64 = -1e10;

/// Read a raw little-endian `f32` stream as rows of `width` values.
pub fn read_param_file(path: impl AsRef<Path>, width: usize) -> Result<Vec<Vec<f64>>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    if bytes.len() % (4 * width) != 0 {
        return Err(Error::Parse(format!(
            "{}: {} bytes is not a whole number of {width}-value frames",
            path.display(),
            bytes.len()
        )));
    }

    let values: Vec<f64> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
        .collect();
    Ok(values.chunks_exact(width).map(|row| row.to_vec()).collect())
}

/// Read a single-channel parameter stream.
pub fn read_param_channel(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    Ok(read_param_file(path, 1)?.into_iter().flatten().collect())
}

/// Fill sentinel-marked gaps by linear interpolation between the nearest
/// voiced neighbors; leading and trailing gaps hold the nearest voiced
/// value. Returns the voicing flags (1 = originally voiced).
///
/// An all-unvoiced stream is left unchanged with all-zero flags — there is
/// no voiced neighbor to interpolate from.
pub fn interpolate_unvoiced(values: &mut [f64], sentinel: f64) -> Vec<f64> {
    let flags: Vec<f64> = values
        .iter()
        .map(|&v| if v == sentinel { 0.0 } else { 1.0 })
        .collect();
    let voiced: Vec<usize> = flags
        .iter()
        .enumerate()
        .filter(|(_, &f)| f == 1.0)
        .map(|(i, _)| i)
        .collect();

    let (Some(&first), Some(&last)) = (voiced.first(), voiced.last()) else {
        return flags;
    };

    for i in 0..first {
        values[i] = values[first];
    }
    for pair in voiced.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b > a + 1 {
            let gap = (b - a) as f64;
            for i in a + 1..b {
                values[i] = values[a] + (values[b] - values[a]) * ((i - a) as f64 / gap);
            }
        }
    }
    let hold = values[last];
    for value in &mut values[last + 1..] {
        *value = hold;
    }

    flags
}

/// Load one utterance's acoustic conditioning stream.
pub fn load_stream(paths: &UtterancePaths, stats: &Stats) -> Result<Vec<Vec<f64>>> {
    let cepstrum = read_param_file(&paths.cepstrum, CEPSTRUM_WIDTH)?;
    let mut envelope = read_param_channel(&paths.envelope)?;
    let mut lf0 = read_param_channel(&paths.lf0)?;

    if cepstrum.len() != envelope.len() || envelope.len() != lf0.len() {
        return Err(Error::Parse(format!(
            "acoustic streams disagree on frame count: cc {} / fv {} / lf0 {}",
            cepstrum.len(),
            envelope.len(),
            lf0.len()
        )));
    }

    interpolate_unvoiced(&mut envelope, ENVELOPE_UNVOICED);
    let voicing = interpolate_unvoiced(&mut lf0, LF0_UNVOICED);

    let mut rows = Vec::with_capacity(cepstrum.len());
    for (i, mut row) in cepstrum.into_iter().enumerate() {
        row.push(envelope[i].ln());
        row.push(lf0[i]);
        row.push(voicing[i]);
        stats.normalize(&mut row)?;
        rows.push(row);
    }
    Ok(rows)
}
