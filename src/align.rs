//! Fixed-grid alignment of variable-length streams.
//!
//! Given the sample grid geometry (`frame_size` samples per frame,
//! `sequence_length` frames per forward step) and an utterance's raw
//! sample count, computes the exact sample and frame counts a training or
//! inference example must occupy, then conforms every stream to that grid
//! by zero-padding or truncation.
//!
//! Two coverage policies exist:
//!
//! - [`CoverageMode::Truncate`] (training): drop the remainder past the
//!   last whole forward step.
//! - [`CoverageMode::Full`] (inference/evaluation): always round up by one
//!   whole forward step, so the entire utterance fits with trailing
//!   zero-padding — even when the raw length is already an exact multiple.

use crate::config::ArchitectureConfig;
use crate::{Error, Result};

/// Padding/truncation policy for one example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageMode {
    /// Cut to the last whole forward step (training).
    Truncate,
    /// Round up so the whole utterance is covered (inference/evaluation).
    Full,
}

/// Target lengths of one example on the fixed grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLengths {
    /// Waveform samples, a whole multiple of `samples_per_forward`.
    pub samples: usize,
    /// Conditioning frames: `samples / frame_size`.
    pub frames: usize,
}

/// Computes target lengths and conforms streams to them.
#[derive(Debug, Clone)]
pub struct AlignmentWindow {
    frame_size: usize,
    sequence_length: usize,
}

impl AlignmentWindow {
    pub fn new(architecture: &ArchitectureConfig) -> Self {
        Self {
            frame_size: architecture.frame_size,
            sequence_length: architecture.sequence_length,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Raw samples consumed by one forward step.
    pub fn samples_per_forward(&self) -> usize {
        self.frame_size * self.sequence_length
    }

    /// Target sample and frame counts for an utterance of `raw_samples`.
    ///
    /// Truncating mode yields 0 for utterances shorter than one forward
    /// step; full coverage always adds one whole step, even on an exact
    /// multiple.
    pub fn target_lengths(&self, raw_samples: usize, mode: CoverageMode) -> TargetLengths {
        let per_forward = self.samples_per_forward();
        let whole_steps = raw_samples / per_forward;
        let samples = match mode {
            CoverageMode::Truncate => whole_steps * per_forward,
            CoverageMode::Full => (whole_steps + 1) * per_forward,
        };
        TargetLengths {
            samples,
            frames: samples / self.frame_size,
        }
    }

    /// Conform the waveform to `target.samples` (zero-pad or truncate),
    /// then left-pad with exactly `frame_size` zero samples so the first
    /// real frame has a full frame of causal history.
    pub fn conform_waveform(&self, samples: &[f64], target: TargetLengths) -> Vec<f64> {
        let copied = samples.len().min(target.samples);
        let mut out = vec![0.0; self.frame_size + target.samples];
        out[self.frame_size..self.frame_size + copied].copy_from_slice(&samples[..copied]);
        out
    }
}

/// Copy a conditioning stream into a zero matrix of shape
/// `(target_frames, channels)`: rows past the stream's native length stay
/// zero, rows past `target_frames` are dropped.
pub fn conform_stream(
    rows: &[Vec<f64>],
    target_frames: usize,
    channels: usize,
) -> Result<Vec<Vec<f64>>> {
    let copied = rows.len().min(target_frames);
    for row in &rows[..copied] {
        if row.len() != channels {
            return Err(Error::Config(format!(
                "conditioning stream of width {} does not fit {channels} channels",
                row.len()
            )));
        }
    }

    let mut out = vec![vec![0.0; channels]; target_frames];
    out[..copied].clone_from_slice(&rows[..copied]);
    Ok(out)
}
