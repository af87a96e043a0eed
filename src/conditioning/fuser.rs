//! Fusion of conditioning streams into the final per-frame tensor.
//!
//! The mode is resolved to an enum once at configuration time; no per-item
//! string dispatch. Acoustic and linguistic modes conform their single
//! source stream to the target frame count. The `linguistic_lf0` mode
//! instead grows to the longest participating stream and concatenates the
//! truncated linguistic vector with the acoustic stream's trailing two
//! channels (log-F0 and voicing).

use crate::align::conform_stream;
use crate::config::{ConditioningConfig, ConditioningMode};
use crate::{Error, Result};

/// Assembles the conditioning tensor for one utterance.
#[derive(Debug, Clone)]
pub struct ConditioningFuser {
    mode: ConditioningMode,
    channels: usize,
}

impl ConditioningFuser {
    pub fn new(config: &ConditioningConfig) -> Self {
        Self {
            mode: config.mode,
            channels: config.utterance_channels,
        }
    }

    pub fn mode(&self) -> ConditioningMode {
        self.mode
    }

    /// Channel count of the fused tensor.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Fuse the loaded streams onto the target grid.
    ///
    /// Only the streams the mode requires may be `None`-checked: passing
    /// `None` for a required stream is a configuration fault.
    pub fn fuse(
        &self,
        target_frames: usize,
        linguistic: Option<&[Vec<f64>]>,
        acoustic: Option<&[Vec<f64>]>,
    ) -> Result<Vec<Vec<f64>>> {
        match self.mode {
            ConditioningMode::Acoustic => {
                let acoustic = require(acoustic, "acoustic")?;
                conform_stream(acoustic, target_frames, self.channels)
            }
            ConditioningMode::Linguistic => {
                let linguistic = require(linguistic, "linguistic")?;
                conform_stream(linguistic, target_frames, self.channels)
            }
            ConditioningMode::LinguisticLf0 => {
                let linguistic = require(linguistic, "linguistic")?;
                let acoustic = require(acoustic, "acoustic")?;
                self.fuse_linguistic_lf0(target_frames, linguistic, acoustic)
            }
        }
    }

    /// Linguistic features in all but the last two channels, acoustic
    /// log-F0 and voicing in the final two. The tensor covers the longest
    /// of the three lengths — it is *not* clipped to `target_frames` —
    /// and rows beyond either source's native length stay zero.
    fn fuse_linguistic_lf0(
        &self,
        target_frames: usize,
        linguistic: &[Vec<f64>],
        acoustic: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>> {
        let linguistic_channels = self.channels - 2;
        let rows = target_frames.max(linguistic.len()).max(acoustic.len());
        let mut out = vec![vec![0.0; self.channels]; rows];

        for (row, source) in out.iter_mut().zip(linguistic) {
            if source.len() != linguistic_channels {
                return Err(Error::Config(format!(
                    "linguistic stream of width {} does not fit the first {} channels",
                    source.len(),
                    linguistic_channels
                )));
            }
            row[..linguistic_channels].copy_from_slice(source);
        }
        for (row, source) in out.iter_mut().zip(acoustic) {
            if source.len() < 2 {
                return Err(Error::Config(format!(
                    "acoustic stream of width {} has no trailing log-F0/voicing channels",
                    source.len()
                )));
            }
            row[linguistic_channels..].copy_from_slice(&source[source.len() - 2..]);
        }
        Ok(out)
    }
}

fn require<'a>(
    stream: Option<&'a [Vec<f64>]>,
    name: &str,
) -> Result<&'a [Vec<f64>]> {
    stream.ok_or_else(|| {
        Error::Config(format!("conditioning mode requires the {name} stream"))
    })
}
