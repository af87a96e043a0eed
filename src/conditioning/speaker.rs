//! Speaker condition vectors.
//!
//! Thin adapter over the external embedding store. The store is keyed by
//! speaker name plus a duration selector from a fixed set — each duration
//! resolves to its own folder variant holding one serialized vector per
//! speaker. The embeddings themselves are produced offline by an external
//! provider; this module only reads them.

use crate::config::{ConditioningConfig, SpeakerMode};
use crate::corpus::{Dataset, Speaker};
use crate::{Error, Result};

/// How much speech the embedding was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedDuration {
    S1,
    S10,
    S60,
    S120,
}

impl SeedDuration {
    pub fn seconds(self) -> u32 {
        match self {
            SeedDuration::S1 => 1,
            SeedDuration::S10 => 10,
            SeedDuration::S60 => 60,
            SeedDuration::S120 => 120,
        }
    }

    /// Store folder variant for this duration.
    fn dir_name(self) -> String {
        format!("seed_{}s", self.seconds())
    }
}

impl Default for SeedDuration {
    fn default() -> Self {
        SeedDuration::S60
    }
}

impl TryFrom<u32> for SeedDuration {
    type Error = Error;

    fn try_from(seconds: u32) -> Result<Self> {
        match seconds {
            1 => Ok(SeedDuration::S1),
            10 => Ok(SeedDuration::S10),
            60 => Ok(SeedDuration::S60),
            120 => Ok(SeedDuration::S120),
            other => Err(Error::Config(format!(
                "seed duration must be one of 1, 10, 60 or 120 seconds, got {other}"
            ))),
        }
    }
}

/// Supplies the fixed-size speaker vector for one example.
#[derive(Debug, Clone)]
pub struct SpeakerConditionProvider {
    mode: SpeakerMode,
    channels: usize,
}

impl SpeakerConditionProvider {
    pub fn new(config: &ConditioningConfig) -> Self {
        Self {
            mode: config.speaker_mode,
            channels: config.speaker_channels,
        }
    }

    /// The speaker vector: all zeros when speaker conditioning is off,
    /// otherwise the stored embedding for `(speaker, duration)`.
    pub fn load(
        &self,
        dataset: &Dataset,
        speaker: &Speaker,
        duration: SeedDuration,
    ) -> Result<Vec<f64>> {
        match self.mode {
            SpeakerMode::None => Ok(vec![0.0; self.channels]),
            SpeakerMode::Seed => self.read_seed(dataset, speaker, duration),
        }
    }

    fn read_seed(
        &self,
        dataset: &Dataset,
        speaker: &Speaker,
        duration: SeedDuration,
    ) -> Result<Vec<f64>> {
        let path = dataset
            .speaker_seeds_dir
            .join(duration.dir_name())
            .join(format!("{}.seed.json", speaker.name));
        if !path.is_file() {
            return Err(Error::MissingFile(path));
        }

        let text = std::fs::read_to_string(&path)?;
        let vector: Vec<f64> = serde_json::from_str(&text)?;
        if vector.len() != self.channels {
            return Err(Error::Config(format!(
                "speaker seed {} has {} channels, expected {}",
                path.display(),
                vector.len(),
                self.channels
            )));
        }
        Ok(vector)
    }
}
