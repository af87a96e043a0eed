//! Configuration for corpus preparation.
//!
//! Loaded once from JSON at startup; every mode-like setting is a closed
//! enum so an unrecognized value fails at deserialization, before any
//! per-utterance work begins.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Amplitude quantization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantizeStrategy {
    Linear,
    MuLaw,
}

impl std::str::FromStr for QuantizeStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(QuantizeStrategy::Linear),
            "mu_law" => Ok(QuantizeStrategy::MuLaw),
            other => Err(Error::Config(format!(
                "unrecognized quantization strategy {other:?} (expected \"linear\" or \"mu_law\")"
            ))),
        }
    }
}

/// Which streams feed the conditioning tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditioningMode {
    /// Full acoustic parameter stream (cepstrum + envelope + log-F0 + voicing).
    Acoustic,
    /// Expanded linguistic annotation stream.
    Linguistic,
    /// Linguistic stream with the acoustic log-F0 and voicing channels
    /// appended as the trailing two columns.
    LinguisticLf0,
}

impl ConditioningMode {
    /// Whether this mode reads the linguistic annotation stream.
    pub fn requires_linguistic(self) -> bool {
        matches!(self, ConditioningMode::Linguistic | ConditioningMode::LinguisticLf0)
    }

    /// Whether this mode reads the acoustic parameter stream.
    pub fn requires_acoustic(self) -> bool {
        matches!(self, ConditioningMode::Acoustic | ConditioningMode::LinguisticLf0)
    }
}

impl std::str::FromStr for ConditioningMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "acoustic" => Ok(ConditioningMode::Acoustic),
            "linguistic" => Ok(ConditioningMode::Linguistic),
            "linguistic_lf0" => Ok(ConditioningMode::LinguisticLf0),
            other => Err(Error::Config(format!(
                "unrecognized conditioning mode {other:?} \
                 (expected \"acoustic\", \"linguistic\" or \"linguistic_lf0\")"
            ))),
        }
    }
}

/// Source of the per-example speaker vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerMode {
    /// All-zero speaker vector.
    None,
    /// Fixed embedding read from the speaker seed store.
    Seed,
}

/// Sample grid geometry shared by every stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    /// Raw audio samples per conditioning frame (default: 80 — 5 ms at 16 kHz).
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,

    /// Conditioning frames per forward step of the downstream model.
    #[serde(default = "default_sequence_length")]
    pub sequence_length: usize,

    /// Expected sample rate of the corpus WAV files.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            sequence_length: default_sequence_length(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl ArchitectureConfig {
    /// Raw samples consumed by one forward step.
    pub fn samples_per_forward(&self) -> usize {
        self.frame_size * self.sequence_length
    }
}

/// Amplitude quantization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantizerConfig {
    #[serde(default = "default_strategy")]
    pub strategy: QuantizeStrategy,

    /// Number of discrete amplitude levels (default: 256).
    #[serde(default = "default_levels")]
    pub levels: usize,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            levels: default_levels(),
        }
    }
}

/// Conditioning stream selection and channel layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditioningConfig {
    #[serde(default = "default_mode")]
    pub mode: ConditioningMode,

    /// Channel count of the fused conditioning tensor.
    ///
    /// Must match the native width of the selected stream: 43 for acoustic,
    /// the annotation record width (55) for linguistic, record width + 2
    /// for linguistic_lf0.
    #[serde(default = "default_utterance_channels")]
    pub utterance_channels: usize,

    #[serde(default = "default_speaker_mode")]
    pub speaker_mode: SpeakerMode,

    /// Length of the speaker vector.
    #[serde(default = "default_speaker_channels")]
    pub speaker_channels: usize,
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            utterance_channels: default_utterance_channels(),
            speaker_mode: default_speaker_mode(),
            speaker_channels: default_speaker_channels(),
        }
    }
}

/// Top-level preparation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrepConfig {
    #[serde(default)]
    pub architecture: ArchitectureConfig,

    #[serde(default)]
    pub quantizer: QuantizerConfig,

    #[serde(default)]
    pub conditioning: ConditioningConfig,
}

impl PrepConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PrepConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject degenerate settings before any per-item work begins.
    pub fn validate(&self) -> Result<()> {
        if self.architecture.frame_size == 0 {
            return Err(Error::Config("frame_size must be positive".into()));
        }
        if self.architecture.sequence_length == 0 {
            return Err(Error::Config("sequence_length must be positive".into()));
        }
        if self.quantizer.levels < 2 {
            return Err(Error::Config(format!(
                "quantizer levels must be at least 2, got {}",
                self.quantizer.levels
            )));
        }
        if self.conditioning.utterance_channels == 0 {
            return Err(Error::Config("utterance_channels must be positive".into()));
        }
        if self.conditioning.mode == ConditioningMode::LinguisticLf0
            && self.conditioning.utterance_channels <= 2
        {
            return Err(Error::Config(
                "linguistic_lf0 needs at least 3 conditioning channels".into(),
            ));
        }
        if self.conditioning.speaker_mode == SpeakerMode::Seed
            && self.conditioning.speaker_channels == 0
        {
            return Err(Error::Config(
                "speaker_channels must be positive when speaker_mode is \"seed\"".into(),
            ));
        }
        Ok(())
    }
}

fn default_frame_size() -> usize {
    80
}

fn default_sequence_length() -> usize {
    13
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_strategy() -> QuantizeStrategy {
    QuantizeStrategy::MuLaw
}

fn default_levels() -> usize {
    256
}

fn default_mode() -> ConditioningMode {
    ConditioningMode::LinguisticLf0
}

fn default_utterance_channels() -> usize {
    // Annotation record width (55) + log-F0 + voicing.
    57
}

fn default_speaker_mode() -> SpeakerMode {
    SpeakerMode::Seed
}

fn default_speaker_channels() -> usize {
    256
}
