//! Invertible amplitude quantization.
//!
//! Two strategies map continuous samples onto `levels` discrete symbols and
//! back:
//!
//! - [`linear`] — per-call min/max rescaling into `[0, levels)`
//! - [`mulaw`] — mu-law companding followed by a midrise integer mapping
//!
//! ## Companding formulation
//!
//! Mu-law compresses amplitude before uniform quantization, allocating more
//! resolution to low amplitudes:
//!
//! ```text
//! y = sign(x) * ln(μ|x| + 1) / ln(μ + 1)       μ = 255
//! ```
//!
//! The midrise mapping then places `y ∈ [-1, 1]` on the symbol grid with no
//! code point at the zero crossing.
//!
//! ## Known asymmetry of the linear strategy
//!
//! `LinearQuantizer::quantize` normalizes each call by the input's own
//! min/max, while `dequantize` assumes a fixed `[-1, 1]` domain — the
//! round-trip is only approximate for inputs that don't span `[-1, 1]`.
//! This is reference behavior, preserved deliberately.

pub mod linear;
pub mod mulaw;

pub use linear::LinearQuantizer;
pub use mulaw::MuLawQuantizer;

use crate::config::{QuantizeStrategy, QuantizerConfig};
use crate::{Error, Result};

/// Amplitude codec with the strategy resolved once at construction.
#[derive(Debug, Clone)]
pub enum Quantizer {
    Linear(LinearQuantizer),
    MuLaw(MuLawQuantizer),
}

impl Quantizer {
    /// Build the configured strategy. Fails on degenerate settings — a
    /// configuration error, never a per-call one.
    pub fn from_config(config: &QuantizerConfig) -> Result<Self> {
        if config.levels < 2 {
            return Err(Error::Config(format!(
                "quantizer levels must be at least 2, got {}",
                config.levels
            )));
        }
        Ok(match config.strategy {
            QuantizeStrategy::Linear => Quantizer::Linear(LinearQuantizer::new(config.levels)),
            QuantizeStrategy::MuLaw => Quantizer::MuLaw(MuLawQuantizer::new(config.levels)),
        })
    }

    /// Number of discrete amplitude levels.
    pub fn levels(&self) -> usize {
        match self {
            Quantizer::Linear(q) => q.levels(),
            Quantizer::MuLaw(q) => q.levels(),
        }
    }

    /// Map samples to symbols in `[0, levels)`.
    pub fn quantize(&self, samples: &[f64]) -> Vec<i64> {
        match self {
            Quantizer::Linear(q) => q.quantize(samples),
            Quantizer::MuLaw(q) => q.quantize(samples),
        }
    }

    /// Map symbols back to amplitudes.
    pub fn dequantize(&self, symbols: &[i64]) -> Vec<f64> {
        match self {
            Quantizer::Linear(q) => q.dequantize(symbols),
            Quantizer::MuLaw(q) => q.dequantize(symbols),
        }
    }

    /// The symbol representing zero amplitude: `levels / 2`.
    ///
    /// Used as the padding value when a quantized waveform is extended, so
    /// padded regions decode to silence.
    pub fn zero_symbol(&self) -> i64 {
        (self.levels() / 2) as i64
    }
}
