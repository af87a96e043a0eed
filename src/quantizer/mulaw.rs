//! Mu-law companded quantization.
//!
//! Companding followed by a midrise integer mapping:
//!
//! ```text
//! y  = sign(x) * ln(μ|x| + 1) / ln(μ + 1)
//! x' = floor((y + 1)/2 * (levels - ε))
//! ```
//!
//! The inverse undoes the midrise mapping and then the companding. With an
//! even level count the midrise grid has no code point at the zero
//! crossing; the dedicated zero symbol `levels / 2` decodes to exactly 0.

const MU: f64 = 255.0;

/// Keeps `y = 1` below `levels` after flooring. Biases the scale down,
/// never up.
const MIDRISE_EPSILON: f64 = 1e-6;

/// Mu-law companding quantizer.
#[derive(Debug, Clone)]
pub struct MuLawQuantizer {
    levels: usize,
}

impl MuLawQuantizer {
    pub fn new(levels: usize) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Compand and floor onto the midrise symbol grid.
    pub fn quantize(&self, samples: &[f64]) -> Vec<i64> {
        let scale = self.levels as f64 - MIDRISE_EPSILON;
        samples
            .iter()
            .map(|&x| (0.5 * (compand(x) + 1.0) * scale).floor() as i64)
            .collect()
    }

    /// Undo the midrise mapping, then the companding.
    pub fn dequantize(&self, symbols: &[i64]) -> Vec<f64> {
        let levels = self.levels as f64;
        symbols
            .iter()
            .map(|&s| expand(s as f64 * 2.0 / levels - 1.0))
            .collect()
    }
}

/// `y = sign(x) * ln(μ|x| + 1) / ln(μ + 1)`
fn compand(x: f64) -> f64 {
    let y = (MU * x.abs() + 1.0).ln() / (MU + 1.0).ln();
    if x < 0.0 {
        -y
    } else {
        y
    }
}

/// Inverse companding: `x = sign(y) * (exp(|y| * ln(μ + 1)) - 1) / μ`
fn expand(y: f64) -> f64 {
    let x = ((y.abs() * (MU + 1.0).ln()).exp() - 1.0) / MU;
    if y < 0.0 {
        -x
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep() -> Vec<f64> {
        (0..=400).map(|i| i as f64 / 200.0 - 1.0).collect()
    }

    #[test]
    fn symbols_stay_in_range() {
        let q = MuLawQuantizer::new(256);
        for (&x, &symbol) in sweep().iter().zip(q.quantize(&sweep()).iter()) {
            assert!(
                (0..256).contains(&symbol),
                "symbol {symbol} out of [0, 256) for input {x}"
            );
        }
    }

    #[test]
    fn companded_domain_error_is_one_step() {
        let q = MuLawQuantizer::new(256);
        let samples = sweep();
        for (&x, &symbol) in samples.iter().zip(q.quantize(&samples).iter()) {
            let reconstructed = symbol as f64 * 2.0 / 256.0 - 1.0;
            assert!(
                (compand(x) - reconstructed).abs() <= 2.0 / 256.0,
                "companded error beyond one step at {x}"
            );
        }
    }

    #[test]
    fn roundtrip_error_is_bounded() {
        // One midrise step (2/levels) expanded through the inverse
        // companding, whose slope peaks at ln(μ+1) * (μ+1)/μ ≈ 5.57.
        let q = MuLawQuantizer::new(256);
        let samples = sweep();
        let decoded = q.dequantize(&q.quantize(&samples));
        for (&x, &y) in samples.iter().zip(decoded.iter()) {
            assert!(
                (x - y).abs() <= 11.2 / 256.0,
                "roundtrip error too large at {x}: got {y}"
            );
        }
    }

    #[test]
    fn low_amplitudes_get_fine_resolution() {
        let q = MuLawQuantizer::new(256);
        let samples: Vec<f64> = (0..=100).map(|i| i as f64 / 1000.0 - 0.05).collect();
        let decoded = q.dequantize(&q.quantize(&samples));
        for (&x, &y) in samples.iter().zip(decoded.iter()) {
            assert!(
                (x - y).abs() <= 1.0 / 256.0,
                "low-amplitude error should beat the uniform step at {x}: got {y}"
            );
        }
    }

    #[test]
    fn quantize_is_monotone() {
        let q = MuLawQuantizer::new(256);
        let symbols = q.quantize(&sweep());
        for pair in symbols.windows(2) {
            assert!(pair[0] <= pair[1], "symbols must be non-decreasing");
        }
    }

    #[test]
    fn companding_is_odd_symmetric() {
        for x in [0.01, 0.1, 0.5, 1.0] {
            assert!((compand(x) + compand(-x)).abs() < 1e-12);
            assert!((expand(compand(x)) - x).abs() < 1e-12);
        }
    }
}
