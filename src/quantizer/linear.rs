//! Linear amplitude quantization.
//!
//! Quantization rescales each input sequence by its own observed min/max to
//! occupy `[0, levels)`; dequantization assumes a fixed `[-1, 1]` domain.
//! See the module-level note in [`crate::quantizer`] on this asymmetry.

/// Keeps the maximum input below `levels` after flooring. Biases the scale
/// down, never up.
const EPSILON: f64 = 1e-2;

/// Per-call min/max linear quantizer.
#[derive(Debug, Clone)]
pub struct LinearQuantizer {
    levels: usize,
}

impl LinearQuantizer {
    pub fn new(levels: usize) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Rescale by this call's min/max and floor onto the symbol grid.
    ///
    /// A constant input (max − min = 0) maps to all-zero symbols.
    pub fn quantize(&self, samples: &[f64]) -> Vec<i64> {
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let span = samples
            .iter()
            .map(|&s| s - min)
            .fold(f64::NEG_INFINITY, f64::max);

        if !(span > 0.0) {
            return vec![0; samples.len()];
        }

        let scale = (self.levels as f64 - EPSILON) / span;
        samples
            .iter()
            .map(|&s| ((s - min) * scale + EPSILON / 2.0).floor() as i64)
            .collect()
    }

    /// Decode assuming symbols cover a fixed `[-1, 1]` amplitude range.
    pub fn dequantize(&self, symbols: &[i64]) -> Vec<f64> {
        let half = self.levels as f64 / 2.0;
        symbols.iter().map(|&s| s as f64 / half - 1.0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_stay_in_range() {
        let q = LinearQuantizer::new(256);
        let samples: Vec<f64> = (0..500).map(|i| ((i * 37) % 101) as f64 / 50.0 - 1.0).collect();
        for &symbol in &q.quantize(&samples) {
            assert!((0..256).contains(&symbol), "symbol {symbol} out of range");
        }
    }

    #[test]
    fn normalization_is_per_call() {
        // The same shape at two different amplitude scales produces the same
        // symbols — each call normalizes by its own min/max.
        let q = LinearQuantizer::new(64);
        let quiet: Vec<f64> = (0..100).map(|i| (i as f64 / 50.0 - 1.0) * 0.01).collect();
        let loud: Vec<f64> = quiet.iter().map(|&s| s * 80.0).collect();
        assert_eq!(q.quantize(&quiet), q.quantize(&loud));
    }

    #[test]
    fn extremes_map_to_first_and_last_symbol() {
        let q = LinearQuantizer::new(256);
        let symbols = q.quantize(&[-1.0, 0.0, 1.0]);
        assert_eq!(symbols[0], 0);
        assert_eq!(symbols[2], 255);
    }

    #[test]
    fn constant_input_quantizes_to_zero() {
        let q = LinearQuantizer::new(256);
        assert_eq!(q.quantize(&[0.25; 8]), vec![0; 8]);
        assert_eq!(q.quantize(&[]), Vec::<i64>::new());
    }

    #[test]
    fn full_range_roundtrip_is_approximate() {
        // Only inputs spanning [-1, 1] survive the per-call/fixed-domain
        // asymmetry; for them the round-trip error is one symbol step.
        let q = LinearQuantizer::new(256);
        let samples: Vec<f64> = (0..=200).map(|i| i as f64 / 100.0 - 1.0).collect();
        let decoded = q.dequantize(&q.quantize(&samples));
        for (&x, &y) in samples.iter().zip(decoded.iter()) {
            assert!(
                (x - y).abs() <= 2.5 / 256.0,
                "roundtrip error too large at {x}: {y}"
            );
        }
    }

    #[test]
    fn dequantize_assumes_fixed_domain() {
        let q = LinearQuantizer::new(256);
        assert_eq!(q.dequantize(&[128])[0], 0.0);
        assert_eq!(q.dequantize(&[0])[0], -1.0);
    }
}
