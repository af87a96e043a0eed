//! Duration-driven expansion of annotation segments onto the frame grid.
//!
//! Each parsed [`Segment`] becomes a block of identical normalized feature
//! rows, one per 5 ms frame of its duration, with the relative-duration
//! column rewritten to the frame's fractional position within the segment.
//! Blocks are appended in file order; the output row count is the sum of
//! the segments' frame counts.

use crate::conditioning::label::{LabelField, Segment};
use crate::conditioning::vocab::{Category, VocabularyTable};
use crate::corpus::Stats;
use crate::Result;

/// Column overwritten with the 0→1 fractional position per segment.
const RELATIVE_DURATION_COLUMN: usize = 1;

/// Expands segments into per-frame linguistic feature rows.
pub struct SegmentExpander<'a> {
    vocab: &'a VocabularyTable,
}

impl<'a> SegmentExpander<'a> {
    pub fn new(vocab: &'a VocabularyTable) -> Self {
        Self { vocab }
    }

    /// Encode one segment to its fixed-width numeric row: slot 0 becomes
    /// the duration, categorical slots become vocabulary indices (unknown
    /// marker → 0), numeric slots pass through.
    pub fn encode(&self, segment: &Segment) -> Result<Vec<f64>> {
        let mut row = Vec::with_capacity(segment.fields.len());
        for field in &segment.fields {
            row.push(match field {
                LabelField::Numeric(v) => *v,
                LabelField::Phoneme(v) => self.vocab.encode(Category::Phoneme, v)? as f64,
                LabelField::Vowel(v) => self.vocab.encode(Category::Vowel, v)? as f64,
                LabelField::Gpos(v) => self.vocab.encode(Category::Gpos, v)? as f64,
                LabelField::Tobi(v) => self.vocab.encode(Category::Tobi, v)? as f64,
            });
        }
        row[0] = segment.duration() as f64;
        Ok(row)
    }

    /// Expand all segments of one utterance, in file order.
    ///
    /// Each segment's row is normalized with the speaker's linguistic
    /// statistics, repeated once per frame, and its relative-duration
    /// column overwritten with a 0→1 sequence inclusive of both endpoints.
    /// The relative-duration values themselves are not normalized.
    /// Segments whose frame count truncates to 0 contribute nothing.
    pub fn expand(&self, segments: &[Segment], stats: &Stats) -> Result<Vec<Vec<f64>>> {
        let mut rows = Vec::new();
        for segment in segments {
            let steps = segment.frame_count();
            if steps == 0 {
                tracing::trace!(
                    start = segment.start,
                    end = segment.end,
                    "sub-frame segment dropped"
                );
                continue;
            }

            let mut row = self.encode(segment)?;
            stats.normalize(&mut row)?;

            for step in 0..steps {
                let mut frame = row.clone();
                frame[RELATIVE_DURATION_COLUMN] = relative_position(step, steps);
                rows.push(frame);
            }
        }
        Ok(rows)
    }
}

/// Fractional position of `step` within a block of `steps` frames,
/// spanning 0 to 1 inclusive (a single-frame block sits at 0).
fn relative_position(step: usize, steps: usize) -> f64 {
    if steps <= 1 {
        0.0
    } else {
        step as f64 / (steps - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditioning::label::{self, RECORD_WIDTH};
    use crate::conditioning::vocab::VocabularyBuilder;

    fn segment(start: i64, end: i64) -> Segment {
        let line = label::tests::sample_line(
            start,
            end,
            ["sil", "sil", "k", "aa", "t"],
            "aa",
            ["x", "nn", "x"],
            "L-L%",
        );
        label::parse_line(&line).unwrap()
    }

    fn vocab_for(segments: &[Segment]) -> VocabularyTable {
        let mut builder = VocabularyBuilder::new();
        for s in segments {
            builder.observe_segment(s);
        }
        builder.build()
    }

    #[test]
    fn encode_replaces_slot_zero_with_duration() {
        let s = segment(50_000, 250_000);
        let vocab = vocab_for(std::slice::from_ref(&s));
        let row = SegmentExpander::new(&vocab).encode(&s).unwrap();
        assert_eq!(row.len(), RECORD_WIDTH);
        assert_eq!(row[0], 200_000.0);
        assert_eq!(row[1], 250_000.0);
    }

    #[test]
    fn encode_maps_categoricals_through_the_vocabulary() {
        let s = segment(0, 50_000);
        let vocab = vocab_for(std::slice::from_ref(&s));
        let row = SegmentExpander::new(&vocab).encode(&s).unwrap();
        // Phoneme vocabulary is {aa, k, sil, t}; slot 4 is "k".
        assert_eq!(row[4], 1.0);
        // Gpos slot 31 is the unknown marker, substituted with 0.
        assert_eq!(row[31], 0.0);
    }

    #[test]
    fn expand_emits_one_block_per_segment_in_file_order() {
        // 5 ms and 20 ms segments: 1 + 4 frames.
        let segments = vec![segment(0, 50_000), segment(50_000, 250_000)];
        let vocab = vocab_for(&segments);
        let expander = SegmentExpander::new(&vocab);

        let rows = expander
            .expand(&segments, &Stats::identity(RECORD_WIDTH))
            .unwrap();
        assert_eq!(rows.len(), 5);

        // First block: one frame, relative duration 0.
        assert_eq!(rows[0][0], 50_000.0);
        assert_eq!(rows[0][RELATIVE_DURATION_COLUMN], 0.0);

        // Second block: relative duration spans 0..=1.
        let positions: Vec<f64> = rows[1..]
            .iter()
            .map(|r| r[RELATIVE_DURATION_COLUMN])
            .collect();
        assert_eq!(positions[0], 0.0);
        assert_eq!(*positions.last().unwrap(), 1.0);
        for pair in positions.windows(2) {
            assert!(pair[0] < pair[1], "relative duration must increase");
        }
        assert!((positions[1] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn sub_frame_segments_are_dropped() {
        // 3 ms — under one 5 ms frame.
        let segments = vec![segment(0, 30_000), segment(30_000, 230_000)];
        let vocab = vocab_for(&segments);
        let rows = SegmentExpander::new(&vocab)
            .expand(&segments, &Stats::identity(RECORD_WIDTH))
            .unwrap();
        assert_eq!(rows.len(), 4, "only the second segment contributes");
        assert_eq!(rows[0][0], 200_000.0);
    }

    #[test]
    fn expand_normalizes_with_speaker_stats_but_not_the_position() {
        let segments = vec![segment(0, 100_000)]; // 2 frames
        let vocab = vocab_for(&segments);

        let mut stats = Stats::identity(RECORD_WIDTH);
        stats.mean[0] = 100_000.0;
        stats.scale[0] = 50_000.0;
        stats.mean[RELATIVE_DURATION_COLUMN] = 1_000.0;
        stats.scale[RELATIVE_DURATION_COLUMN] = 7.0;

        let rows = SegmentExpander::new(&vocab)
            .expand(&segments, &stats)
            .unwrap();
        assert_eq!(rows.len(), 2);
        // Duration column normalized: (100000 - 100000) / 50000 = 0.
        assert_eq!(rows[0][0], 0.0);
        // Position column overwritten after normalization: raw 0 and 1.
        assert_eq!(rows[0][RELATIVE_DURATION_COLUMN], 0.0);
        assert_eq!(rows[1][RELATIVE_DURATION_COLUMN], 1.0);
    }

    #[test]
    fn relative_position_endpoints() {
        assert_eq!(relative_position(0, 1), 0.0);
        assert_eq!(relative_position(0, 4), 0.0);
        assert_eq!(relative_position(3, 4), 1.0);
    }
}
