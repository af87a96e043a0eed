//! Per-utterance example assembly.
//!
//! Orchestrates the full preparation of one training/inference example:
//!
//! 1. Read the raw WAV and patch the utterance's sample count
//! 2. Compute target lengths for the configured grid and coverage mode
//! 3. Conform the waveform (pad/truncate + causal history)
//! 4. Load the conditioning streams the configured mode requires
//! 5. Fuse them into the conditioning tensor
//! 6. Attach the speaker vector
//!
//! Assembly is pure and independent across utterances — the only shared
//! state is the read-only corpus index and vocabulary table — so callers
//! may freely parallelize one utterance per task. Quantization is applied
//! by the caller at the point the waveform meets the model; the resolved
//! codec is exposed via [`PrepPipeline::quantizer`].

use serde::Serialize;

use crate::align::{AlignmentWindow, CoverageMode};
use crate::conditioning::acoustic;
use crate::conditioning::fuser::ConditioningFuser;
use crate::conditioning::label;
use crate::conditioning::linguistic::SegmentExpander;
use crate::conditioning::speaker::{SeedDuration, SpeakerConditionProvider};
use crate::conditioning::vocab::VocabularyTable;
use crate::config::PrepConfig;
use crate::corpus::CorpusIndex;
use crate::quantizer::Quantizer;
use crate::{audio, Result};

/// One assembled example on the fixed grid.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingExample {
    pub utterance_id: String,
    pub speaker_id: String,

    /// Raw sample count before padding/truncation.
    pub raw_samples: usize,
    /// Conformed length, excluding the causal history prefix.
    pub target_samples: usize,
    pub target_frames: usize,

    /// `frame_size + target_samples` zero-padded amplitudes.
    pub waveform: Vec<f64>,
    /// `(frames, channels)` conditioning tensor; in `linguistic_lf0` mode
    /// the frame count may exceed `target_frames`.
    pub conditioning: Vec<Vec<f64>>,
    /// Fixed-size speaker vector.
    pub speaker: Vec<f64>,
}

/// Resolved, validated preparation pipeline for one corpus.
#[derive(Debug)]
pub struct PrepPipeline<'a> {
    corpus: &'a CorpusIndex,
    vocab: &'a VocabularyTable,
    window: AlignmentWindow,
    fuser: ConditioningFuser,
    speakers: SpeakerConditionProvider,
    quantizer: Quantizer,
    expected_sample_rate: u32,
}

impl<'a> PrepPipeline<'a> {
    /// Resolve all strategies from the configuration. Any configuration
    /// fault fails here, at startup, before per-item work begins.
    pub fn new(
        config: &PrepConfig,
        corpus: &'a CorpusIndex,
        vocab: &'a VocabularyTable,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            corpus,
            vocab,
            window: AlignmentWindow::new(&config.architecture),
            fuser: ConditioningFuser::new(&config.conditioning),
            speakers: SpeakerConditionProvider::new(&config.conditioning),
            quantizer: Quantizer::from_config(&config.quantizer)?,
            expected_sample_rate: config.architecture.sample_rate,
        })
    }

    /// The resolved amplitude codec, for quantizing assembled waveforms
    /// and dequantizing model output.
    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    /// Assemble one example. Failures carry the utterance identity and
    /// never affect other utterances.
    pub fn assemble(
        &self,
        utterance_id: &str,
        mode: CoverageMode,
        seed_duration: SeedDuration,
    ) -> Result<TrainingExample> {
        self.assemble_inner(utterance_id, mode, seed_duration)
            .map_err(|e| e.for_utterance(utterance_id))
    }

    fn assemble_inner(
        &self,
        utterance_id: &str,
        mode: CoverageMode,
        seed_duration: SeedDuration,
    ) -> Result<TrainingExample> {
        let context = self.corpus.context_for(utterance_id)?;
        let paths = context.paths();

        let (samples, sample_rate) = audio::read_wav(&paths.wav)?;
        if sample_rate != self.expected_sample_rate {
            tracing::warn!(
                utterance = %utterance_id,
                got = sample_rate,
                expected = self.expected_sample_rate,
                "unexpected sample rate"
            );
        }
        context.utterance.record_wav_len(samples.len());

        let target = self.window.target_lengths(samples.len(), mode);
        let waveform = self.window.conform_waveform(&samples, target);

        let conditioning_mode = self.fuser.mode();
        let linguistic = if conditioning_mode.requires_linguistic() {
            let segments = label::read_label_file(&paths.label)?;
            let expander = SegmentExpander::new(self.vocab);
            Some(expander.expand(&segments, &context.speaker.linguistic_stats)?)
        } else {
            None
        };
        let acoustic = if conditioning_mode.requires_acoustic() {
            Some(acoustic::load_stream(&paths, &context.speaker.acoustic_stats)?)
        } else {
            None
        };

        let conditioning = self.fuser.fuse(
            target.frames,
            linguistic.as_deref(),
            acoustic.as_deref(),
        )?;

        let speaker = self
            .speakers
            .load(context.dataset, context.speaker, seed_duration)?;

        tracing::debug!(
            utterance = %utterance_id,
            raw_samples = samples.len(),
            target_samples = target.samples,
            target_frames = target.frames,
            conditioning_frames = conditioning.len(),
            "example assembled"
        );

        Ok(TrainingExample {
            utterance_id: utterance_id.to_string(),
            speaker_id: context.utterance.speaker_id.clone(),
            raw_samples: samples.len(),
            target_samples: target.samples,
            target_frames: target.frames,
            waveform,
            conditioning,
            speaker,
        })
    }
}
