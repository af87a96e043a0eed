//! The corpus index: datasets, speakers and utterances.
//!
//! Loaded once from JSON at startup, validated, then shared read-only
//! across all per-utterance work. The only post-load mutation is the
//! documented one-time raw-sample-count patch on [`Utterance`], which is a
//! thread-safe set-once cell.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Per-speaker normalization statistics: one `(mean, scale)` pair per
/// feature column, computed offline over that speaker's training data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Stats {
    /// Mean 0, scale 1 — leaves rows unchanged.
    pub fn identity(width: usize) -> Self {
        Self {
            mean: vec![0.0; width],
            scale: vec![1.0; width],
        }
    }

    /// Normalize one feature row elementwise: `(x - mean) / scale`.
    ///
    /// A width mismatch between the row and the statistics is a
    /// configuration fault, not a per-item one.
    pub fn normalize(&self, row: &mut [f64]) -> Result<()> {
        if self.mean.len() != row.len() || self.scale.len() != row.len() {
            return Err(Error::Config(format!(
                "normalization stats of width {}/{} applied to a row of width {}",
                self.mean.len(),
                self.scale.len(),
                row.len()
            )));
        }
        for ((x, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            *x = (*x - mean) / scale;
        }
        Ok(())
    }
}

/// Root folders holding one corpus subset's files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Raw audio folder (`<path>.wav`).
    pub wavs_dir: PathBuf,
    /// Acoustic parameter folder (`<path>.cc` / `.fv` / `.lf0`).
    pub acoustic_dir: PathBuf,
    /// Linguistic annotation folder (`<path>.lab`).
    pub linguistic_dir: PathBuf,
    /// Speaker embedding store root (`seed_<D>s/<name>.seed.json`).
    pub speaker_seeds_dir: PathBuf,
}

/// One speaker and their immutable normalization statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    pub dataset_id: String,
    pub name: String,
    pub acoustic_stats: Stats,
    pub linguistic_stats: Stats,
}

/// One recording, keyed by id in the corpus index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker_id: String,
    /// Relative stem locating the `.wav` and its sibling annotation files
    /// under the owning dataset's folders.
    pub path: String,
    #[serde(skip)]
    wav_len: OnceLock<usize>,
}

impl Utterance {
    pub fn new(speaker_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            path: path.into(),
            wav_len: OnceLock::new(),
        }
    }

    /// Patch the raw sample count after the first audio load. Set exactly
    /// once; later calls with any value are ignored.
    pub fn record_wav_len(&self, samples: usize) {
        let _ = self.wav_len.set(samples);
    }

    /// Raw sample count, if an audio load has patched it.
    pub fn wav_len(&self) -> Option<usize> {
        self.wav_len.get().copied()
    }
}

/// Absolute paths of one utterance's on-disk files.
#[derive(Debug, Clone)]
pub struct UtterancePaths {
    pub wav: PathBuf,
    pub cepstrum: PathBuf,
    pub envelope: PathBuf,
    pub lf0: PathBuf,
    pub label: PathBuf,
}

/// The three read-only corpus collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusIndex {
    pub datasets: BTreeMap<String, Dataset>,
    pub speakers: BTreeMap<String, Speaker>,
    pub utterances: BTreeMap<String, Utterance>,
}

impl CorpusIndex {
    /// Load and validate a corpus index from a JSON file.
    ///
    /// A missing index file fails the whole load; per-utterance sibling
    /// files are only checked when the utterance itself is processed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let index: CorpusIndex = serde_json::from_str(&text)?;
        index.validate()?;
        tracing::info!(
            datasets = index.datasets.len(),
            speakers = index.speakers.len(),
            utterances = index.utterances.len(),
            "corpus index loaded"
        );
        Ok(index)
    }

    /// Referential integrity: every utterance's speaker and every
    /// speaker's dataset must exist.
    pub fn validate(&self) -> Result<()> {
        for (id, speaker) in &self.speakers {
            if !self.datasets.contains_key(&speaker.dataset_id) {
                return Err(Error::Config(format!(
                    "speaker {id:?} references unknown dataset {:?}",
                    speaker.dataset_id
                )));
            }
        }
        for (id, utterance) in &self.utterances {
            if !self.speakers.contains_key(&utterance.speaker_id) {
                return Err(Error::Config(format!(
                    "utterance {id:?} references unknown speaker {:?}",
                    utterance.speaker_id
                )));
            }
        }
        Ok(())
    }

    /// All utterance ids in index order (sorted by key).
    pub fn utterance_ids(&self) -> Vec<String> {
        self.utterances.keys().cloned().collect()
    }

    /// Resolve one utterance to its owning speaker and dataset.
    pub fn context_for(&self, utterance_id: &str) -> Result<UtteranceContext<'_>> {
        let utterance = self.utterances.get(utterance_id).ok_or_else(|| {
            Error::Config(format!("unknown utterance id {utterance_id:?}"))
        })?;
        let speaker = self.speakers.get(&utterance.speaker_id).ok_or_else(|| {
            Error::Config(format!("unknown speaker id {:?}", utterance.speaker_id))
        })?;
        let dataset = self.datasets.get(&speaker.dataset_id).ok_or_else(|| {
            Error::Config(format!("unknown dataset id {:?}", speaker.dataset_id))
        })?;
        Ok(UtteranceContext {
            utterance_id: utterance_id.to_string(),
            dataset,
            speaker,
            utterance,
        })
    }
}

/// One utterance resolved against its corpus: borrowed, read-only views.
#[derive(Debug, Clone)]
pub struct UtteranceContext<'a> {
    pub utterance_id: String,
    pub dataset: &'a Dataset,
    pub speaker: &'a Speaker,
    pub utterance: &'a Utterance,
}

impl UtteranceContext<'_> {
    /// Sibling file paths for this utterance.
    pub fn paths(&self) -> UtterancePaths {
        let stem = &self.utterance.path;
        UtterancePaths {
            wav: self.dataset.wavs_dir.join(format!("{stem}.wav")),
            cepstrum: self.dataset.acoustic_dir.join(format!("{stem}.cc")),
            envelope: self.dataset.acoustic_dir.join(format!("{stem}.fv")),
            lf0: self.dataset.acoustic_dir.join(format!("{stem}.lf0")),
            label: self.dataset.linguistic_dir.join(format!("{stem}.lab")),
        }
    }
}

/// Deterministically shuffle utterance ids for epoch ordering.
pub fn shuffle_utterance_ids(ids: &mut [String], seed: u64) {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    ids.shuffle(&mut rng);
}
