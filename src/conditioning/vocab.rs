//! Corpus-wide categorical vocabularies.
//!
//! Each linguistic category gets one sorted list of the distinct values
//! observed across the whole corpus; the sort order *is* the index
//! assignment, so two corpora with identical observed sets produce
//! identical encodings. Built once, immutable, shared by every expansion
//! call.

use std::collections::BTreeSet;

use crate::conditioning::label::{self, LabelField, Segment};
use crate::corpus::CorpusIndex;
use crate::{Error, Result};

/// The four categorical linguistic feature families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Phoneme,
    Vowel,
    /// Grammatical part-of-speech context.
    Gpos,
    /// ToBI tone-and-break annotation.
    Tobi,
}

impl Category {
    fn name(self) -> &'static str {
        match self {
            Category::Phoneme => "phoneme",
            Category::Vowel => "vowel",
            Category::Gpos => "gpos",
            Category::Tobi => "tobi",
        }
    }
}

/// Accumulates observed values; sorted-set storage makes the resulting
/// index assignment independent of observation order.
#[derive(Debug, Default)]
pub struct VocabularyBuilder {
    phonemes: BTreeSet<String>,
    vowels: BTreeSet<String>,
    gpos: BTreeSet<String>,
    tobi: BTreeSet<String>,
}

impl VocabularyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed value. The unknown marker is never part of a
    /// vocabulary — it encodes as index 0 by substitution, not by lookup.
    pub fn observe(&mut self, category: Category, value: &str) {
        if value == label::UNKNOWN_MARKER {
            return;
        }
        let set = match category {
            Category::Phoneme => &mut self.phonemes,
            Category::Vowel => &mut self.vowels,
            Category::Gpos => &mut self.gpos,
            Category::Tobi => &mut self.tobi,
        };
        if !set.contains(value) {
            set.insert(value.to_string());
        }
    }

    /// Record every categorical field of a parsed segment.
    pub fn observe_segment(&mut self, segment: &Segment) {
        for field in &segment.fields {
            match field {
                LabelField::Phoneme(v) => self.observe(Category::Phoneme, v),
                LabelField::Vowel(v) => self.observe(Category::Vowel, v),
                LabelField::Gpos(v) => self.observe(Category::Gpos, v),
                LabelField::Tobi(v) => self.observe(Category::Tobi, v),
                LabelField::Numeric(_) => {}
            }
        }
    }

    pub fn build(self) -> VocabularyTable {
        VocabularyTable {
            phonemes: self.phonemes.into_iter().collect(),
            vowels: self.vowels.into_iter().collect(),
            gpos: self.gpos.into_iter().collect(),
            tobi: self.tobi.into_iter().collect(),
        }
    }
}

/// Immutable value → index tables, one per category.
#[derive(Debug, Clone)]
pub struct VocabularyTable {
    phonemes: Vec<String>,
    vowels: Vec<String>,
    gpos: Vec<String>,
    tobi: Vec<String>,
}

impl VocabularyTable {
    /// Build the vocabulary by scanning every annotation file in the corpus.
    ///
    /// A missing annotation file is logged and skipped — that utterance will
    /// fail on its own at assembly time. A malformed line fails the scan
    /// with the utterance identity attached.
    pub fn scan_corpus(corpus: &CorpusIndex) -> Result<Self> {
        let mut builder = VocabularyBuilder::new();
        for utterance_id in corpus.utterance_ids() {
            let context = corpus.context_for(&utterance_id)?;
            let label_path = context.paths().label;
            if !label_path.is_file() {
                tracing::warn!(
                    utterance = %utterance_id,
                    path = %label_path.display(),
                    "annotation file missing, skipped during vocabulary scan"
                );
                continue;
            }
            let segments = label::read_label_file(&label_path)
                .map_err(|e| e.for_utterance(&utterance_id))?;
            for segment in &segments {
                builder.observe_segment(segment);
            }
        }
        let table = builder.build();
        tracing::info!(
            phonemes = table.len(Category::Phoneme),
            vowels = table.len(Category::Vowel),
            gpos = table.len(Category::Gpos),
            tobi = table.len(Category::Tobi),
            "vocabulary built"
        );
        Ok(table)
    }

    fn values(&self, category: Category) -> &[String] {
        match category {
            Category::Phoneme => &self.phonemes,
            Category::Vowel => &self.vowels,
            Category::Gpos => &self.gpos,
            Category::Tobi => &self.tobi,
        }
    }

    pub fn len(&self, category: Category) -> usize {
        self.values(category).len()
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.values(category).is_empty()
    }

    /// Index of a value observed at build time.
    ///
    /// Fails with a vocabulary-miss error for anything unseen; callers must
    /// substitute the unknown marker with 0 *before* lookup (see
    /// [`VocabularyTable::encode`]).
    pub fn index_of(&self, category: Category, value: &str) -> Result<usize> {
        self.values(category)
            .binary_search_by(|v| v.as_str().cmp(value))
            .map_err(|_| {
                Error::Vocabulary(format!(
                    "{} value {value:?} not in the corpus vocabulary",
                    category.name()
                ))
            })
    }

    /// Encode a raw field value: the unknown marker maps to 0 without a
    /// lookup, everything else goes through [`VocabularyTable::index_of`].
    pub fn encode(&self, category: Category, value: &str) -> Result<usize> {
        if value == label::UNKNOWN_MARKER {
            return Ok(0);
        }
        self.index_of(category, value)
    }
}
