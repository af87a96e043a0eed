//! Error types for wavegrid-rs.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Annotation line or binary parameter stream does not match its format.
    #[error("parse: {0}")]
    Parse(String),

    /// Categorical value absent from the corpus vocabulary (and not the unknown marker).
    #[error("vocabulary: {0}")]
    Vocabulary(String),

    /// Invalid configuration. Fatal at startup, never raised per item.
    #[error("config: {0}")]
    Config(String),

    /// Audio processing error (WAV I/O, channel layout).
    #[error("audio: {0}")]
    Audio(String),

    /// A per-utterance sibling file is absent.
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Bulk feature extraction failure (converter exit status, deadline).
    #[error("extract: {0}")]
    Extract(String),

    /// I/O error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// A per-item failure with the offending utterance identity attached.
    #[error("utterance {utterance_id}: {source}")]
    Utterance {
        utterance_id: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap a per-item error with the utterance it belongs to.
    ///
    /// Already-wrapped errors pass through unchanged so nested pipeline
    /// stages don't stack identities.
    pub fn for_utterance(self, utterance_id: &str) -> Error {
        match self {
            Error::Utterance { .. } => self,
            other => Error::Utterance {
                utterance_id: utterance_id.to_string(),
                source: Box::new(other),
            },
        }
    }
}

impl From<hound::Error> for Error {
    fn from(error: hound::Error) -> Self {
        Error::Audio(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_utterance_attaches_identity() {
        let err = Error::Parse("bad line".into()).for_utterance("utt_0001");
        assert_eq!(err.to_string(), "utterance utt_0001: parse: bad line");
    }

    #[test]
    fn for_utterance_does_not_stack() {
        let err = Error::Parse("bad line".into())
            .for_utterance("utt_0001")
            .for_utterance("utt_0002");
        assert_eq!(err.to_string(), "utterance utt_0001: parse: bad line");
    }
}
