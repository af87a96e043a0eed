//! Bulk acoustic feature extraction.
//!
//! Drives the external waveform→parameters converter over many files with
//! a bounded worker pool. The converter itself is behind the
//! [`AcousticExtractor`] seam; this module owns only the scheduling:
//! at most `workers` conversions in flight, a deadline per file, and one
//! explicit [`ExtractOutcome`] per input — failures are collected and
//! returned, never silently dropped. Completion order is not guaranteed.
//! No retries: a conversion is deterministic given its input.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};

use crate::{Error, Result};

/// External waveform→acoustic-parameters converter.
///
/// One blocking call per WAV file; the converter writes the `.cc`/`.fv`/
/// `.lf0` siblings next to its input.
pub trait AcousticExtractor: Send + Sync {
    fn extract(&self, wav_path: &Path) -> Result<()>;
}

/// Converter invoked as an external command, one process per file.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: PathBuf,
}

impl CommandExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl AcousticExtractor for CommandExtractor {
    fn extract(&self, wav_path: &Path) -> Result<()> {
        let status = std::process::Command::new(&self.program)
            .arg(wav_path)
            .status()?;
        if !status.success() {
            return Err(Error::Extract(format!(
                "{} failed on {} ({status})",
                self.program.display(),
                wav_path.display()
            )));
        }
        Ok(())
    }
}

/// Result of one file's conversion.
#[derive(Debug)]
pub struct ExtractOutcome {
    pub wav_path: PathBuf,
    pub result: Result<()>,
}

/// Bounded-concurrency driver for bulk conversion.
#[derive(Debug, Clone)]
pub struct BulkExtractor {
    /// Maximum conversions in flight.
    pub workers: usize,
    /// Per-file deadline; a pathologically slow disk fails the file, not
    /// the run.
    pub deadline: Duration,
}

impl Default for BulkExtractor {
    fn default() -> Self {
        Self {
            workers: 50,
            deadline: Duration::from_secs(120),
        }
    }
}

impl BulkExtractor {
    /// Convert every file, returning one outcome per input in completion
    /// order.
    pub async fn run(
        &self,
        extractor: Arc<dyn AcousticExtractor + 'static>,
        wav_paths: Vec<PathBuf>,
    ) -> Vec<ExtractOutcome> {
        let total = wav_paths.len();
        let semaphore = Arc::new(Semaphore::new(self.workers.max(1)));
        let (tx, mut rx) = mpsc::channel::<ExtractOutcome>(total.max(1));
        let deadline = self.deadline;

        for wav_path in wav_paths {
            let semaphore = Arc::clone(&semaphore);
            let extractor = Arc::clone(&extractor);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => convert_one(extractor, wav_path.clone(), deadline).await,
                    Err(_) => Err(Error::Extract("worker pool closed".into())),
                };
                // Receiver only drops once every sender is gone.
                let _ = tx.send(ExtractOutcome { wav_path, result }).await;
            });
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            if let Err(error) = &outcome.result {
                tracing::warn!(
                    wav = %outcome.wav_path.display(),
                    %error,
                    "conversion failed"
                );
            }
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        tracing::info!(total, failed, "bulk extraction finished");
        outcomes
    }
}

/// One conversion: blocking call on the blocking pool, bounded by the
/// deadline.
async fn convert_one(
    extractor: Arc<dyn AcousticExtractor>,
    wav_path: PathBuf,
    deadline: Duration,
) -> Result<()> {
    let task = tokio::task::spawn_blocking(move || extractor.extract(&wav_path));
    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(Error::Extract(format!(
            "conversion task panicked: {join_error}"
        ))),
        Err(_) => Err(Error::Extract(format!(
            "conversion exceeded the {}s deadline",
            deadline.as_secs_f64()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every path it sees; fails on paths containing "bad".
    struct RecordingExtractor {
        seen: Mutex<Vec<PathBuf>>,
    }

    impl AcousticExtractor for RecordingExtractor {
        fn extract(&self, wav_path: &Path) -> Result<()> {
            self.seen.lock().unwrap().push(wav_path.to_path_buf());
            if wav_path.to_string_lossy().contains("bad") {
                return Err(Error::Extract("converter rejected the file".into()));
            }
            Ok(())
        }
    }

    struct SlowExtractor;

    impl AcousticExtractor for SlowExtractor {
        fn extract(&self, _wav_path: &Path) -> Result<()> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        }
    }

    #[tokio::test]
    async fn every_file_gets_an_outcome() {
        let extractor = Arc::new(RecordingExtractor {
            seen: Mutex::new(Vec::new()),
        });
        let paths: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("utt_{i}.wav"))).collect();

        let outcomes = BulkExtractor::default()
            .run(extractor.clone(), paths.clone())
            .await;

        assert_eq!(outcomes.len(), 20);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(extractor.seen.lock().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn failures_are_collected_not_propagated() {
        let extractor = Arc::new(RecordingExtractor {
            seen: Mutex::new(Vec::new()),
        });
        let paths = vec![
            PathBuf::from("utt_good.wav"),
            PathBuf::from("utt_bad.wav"),
            PathBuf::from("utt_fine.wav"),
        ];

        let outcomes = BulkExtractor::default().run(extractor, paths).await;

        assert_eq!(outcomes.len(), 3);
        let failed: Vec<_> = outcomes.iter().filter(|o| o.result.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].wav_path, PathBuf::from("utt_bad.wav"));
    }

    #[tokio::test]
    async fn deadline_fails_the_file_not_the_run() {
        let bulk = BulkExtractor {
            workers: 2,
            deadline: Duration::from_millis(50),
        };
        let outcomes = bulk
            .run(Arc::new(SlowExtractor), vec![PathBuf::from("utt.wav")])
            .await;

        assert_eq!(outcomes.len(), 1);
        let err = outcomes[0].result.as_ref().unwrap_err();
        assert!(matches!(err, Error::Extract(_)), "got {err:?}");
        assert!(err.to_string().contains("deadline"), "got {err}");
    }

    #[cfg(unix)]
    #[test]
    fn command_extractor_reports_exit_status() {
        let ok = CommandExtractor::new("true");
        assert!(ok.extract(Path::new("utt.wav")).is_ok());

        let failing = CommandExtractor::new("false");
        let err = failing.extract(Path::new("utt.wav")).unwrap_err();
        assert!(matches!(err, Error::Extract(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_input_finishes_immediately() {
        let extractor = Arc::new(RecordingExtractor {
            seen: Mutex::new(Vec::new()),
        });
        let outcomes = BulkExtractor::default().run(extractor, Vec::new()).await;
        assert!(outcomes.is_empty());
    }
}
