//! Corpus preparation CLI.
//!
//! Assembles fixed-grid training examples for a whole corpus or a single
//! utterance. Prints a one-line JSON summary per utterance to stdout:
//!
//! ```json
//! {"utterance":"utt_001","raw_samples":50,"target_samples":32,"target_frames":4,"conditioning_frames":4}
//! ```
//!
//! With `--output`, each assembled example (waveform, quantized symbols,
//! conditioning tensor, speaker vector) is written as `<id>.json` in the
//! given directory. Failures on individual utterances are logged and
//! counted; the exit code is non-zero only when nothing succeeds.

use std::path::PathBuf;

use clap::Parser;
use wavegrid_rs::align::CoverageMode;
use wavegrid_rs::conditioning::speaker::SeedDuration;
use wavegrid_rs::conditioning::vocab::VocabularyTable;
use wavegrid_rs::config::PrepConfig;
use wavegrid_rs::corpus::CorpusIndex;
use wavegrid_rs::pipeline::PrepPipeline;

#[derive(Parser, Debug)]
#[command(
    name = "wavegrid",
    about = "Prepare fixed-grid quantized training examples from a speech corpus",
    long_about = "Aligns raw audio, acoustic parameters and linguistic annotations\n\
                  onto one per-frame grid and quantizes the waveform.\n\
                  Prints one JSON summary line per utterance."
)]
struct Args {
    /// Corpus index JSON file (datasets, speakers, utterances).
    #[arg(long, short = 'i')]
    corpus: PathBuf,

    /// Preparation config JSON. Omit for defaults.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Prepare a single utterance id instead of the whole corpus.
    #[arg(long, short = 'u')]
    utterance: Option<String>,

    /// Cover each utterance fully, padding up to a whole forward step
    /// (inference/evaluation). Default is training-style truncation.
    #[arg(long)]
    full: bool,

    /// Speaker embedding duration variant in seconds (1, 10, 60 or 120).
    #[arg(long, default_value_t = 60)]
    seed_duration: u32,

    /// Write each assembled example as JSON into this directory.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PrepConfig::from_file(path)?,
        None => PrepConfig::default(),
    };
    let seed_duration = SeedDuration::try_from(args.seed_duration)?;
    let mode = if args.full {
        CoverageMode::Full
    } else {
        CoverageMode::Truncate
    };

    let corpus = CorpusIndex::from_file(&args.corpus)?;
    let vocab = VocabularyTable::scan_corpus(&corpus)?;
    let pipeline = PrepPipeline::new(&config, &corpus, &vocab)?;

    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir)?;
    }

    let utterance_ids = match &args.utterance {
        Some(id) => vec![id.clone()],
        None => corpus.utterance_ids(),
    };

    let mut failed = 0usize;
    for utterance_id in &utterance_ids {
        let example = match pipeline.assemble(utterance_id, mode, seed_duration) {
            Ok(example) => example,
            Err(error) => {
                tracing::error!(%error, "skipping utterance");
                failed += 1;
                continue;
            }
        };

        let mut summary = serde_json::json!({
            "utterance": example.utterance_id,
            "raw_samples": example.raw_samples,
            "target_samples": example.target_samples,
            "target_frames": example.target_frames,
            "conditioning_frames": example.conditioning.len(),
        });

        if let Some(dir) = &args.output {
            let path = dir.join(format!("{utterance_id}.json"));
            let quantized = pipeline.quantizer().quantize(&example.waveform);
            let payload = serde_json::json!({
                "example": example,
                "quantized": quantized,
            });
            std::fs::write(&path, serde_json::to_vec(&payload)?)?;
            summary["output"] = serde_json::json!(path);
        }

        println!("{summary}");
    }

    if failed > 0 {
        tracing::warn!(
            failed,
            total = utterance_ids.len(),
            "some utterances were skipped"
        );
    }
    if failed == utterance_ids.len() && !utterance_ids.is_empty() {
        anyhow::bail!("no utterance could be prepared");
    }
    Ok(())
}
