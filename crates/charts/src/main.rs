//! Reporting job CLI.
//!
//! Loads the training dataset and model artifacts when present, otherwise
//! falls back to a reproducible synthetic dataset and model, then renders
//! the four report charts.

use anyhow::{Context, Result};
use clap::Parser;
use mathperf_charts::render::render_all;
use mathperf_charts::synthetic::{synthesize_dataset, synthesize_model, DEFAULT_SEED};
use mathperf_charts::StudentDataset;
use mathperf_model::artifacts::{DEFAULT_ENCODERS_PATH, DEFAULT_MODEL_PATH};
use mathperf_model::Artifacts;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mathperf-charts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Render dataset and model report charts", long_about = None)]
struct Args {
    /// Training dataset CSV path
    #[arg(short, long, default_value = "dataset_mahasiswa.csv")]
    dataset: PathBuf,

    /// Model artifact path
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Encoder-set artifact path
    #[arg(long, default_value = DEFAULT_ENCODERS_PATH)]
    encoders: PathBuf,

    /// Output directory for the chart images
    #[arg(short, long, default_value = "static")]
    out_dir: PathBuf,

    /// Seed for the synthetic fallback
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Sample count for the synthetic fallback
    #[arg(long, default_value_t = 1000)]
    samples: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let (dataset, artifacts) = if args.dataset.exists() {
        let dataset = StudentDataset::from_csv(&args.dataset)
            .with_context(|| format!("failed to load dataset {}", args.dataset.display()))?;
        let artifacts = Artifacts::load(&args.model, &args.encoders)
            .context("failed to load model artifacts")?;
        (dataset, artifacts)
    } else {
        warn!(
            "dataset {} not found, synthesizing {} rows (seed {})",
            args.dataset.display(),
            args.samples,
            args.seed
        );
        let dataset = synthesize_dataset(args.seed, args.samples);
        let artifacts =
            synthesize_model(&dataset).context("failed to fit the synthetic model")?;
        (dataset, artifacts)
    };

    render_all(&dataset, &artifacts.model, &args.out_dir)
        .context("failed to render charts")?;

    info!(
        "all charts written to {} ({} rows)",
        args.out_dir.display(),
        dataset.len()
    );
    Ok(())
}
