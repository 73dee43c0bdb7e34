//! `qoaseed` - write a corpus of structural QOA files for decoder fuzzing.
//!
//! ```bash
//! # 20 files into the current directory
//! qoaseed
//!
//! # 500 reproducible files, up to 31 channels, into fuzz/corpus/
//! qoaseed --count 500 --seed 1234 --max-channels 31 --out-dir fuzz/corpus/decode
//! ```
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use qoaseed::{CorpusConfig, CorpusGenerator, ParameterRanges, SampleCountMode, DEFAULT_COUNT};

#[derive(Parser)]
#[command(name = "qoaseed")]
#[command(about = "Generate structurally valid QOA files with random content")]
#[command(version)]
struct Cli {
    /// Number of files to generate
    #[arg(short, long, default_value_t = DEFAULT_COUNT)]
    count: usize,

    /// Directory to write the files to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Seed for the random generator (drawn from the OS when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Highest channel count to draw; 32 and above overflow the frame size
    /// and are skipped
    #[arg(long, default_value_t = 8)]
    max_channels: u8,

    /// Declare the samples actually left in each frame instead of repeating
    /// the first frame's count
    #[arg(long)]
    exact_sample_counts: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let ranges = ParameterRanges::with_max_channels(cli.max_channels)
        .context("invalid --max-channels")?;
    let mode = if cli.exact_sample_counts {
        SampleCountMode::Exact
    } else {
        SampleCountMode::Reference
    };
    let seed = cli.seed.unwrap_or_else(rand::random);
    tracing::info!("Using seed {}", seed);

    let config = CorpusConfig {
        count: cli.count,
        out_dir: cli.out_dir,
        ranges,
        mode,
    };
    let out_dir = config.out_dir.clone();
    let report = CorpusGenerator::seeded(config, seed)
        .generate()
        .with_context(|| format!("failed to generate corpus in {}", out_dir.display()))?;

    tracing::info!(
        "Wrote {} files to {} ({} skipped)",
        report.written.len(),
        out_dir.display(),
        report.skipped.len()
    );
    Ok(())
}
