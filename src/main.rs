//! Batch generator for the landing page's feature and hero images.
//!
//! Runs with no arguments: reads the API key from the environment,
//! generates the built-in job set, and writes PNGs under `public/`.
//! Per-job failures are logged and skipped; the process only exits
//! non-zero when the batch itself cannot start.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use wanx_gen::{pipeline, GenConfig, WanxClient};

#[derive(Parser)]
#[command(name = "wanx-gen")]
#[command(about = "Generate landing page images via DashScope text-to-image", version)]
struct Cli {
    /// TOML job manifest (defaults to the built-in feature set)
    #[arg(long)]
    jobs: Option<PathBuf>,

    /// Output directory for feature images
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output directory for the hero image
    #[arg(long)]
    hero_dir: Option<PathBuf>,

    /// Maximum status polls per task
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Delay between status polls, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.jobs {
        Some(path) => GenConfig::from_manifest(path)?,
        None => GenConfig::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(dir) = cli.hero_dir {
        config.hero_output_dir = dir;
    }
    if let Some(attempts) = cli.max_attempts {
        config.poll.max_attempts = attempts;
    }
    if let Some(ms) = cli.interval_ms {
        config.poll.interval = Duration::from_millis(ms);
    }

    let client = WanxClient::from_env()?.with_base_url(config.base_url.as_str());

    let summary = pipeline::run_batch(&client, &config).await?;
    for failure in &summary.failures {
        eprintln!("{}: {}", failure.slug, failure.message);
    }

    Ok(())
}
