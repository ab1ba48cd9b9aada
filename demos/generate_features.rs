//! Generate the landing page's feature and hero images.
//!
//! Requires a real credential:
//! `DASHSCOPE_API_KEY=sk-... cargo run --example generate_features`

use wanx_gen::{pipeline, GenConfig, WanxClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GenConfig::default();
    let client = WanxClient::from_env()?;

    println!(
        "generating {} feature images + hero into {} and {}",
        config.jobs.len(),
        config.output_dir.display(),
        config.hero_output_dir.display()
    );

    let summary = pipeline::run_batch(&client, &config).await?;
    println!(
        "finished: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    );
    Ok(())
}
