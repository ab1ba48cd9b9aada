//! Run the whole batch against the scripted mock service.
//!
//! No API key and no network needed; handy for seeing the pipeline's
//! console output and the files it writes.
//!
//! `cargo run --example mock_run`

use std::time::Duration;

use wanx_gen::mock::MockService;
use wanx_gen::{pipeline, GenConfig, JobStatus, PollOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let service = MockService::new()
        .with_task_id("demo-task")
        .with_statuses(vec![
            JobStatus::Pending,
            JobStatus::Succeeded {
                url: "https://example/demo.png".into(),
            },
        ]);

    let mut config = GenConfig::default();
    config.output_dir = "target/demo/funcs".into();
    config.hero_output_dir = "target/demo/hero".into();
    config.poll = PollOptions::default()
        .attempts(5)
        .interval(Duration::from_millis(50));

    let summary = pipeline::run_batch(&service, &config).await?;
    println!(
        "mock batch finished: {}/{} succeeded",
        summary.succeeded, summary.total
    );
    Ok(())
}
