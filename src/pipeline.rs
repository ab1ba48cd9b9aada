//! Submit → poll → download pipeline and the sequential batch runner.
//!
//! Jobs in a batch run strictly one after another. Per-job failures are
//! caught at the iteration boundary so one rejected prompt never aborts
//! the rest of the batch.

use std::path::Path;
use std::sync::atomic::Ordering;

use crate::config::GenConfig;
use crate::error::{GenError, Result};
use crate::types::{Artifact, BatchSummary, JobFailure, JobHandle, JobSpec, JobStatus, PollOptions};
use crate::ImageTaskService;

/// Poll until the task reaches a terminal status or the budget runs out.
///
/// Issues at most `opts.max_attempts` polls with a fixed `opts.interval`
/// between them (no backoff). Returns the first terminal status observed.
/// With `max_attempts == 0` this fails immediately without issuing a
/// single poll. The cancellation flag, when present, is checked before
/// every poll.
pub async fn await_completion<S: ImageTaskService>(
    service: &S,
    handle: &JobHandle,
    opts: &PollOptions,
) -> Result<JobStatus> {
    for attempt in 0..opts.max_attempts {
        if let Some(cancel) = &opts.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(GenError::Cancelled);
            }
        }
        if attempt > 0 && !opts.interval.is_zero() {
            tokio::time::sleep(opts.interval).await;
        }

        let status = service.poll_status(handle).await?;
        if status.is_terminal() {
            return Ok(status);
        }
    }

    Err(GenError::Timeout {
        task_id: handle.task_id.clone(),
        attempts: opts.max_attempts,
    })
}

/// Run one job end to end: submit, await completion, download, write
/// `<output_dir>/<slug>.png` (creating the directory if absent).
///
/// Any stage failure short-circuits the remaining stages; the error is
/// wrapped in [`GenError::Job`] carrying the spec's slug so batch callers
/// can attribute it.
pub async fn run_pipeline<S: ImageTaskService>(
    service: &S,
    spec: &JobSpec,
    opts: &PollOptions,
    output_dir: &Path,
) -> Result<Artifact> {
    run_job(service, spec, opts, output_dir)
        .await
        .map_err(|e| GenError::Job {
            slug: spec.slug.clone(),
            source: Box::new(e),
        })
}

async fn run_job<S: ImageTaskService>(
    service: &S,
    spec: &JobSpec,
    opts: &PollOptions,
    output_dir: &Path,
) -> Result<Artifact> {
    let handle = service.submit(spec).await?;
    println!("  task created: {}", handle.task_id);

    let url = match await_completion(service, &handle, opts).await? {
        JobStatus::Succeeded { url } => url,
        JobStatus::Failed { reason } => {
            return Err(GenError::TaskFailed {
                task_id: handle.task_id,
                reason,
            })
        }
        JobStatus::Pending => {
            return Err(GenError::Timeout {
                task_id: handle.task_id,
                attempts: opts.max_attempts,
            })
        }
    };
    println!("  image ready: {}", url);

    let bytes = service.fetch_artifact(&url).await?;
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(spec.file_name());
    std::fs::write(&path, &bytes)?;
    println!("  saved to {}", path.display());

    Ok(Artifact { bytes, path })
}

/// Process every job in the config sequentially: features into
/// `output_dir`, then the optional hero into `hero_output_dir`.
///
/// Per-job errors are logged with the job's slug and recorded in the
/// summary; later jobs still run. Cancellation is the exception: it
/// aborts the batch and propagates to the caller.
pub async fn run_batch<S: ImageTaskService>(
    service: &S,
    config: &GenConfig,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for spec in &config.jobs {
        process_one(service, spec, &config.poll, &config.output_dir, &mut summary).await?;
    }
    if let Some(hero) = &config.hero {
        process_one(
            service,
            hero,
            &config.poll,
            &config.hero_output_dir,
            &mut summary,
        )
        .await?;
    }

    println!(
        "\ndone: {}/{} succeeded, {} failed",
        summary.succeeded, summary.total, summary.failed
    );
    Ok(summary)
}

async fn process_one<S: ImageTaskService>(
    service: &S,
    spec: &JobSpec,
    opts: &PollOptions,
    output_dir: &Path,
    summary: &mut BatchSummary,
) -> Result<()> {
    summary.total += 1;
    println!("\n\u{25b6} generating {}...", spec.slug);

    match run_pipeline(service, spec, opts, output_dir).await {
        Ok(_) => summary.succeeded += 1,
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => {
            eprintln!("  failed for {}: {}", spec.slug, e);
            summary.failed += 1;
            summary.failures.push(JobFailure {
                slug: spec.slug.clone(),
                message: e.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockService;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    fn handle() -> JobHandle {
        JobHandle {
            task_id: "T1".into(),
        }
    }

    fn fast(max_attempts: u32) -> PollOptions {
        PollOptions::default()
            .attempts(max_attempts)
            .interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_zero_attempts_times_out_without_polling() {
        let service = MockService::new();
        let err = await_completion(&service, &handle(), &fast(0))
            .await
            .unwrap_err();
        assert!(matches!(err, GenError::Timeout { attempts: 0, .. }));
        assert_eq!(service.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_checked_before_first_poll() {
        let cancel = Arc::new(AtomicBool::new(true));
        let service = MockService::new();
        let opts = fast(5).with_cancellation(cancel);

        let err = await_completion(&service, &handle(), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, GenError::Cancelled));
        assert_eq!(service.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_returns_on_first_terminal_status() {
        let service = MockService::new().with_statuses(vec![
            JobStatus::Pending,
            JobStatus::Failed {
                reason: "bad prompt".into(),
            },
        ]);
        let status = await_completion(&service, &handle(), &fast(10))
            .await
            .unwrap();
        assert_eq!(
            status,
            JobStatus::Failed {
                reason: "bad prompt".into()
            }
        );
        // Stopped at the terminal status, well under the budget.
        assert_eq!(service.poll_calls(), 2);
    }
}
