//! Scripted stand-in for the remote service
//!
//! `MockService` lets the pipeline run end-to-end with no API key and no
//! network: submissions hand out a fixed task id, polls replay a scripted
//! status sequence, downloads return canned bytes. Call counters expose
//! exactly how many requests each stage issued, which is what the polling
//! and short-circuit tests assert on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{GenError, Result};
use crate::types::{JobHandle, JobSpec, JobStatus};
use crate::ImageTaskService;

/// In-memory [`ImageTaskService`] with scripted responses.
///
/// # Example
/// ```
/// use wanx_gen::mock::MockService;
/// use wanx_gen::JobStatus;
///
/// let service = MockService::new()
///     .with_task_id("T1")
///     .with_statuses(vec![
///         JobStatus::Pending,
///         JobStatus::Succeeded { url: "https://example/img.png".into() },
///     ])
///     .with_artifact(vec![0x89, b'P', b'N', b'G']);
/// ```
pub struct MockService {
    task_id: String,
    submit_failure: Option<(u16, String)>,
    statuses: Mutex<StatusScript>,
    artifact: Vec<u8>,
    download_failure: Option<(u16, String)>,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

struct StatusScript {
    statuses: Vec<JobStatus>,
    next: usize,
}

impl StatusScript {
    /// Replay the script in order; once exhausted, keep returning the
    /// final entry so a terminal task stays terminal across extra polls.
    fn advance(&mut self) -> JobStatus {
        if self.statuses.is_empty() {
            return JobStatus::Pending;
        }
        let idx = self.next.min(self.statuses.len() - 1);
        self.next += 1;
        self.statuses[idx].clone()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockService {
    pub fn new() -> Self {
        Self {
            task_id: "mock-task-1".to_string(),
            submit_failure: None,
            statuses: Mutex::new(StatusScript {
                statuses: Vec::new(),
                next: 0,
            }),
            artifact: vec![0x89, b'P', b'N', b'G'],
            download_failure: None,
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    /// Set the task id handed out on submission.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    /// Script the status sequence returned by successive polls.
    pub fn with_statuses(self, statuses: Vec<JobStatus>) -> Self {
        *self.statuses.lock().unwrap() = StatusScript { statuses, next: 0 };
        self
    }

    /// Set the bytes served for artifact downloads.
    pub fn with_artifact(mut self, bytes: Vec<u8>) -> Self {
        self.artifact = bytes;
        self
    }

    /// Make every submission fail with the given HTTP status and body.
    pub fn fail_submission(mut self, status: u16, body: impl Into<String>) -> Self {
        self.submit_failure = Some((status, body.into()));
        self
    }

    /// Make every download fail with the given HTTP status and body.
    pub fn fail_download(mut self, status: u16, body: impl Into<String>) -> Self {
        self.download_failure = Some((status, body.into()));
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::Relaxed)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::Relaxed)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::Relaxed)
    }
}

impl ImageTaskService for MockService {
    async fn submit(&self, _spec: &JobSpec) -> Result<JobHandle> {
        self.submit_calls.fetch_add(1, Ordering::Relaxed);
        if let Some((status, body)) = &self.submit_failure {
            return Err(GenError::Submission {
                status: *status,
                body: body.clone(),
            });
        }
        Ok(JobHandle {
            task_id: self.task_id.clone(),
        })
    }

    async fn poll_status(&self, _handle: &JobHandle) -> Result<JobStatus> {
        self.poll_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.statuses.lock().unwrap().advance())
    }

    async fn fetch_artifact(&self, _url: &str) -> Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::Relaxed);
        if let Some((status, body)) = &self.download_failure {
            return Err(GenError::Download {
                status: *status,
                body: body.clone(),
            });
        }
        Ok(self.artifact.clone())
    }
}
