use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

fn default_size() -> String {
    "1280*720".to_string()
}

/// A single image-generation request.
///
/// The `slug` is a caller-defined label; the output file name is derived
/// from it (`<slug>.png`). `size` uses the service's `width*height` syntax.
///
/// # Example
/// ```
/// use wanx_gen::JobSpec;
///
/// let spec = JobSpec::new("discover", "a city skyline at dusk")
///     .negative("blurry, low quality")
///     .size("1024*1024");
///
/// assert_eq!(spec.file_name(), "discover.png");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub slug: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default = "default_size")]
    pub size: String,
}

impl JobSpec {
    /// Create a spec with the default output size (1280*720).
    pub fn new(slug: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            prompt: prompt.into(),
            negative_prompt: None,
            size: default_size(),
        }
    }

    /// Set the negative prompt.
    pub fn negative(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(prompt.into());
        self
    }

    /// Set the output size (service syntax, e.g. "1280*720").
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Output file name for this job's artifact.
    pub fn file_name(&self) -> String {
        format!("{}.png", self.slug)
    }
}

/// Handle to a submitted task. Only exists after the service returned a
/// non-empty task id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub task_id: String,
}

/// Classification of one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Still queued or running on the service side.
    Pending,
    /// Finished; the artifact is retrievable at `url`.
    Succeeded { url: String },
    /// The service reported a failure.
    Failed { reason: String },
}

impl JobStatus {
    /// Terminal statuses end the polling loop; no transition follows them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Downloaded artifact bytes plus the path they were written to.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub path: PathBuf,
}

/// Bounds for the polling loop.
///
/// Fixed interval, no backoff. A zero interval skips sleeping entirely,
/// which is how tests run the loop without wall-clock waits. The optional
/// `cancel` flag is checked before every poll.
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub interval: Duration,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(2),
            cancel: None,
        }
    }
}

impl PollOptions {
    /// Set the maximum number of poll attempts.
    pub fn attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay between poll attempts.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Attach a cancellation flag checked between polls.
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// One failed job within a batch run.
#[derive(Debug, Clone)]
pub struct JobFailure {
    pub slug: String,
    pub message: String,
}

/// Outcome of a batch run. A batch of N jobs may yield fewer than N
/// artifacts; failures are recorded here rather than aborting the run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<JobFailure>,
}
