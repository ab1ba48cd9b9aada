use thiserror::Error;

/// Errors returned by generation operations.
#[derive(Error, Debug)]
pub enum GenError {
    /// No credential configured. Checked before any network call.
    #[error("no API key configured \u{2014} set DASHSCOPE_API_KEY or QWEN_API_KEY")]
    MissingApiKey,

    /// Task creation returned a non-success HTTP status.
    #[error("task creation failed with HTTP {status}: {body}")]
    Submission { status: u16, body: String },

    /// Status poll returned a non-success HTTP status.
    #[error("status poll failed with HTTP {status}: {body}")]
    Poll { status: u16, body: String },

    /// Artifact download returned a non-success HTTP status.
    #[error("download failed with HTTP {status}: {body}")]
    Download { status: u16, body: String },

    /// The poll budget ran out while the task was still pending.
    #[error("task {task_id} still pending after {attempts} poll attempts")]
    Timeout { task_id: String, attempts: u32 },

    /// The service reported the task as failed.
    #[error("task {task_id} failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    /// The response was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// The caller requested cancellation between polls.
    #[error("generation was cancelled")]
    Cancelled,

    /// A pipeline stage failed, tagged with the job's slug.
    #[error("job '{slug}' failed: {source}")]
    Job {
        slug: String,
        #[source]
        source: Box<GenError>,
    },

    /// The job manifest could not be read or parsed.
    #[error("failed to load job manifest: {0}")]
    Manifest(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error while writing an artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenError {
    /// True for caller-initiated cancellation, including when wrapped in
    /// a per-job [`GenError::Job`] tag.
    pub fn is_cancelled(&self) -> bool {
        match self {
            GenError::Cancelled => true,
            GenError::Job { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GenError>;
