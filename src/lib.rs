//! # wanx-gen
//!
//! Async Rust client and batch pipeline for DashScope (Tongyi Wanxiang)
//! text-to-image generation.
//!
//! The service is asynchronous: a creation request returns an opaque task
//! id, the task is polled until it reaches a terminal state, and the
//! finished image is downloaded from the URL the status endpoint reports.
//! This crate wraps that submit → poll → download flow behind a typed
//! client plus a batch runner that writes each artifact to disk, isolating
//! per-job failures so one rejected prompt never sinks the rest.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wanx_gen::{pipeline, JobSpec, PollOptions, WanxClient};
//! use std::path::Path;
//!
//! # async fn example() -> wanx_gen::Result<()> {
//! let client = WanxClient::from_env()?;
//! let spec = JobSpec::new("discover", "a city skyline, flat illustration")
//!     .negative("blurry, low quality, watermark");
//!
//! let artifact =
//!     pipeline::run_pipeline(&client, &spec, &PollOptions::default(), Path::new("public/funcs"))
//!         .await?;
//! println!("saved {} bytes to {}", artifact.bytes.len(), artifact.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! Batch runs come preconfigured with the landing page's feature and hero
//! prompts; see [`GenConfig`] and [`pipeline::run_batch`].

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod pipeline;
pub mod types;

pub use client::WanxClient;
pub use config::GenConfig;
pub use error::{GenError, Result};
pub use types::{Artifact, BatchSummary, JobFailure, JobHandle, JobSpec, JobStatus, PollOptions};

/// Trait over the remote generation service.
///
/// The pipeline and batch runner are generic over this seam so the real
/// HTTP client ([`WanxClient`]) and the scripted [`mock::MockService`]
/// are interchangeable.
pub trait ImageTaskService: Send + Sync {
    /// Submit a generation request; returns the service-assigned handle.
    fn submit(
        &self,
        spec: &JobSpec,
    ) -> impl std::future::Future<Output = Result<JobHandle>> + Send;

    /// Issue one status check for a submitted task.
    fn poll_status(
        &self,
        handle: &JobHandle,
    ) -> impl std::future::Future<Output = Result<JobStatus>> + Send;

    /// Download the artifact bytes at `url`. Single attempt, no retries.
    fn fetch_artifact(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}
