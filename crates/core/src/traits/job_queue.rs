//! Scheduled-reminder job queue seam

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobQueueError {
    #[error("failed to enqueue job: {0}")]
    EnqueueFailed(String),
    #[error("job not found: {0}")]
    NotFound(String),
}

/// Long-lived scheduled work, notably payment-collection reminders. A
/// `Reminder` row is inserted first; `enqueue` is called in the same unit
/// of work, and a failure here must flip the row to `Failed` rather than
/// leaving it `Scheduled` with no backing job.
#[async_trait]
pub trait JobQueue: Send + Sync + 'static {
    /// Enqueue a job to fire at `run_at`, returning an opaque job id.
    async fn enqueue(&self, job_name: &str, payload: &str, run_at: DateTime<Utc>) -> Result<String, JobQueueError>;

    /// Cancel a previously enqueued job. Idempotent: cancelling a job that
    /// already fired or doesn't exist is not an error.
    async fn cancel(&self, job_id: &str) -> Result<(), JobQueueError>;
}
