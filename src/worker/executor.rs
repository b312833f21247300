use std::time::Duration;

use async_trait::async_trait;

use crate::scheduler::{Job, JobId, JobStatus};
use crate::worker::{Worker, WorkerId};

/// Outcome of running one job on one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub job_id: JobId,
    pub worker_id: WorkerId,
    pub status: JobStatus,
    pub error: Option<String>,
}

/// Hands a job to a worker and waits for it to finish.
///
/// The scheduler only sees this trait, so a real transport to remote workers
/// can replace [`SimulatedExecutor`] without touching assignment.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job, worker: &Worker) -> ExecutionResult;
}

/// Pretends to run every job: waits a fixed duration, then reports success.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    duration: Duration,
}

impl SimulatedExecutor {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[async_trait]
impl JobExecutor for SimulatedExecutor {
    async fn execute(&self, job: &Job, worker: &Worker) -> ExecutionResult {
        tracing::debug!(
            job_id = %job.id,
            worker_id = %worker.id,
            command = %job.command,
            duration_ms = self.duration.as_millis() as u64,
            "Simulating job execution"
        );

        tokio::time::sleep(self.duration).await;

        ExecutionResult {
            job_id: job.id.clone(),
            worker_id: worker.id.clone(),
            status: JobStatus::Completed,
            error: None,
        }
    }
}
