//! Authoritative storage for job and worker records.
//!
//! The [`Store`] trait is the seam between the scheduler and whatever keeps
//! the records. [`MemoryStore`] is the only backend shipped; a durable
//! backend would surface its faults as
//! [`SchedulerError::StoreFailure`](crate::error::SchedulerError::StoreFailure).
//!
//! Every read returns an owned copy. A caller mutating its copy changes
//! nothing until it hands the record back through `update_*`.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::scheduler::Job;
use crate::worker::Worker;

pub use memory::MemoryStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a job, silently replacing any record with the same id.
    async fn save_job(&self, job: Job) -> Result<()>;

    async fn get_job(&self, id: &str) -> Result<Job>;

    /// Replace an existing job. Fails if no job with that id was saved.
    async fn update_job(&self, job: Job) -> Result<()>;

    /// Snapshot of every job, in no particular order.
    async fn get_all_jobs(&self) -> Result<Vec<Job>>;

    /// Insert a worker, silently replacing any record with the same id.
    async fn save_worker(&self, worker: Worker) -> Result<()>;

    async fn get_worker(&self, id: &str) -> Result<Worker>;

    /// Replace an existing worker. Fails if no worker with that id was saved.
    async fn update_worker(&self, worker: Worker) -> Result<()>;

    /// Snapshot of the workers whose status is `active`, in no particular order.
    async fn get_available_workers(&self) -> Result<Vec<Worker>>;

    /// Snapshot of every worker regardless of status.
    async fn get_all_workers(&self) -> Result<Vec<Worker>>;
}
