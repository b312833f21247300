use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::scheduler::assigner::JobAssigner;
use crate::scheduler::job::{Job, JobStatus};
use crate::scheduler::queue::JobQueue;
use crate::store::Store;
use crate::worker::{ExecutionResult, JobExecutor, Worker, WorkerStatus};

/// What happened to a job handed to [`Scheduler::schedule_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// The job is running on this worker.
    Assigned { worker_id: String },
    /// No worker could take it; the job went back to the head of the queue.
    Deferred,
}

/// Binds pending jobs to active workers.
///
/// The assigner (worker slots and round-robin position) sits behind one lock.
/// Worker registration, assignment decisions and slot releases are serialized
/// through it. The store and queue have their own locks; no operation holds
/// more than the assigner lock across store calls.
pub struct Scheduler {
    store: Arc<dyn Store>,
    queue: Arc<JobQueue>,
    executor: Arc<dyn JobExecutor>,
    assigner: Mutex<JobAssigner>,
    worker_available: Notify,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn Store>,
        queue: Arc<JobQueue>,
        executor: Arc<dyn JobExecutor>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            queue,
            executor,
            assigner: Mutex::new(JobAssigner::new()),
            worker_available: Notify::new(),
            config,
        }
    }

    /// Track a worker for assignment and persist it.
    pub async fn register_worker(&self, worker: Worker) -> Result<Worker> {
        {
            let mut assigner = self.assigner.lock().await;
            assigner.register_worker(&worker);
            self.store.save_worker(worker.clone()).await?;
        }

        tracing::info!(
            worker_id = %worker.id,
            name = %worker.name,
            cpu_cores = worker.resources.cpu_cores,
            memory_mb = worker.resources.memory_mb,
            "Worker registered"
        );
        self.worker_available.notify_waiters();
        Ok(worker)
    }

    /// Try to put `job` on a worker.
    ///
    /// On success the job is persisted as `running` and a completion task is
    /// spawned. When no worker is eligible the job is put back at the head of
    /// the queue. A store failure is returned as is; the job keeps whatever
    /// state it last reached.
    pub async fn schedule_job(self: &Arc<Self>, mut job: Job) -> Result<Assignment> {
        let mut assigner = self.assigner.lock().await;

        let available = self.store.get_available_workers().await?;
        let Some(worker) = assigner.select_worker(&available) else {
            drop(assigner);
            tracing::debug!(job_id = %job.id, "No worker available, job requeued");
            self.queue.requeue_front(job.id);
            return Ok(Assignment::Deferred);
        };

        job.mark_running(&worker.id);
        self.store.update_job(job.clone()).await?;

        if assigner.reserve(&worker.id, &job.id) {
            self.set_worker_status(&worker.id, WorkerStatus::Active, WorkerStatus::Busy)
                .await;
        }
        drop(assigner);

        tracing::info!(job_id = %job.id, worker_id = %worker.id, "Job assigned");

        let worker_id = worker.id.clone();
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.run_to_completion(job, worker).await;
        });

        Ok(Assignment::Assigned { worker_id })
    }

    /// Spawn the assignment loop. It runs until `shutdown` is cancelled.
    pub fn start(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run(shutdown).await })
    }

    async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut backoff = self.config.retry_backoff_min();
        tracing::info!("Scheduler loop started");

        loop {
            let job_id = tokio::select! {
                _ = shutdown.cancelled() => break,
                job_id = self.queue.dequeue_wait() => job_id,
            };

            let job = match self.store.get_job(&job_id).await {
                Ok(job) => job,
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Queued job could not be loaded");
                    continue;
                }
            };
            if job.status != JobStatus::Pending {
                tracing::debug!(job_id = %job_id, status = %job.status, "Skipping job that is no longer pending");
                continue;
            }

            // Armed before scheduling so a worker freed mid-attempt still wakes us.
            let worker_available = self.worker_available.notified();
            tokio::pin!(worker_available);

            match self.schedule_job(job).await {
                Ok(Assignment::Assigned { .. }) => {
                    backoff = self.config.retry_backoff_min();
                }
                Ok(Assignment::Deferred) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = &mut worker_available => {}
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = self.config.next_backoff(backoff);
                }
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Failed to schedule job");
                }
            }
        }

        tracing::info!("Scheduler loop stopped");
    }

    async fn run_to_completion(&self, job: Job, worker: Worker) {
        let result = self.executor.execute(&job, &worker).await;

        match self.record_result(&result).await {
            Ok(()) => tracing::info!(
                job_id = %result.job_id,
                worker_id = %result.worker_id,
                status = %result.status,
                "Job finished"
            ),
            Err(e) => tracing::warn!(
                job_id = %result.job_id,
                error = %e,
                "Failed to record job result"
            ),
        }

        self.release_slot(&worker.id, &job.id).await;
    }

    async fn record_result(&self, result: &ExecutionResult) -> Result<()> {
        let mut job = self.store.get_job(&result.job_id).await?;
        job.finish(result.status, result.error.clone());
        self.store.update_job(job).await
    }

    async fn release_slot(&self, worker_id: &str, job_id: &str) {
        {
            let mut assigner = self.assigner.lock().await;
            if assigner.release(worker_id, job_id) {
                self.set_worker_status(worker_id, WorkerStatus::Busy, WorkerStatus::Active)
                    .await;
            }
        }
        self.worker_available.notify_waiters();
    }

    /// Move a worker from `from` to `to`, leaving any other status alone.
    async fn set_worker_status(&self, worker_id: &str, from: WorkerStatus, to: WorkerStatus) {
        let outcome = match self.store.get_worker(worker_id).await {
            Ok(mut worker) if worker.status == from => {
                worker.status = to;
                self.store.update_worker(worker).await
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            tracing::warn!(worker_id, status = %to, error = %e, "Failed to update worker status");
        }
    }

    /// Refresh a worker's heartbeat, bringing it back online if it had been evicted.
    pub async fn heartbeat(&self, worker_id: &str) -> Result<Worker> {
        let assigner = self.assigner.lock().await;
        let mut worker = self.store.get_worker(worker_id).await?;
        worker.update_heartbeat();

        let revived = worker.status == WorkerStatus::Offline;
        if revived {
            worker.status = if assigner.is_saturated(worker_id) {
                WorkerStatus::Busy
            } else {
                WorkerStatus::Active
            };
        }
        self.store.update_worker(worker.clone()).await?;
        drop(assigner);

        if revived {
            tracing::info!(worker_id, status = %worker.status, "Worker back online");
            self.worker_available.notify_waiters();
        }
        Ok(worker)
    }

    /// Mark every worker whose heartbeat is older than `timeout` as offline.
    /// Returns the ids of the workers taken offline.
    pub async fn evict_stale_workers(&self, timeout: std::time::Duration) -> Result<Vec<String>> {
        let _assigner = self.assigner.lock().await;
        let now = Utc::now();
        let mut evicted = Vec::new();

        for mut worker in self.store.get_all_workers().await? {
            if worker.status == WorkerStatus::Offline || worker.is_alive(timeout, now) {
                continue;
            }
            worker.status = WorkerStatus::Offline;
            let worker_id = worker.id.clone();
            self.store.update_worker(worker).await?;
            tracing::warn!(worker_id = %worker_id, "Worker heartbeat expired, marked offline");
            evicted.push(worker_id);
        }

        Ok(evicted)
    }

    /// Number of jobs currently occupying slots on `worker_id`.
    pub async fn running_jobs(&self, worker_id: &str) -> usize {
        self.assigner.lock().await.running_jobs(worker_id)
    }
}
