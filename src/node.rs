use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::config::NodeConfig;
use crate::error::Result;
use crate::scheduler::{Job, JobQueue, Scheduler};
use crate::store::{MemoryStore, Store};
use crate::worker::{JobExecutor, LivenessMonitor, SimulatedExecutor, Worker};

/// Wires the store, queue and scheduler together and exposes the operations
/// the request layer calls.
pub struct Node {
    pub config: NodeConfig,
    pub store: Arc<dyn Store>,
    pub queue: Arc<JobQueue>,
    pub scheduler: Arc<Scheduler>,
}

impl Node {
    /// A node backed by the in-memory store and the simulated executor.
    pub fn new(config: NodeConfig) -> Self {
        let executor = Arc::new(SimulatedExecutor::new(config.scheduler.execution_duration()));
        Self::with_parts(config, Arc::new(MemoryStore::new()), executor)
    }

    pub fn with_parts(
        config: NodeConfig,
        store: Arc<dyn Store>,
        executor: Arc<dyn JobExecutor>,
    ) -> Self {
        let queue = Arc::new(JobQueue::new());
        let scheduler = Arc::new(Scheduler::new(
            store.clone(),
            queue.clone(),
            executor,
            config.scheduler.clone(),
        ));

        Self {
            config,
            store,
            queue,
            scheduler,
        }
    }

    /// Persist a new pending job and queue it for assignment.
    pub async fn submit_job(
        &self,
        name: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> Result<Job> {
        let job = Job::new(name, command, args);
        self.store.save_job(job.clone()).await?;
        self.queue.enqueue(job.id.clone());
        tracing::info!(job_id = %job.id, name = %job.name, "Job submitted");
        Ok(job)
    }

    pub async fn get_job(&self, id: &str) -> Result<Job> {
        self.store.get_job(id).await
    }

    /// All jobs, oldest submission first.
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs = self.store.get_all_jobs().await?;
        jobs.sort_by(|a, b| a.submit_time.cmp(&b.submit_time).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    pub async fn register_worker(
        &self,
        name: impl Into<String>,
        cpu_cores: u32,
        memory_mb: u64,
    ) -> Result<Worker> {
        self.scheduler
            .register_worker(Worker::new(name, cpu_cores, memory_mb))
            .await
    }

    /// Workers currently accepting jobs, ordered by id.
    pub async fn list_workers(&self) -> Result<Vec<Worker>> {
        let mut workers = self.store.get_available_workers().await?;
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(workers)
    }

    pub async fn worker_heartbeat(&self, worker_id: &str) -> Result<Worker> {
        self.scheduler.heartbeat(worker_id).await
    }

    /// Spawn the background tasks: the assignment loop and, when a worker
    /// timeout is configured, the liveness monitor.
    pub fn start(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = vec![self.scheduler.start(shutdown.clone())];

        if let Some(timeout_ms) = self.config.scheduler.worker_timeout_ms {
            let monitor =
                LivenessMonitor::new(self.config.scheduler.liveness_check_interval_ms, timeout_ms);
            let scheduler = self.scheduler.clone();
            handles.push(tokio::spawn(async move {
                monitor.run(scheduler, shutdown).await;
            }));
        }

        handles
    }

    /// Start the background tasks and serve the HTTP API until `shutdown`.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> std::io::Result<()> {
        let handles = self.start(shutdown.clone());
        let listen_addr = self.config.listen_addr;

        api::serve(listen_addr, self, shutdown).await?;

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }
        Ok(())
    }
}
