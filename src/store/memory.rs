use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{RecordKind, Result, SchedulerError};
use crate::scheduler::Job;
use crate::store::Store;
use crate::worker::{Worker, WorkerStatus};

#[derive(Debug, Default)]
struct StoreInner {
    jobs: HashMap<String, Job>,
    workers: HashMap<String, Worker>,
}

/// In-memory store. Readers share the lock; any write excludes everyone.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_job(&self, job: Job) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Job> {
        let inner = self.inner.read().await;
        inner
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))
    }

    async fn update_job(&self, job: Job) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.jobs.get_mut(&job.id) {
            Some(existing) => {
                *existing = job;
                Ok(())
            }
            None => Err(SchedulerError::ConflictOnUpdate {
                kind: RecordKind::Job,
                id: job.id,
            }),
        }
    }

    async fn get_all_jobs(&self) -> Result<Vec<Job>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.values().cloned().collect())
    }

    async fn save_worker(&self, worker: Worker) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.workers.insert(worker.id.clone(), worker);
        Ok(())
    }

    async fn get_worker(&self, id: &str) -> Result<Worker> {
        let inner = self.inner.read().await;
        inner
            .workers
            .get(id)
            .cloned()
            .ok_or_else(|| SchedulerError::WorkerNotFound(id.to_string()))
    }

    async fn update_worker(&self, worker: Worker) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.workers.get_mut(&worker.id) {
            Some(existing) => {
                *existing = worker;
                Ok(())
            }
            None => Err(SchedulerError::ConflictOnUpdate {
                kind: RecordKind::Worker,
                id: worker.id,
            }),
        }
    }

    async fn get_available_workers(&self) -> Result<Vec<Worker>> {
        let inner = self.inner.read().await;
        Ok(inner
            .workers
            .values()
            .filter(|w| w.status == WorkerStatus::Active)
            .cloned()
            .collect())
    }

    async fn get_all_workers(&self) -> Result<Vec<Worker>> {
        let inner = self.inner.read().await;
        Ok(inner.workers.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::JobStatus;

    #[tokio::test]
    async fn save_then_get_returns_copy() {
        let store = MemoryStore::new();
        let job = Job::new("build", "make", vec!["all".to_string()]);
        store.save_job(job.clone()).await.unwrap();

        let mut fetched = store.get_job(&job.id).await.unwrap();
        assert_eq!(fetched, job);

        // Mutating the copy does not touch the stored record
        fetched.status = JobStatus::Failed;
        assert_eq!(
            store.get_job(&job.id).await.unwrap().status,
            JobStatus::Pending
        );
    }

    #[tokio::test]
    async fn get_missing_job_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_job("nope").await.unwrap_err();
        assert!(matches!(err, SchedulerError::JobNotFound(ref id) if id == "nope"));
    }

    #[tokio::test]
    async fn update_requires_existing_record() {
        let store = MemoryStore::new();

        let err = store
            .update_job(Job::new("a", "true", vec![]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(
            err,
            SchedulerError::ConflictOnUpdate {
                kind: RecordKind::Job,
                ..
            }
        ));

        let err = store
            .update_worker(Worker::new("w", 1, 128))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_all_workers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_overwrites_existing_id() {
        let store = MemoryStore::new();
        let mut worker = Worker::new("w1", 2, 1024);
        store.save_worker(worker.clone()).await.unwrap();

        worker.name = "renamed".to_string();
        store.save_worker(worker.clone()).await.unwrap();

        let all = store.get_all_workers().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "renamed");
    }

    #[tokio::test]
    async fn available_workers_excludes_non_active() {
        let store = MemoryStore::new();
        let active = Worker::new("active", 1, 128);
        let mut busy = Worker::new("busy", 1, 128);
        busy.status = WorkerStatus::Busy;
        let mut offline = Worker::new("offline", 1, 128);
        offline.status = WorkerStatus::Offline;

        for w in [active.clone(), busy, offline] {
            store.save_worker(w).await.unwrap();
        }

        let available = store.get_available_workers().await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, active.id);
        assert_eq!(store.get_all_workers().await.unwrap().len(), 3);
    }
}
