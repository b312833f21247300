use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::scheduler::job::JobId;

/// FIFO of job ids waiting for a worker.
///
/// The queue only holds ids; the store owns the job records. All operations
/// take the same lock, and every insertion wakes one task parked in
/// [`JobQueue::dequeue_wait`].
#[derive(Debug, Default)]
pub struct JobQueue {
    entries: Mutex<VecDeque<JobId>>,
    notify: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<JobId>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a job to the tail. No deduplication and no bound.
    pub fn enqueue(&self, job_id: JobId) {
        self.entries().push_back(job_id);
        self.notify.notify_one();
    }

    /// Put a job back at the head so it keeps its place in line.
    pub fn requeue_front(&self, job_id: JobId) {
        self.entries().push_front(job_id);
        self.notify.notify_one();
    }

    /// Remove and return the head, or `None` when empty.
    pub fn dequeue(&self) -> Option<JobId> {
        self.entries().pop_front()
    }

    /// Return the head without removing it.
    pub fn peek(&self) -> Option<JobId> {
        self.entries().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Wait until an entry is available and remove it.
    ///
    /// A notification sent while nobody is waiting is kept as a permit, so an
    /// enqueue racing with this call is never missed.
    pub async fn dequeue_wait(&self) -> JobId {
        loop {
            if let Some(job_id) = self.dequeue() {
                return job_id;
            }
            self.notify.notified().await;
        }
    }
}
