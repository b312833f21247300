use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use crate::scheduler::job::JobId;
use crate::worker::{Worker, WorkerId};

/// Slot tracking for one worker.
#[derive(Debug, Clone)]
pub struct WorkerSlots {
    pub id: WorkerId,
    pub capacity: usize,
    pub running_jobs: HashSet<JobId>,
}

impl WorkerSlots {
    pub fn new(id: WorkerId, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            running_jobs: HashSet::new(),
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.running_jobs.len() < self.capacity
    }
}

/// Round-robin selection over a stable, id-ordered set of workers.
///
/// The rotation resumes after the last worker chosen, so it does not depend
/// on the order in which the store happens to return its snapshot.
#[derive(Debug, Default)]
pub struct JobAssigner {
    workers: BTreeMap<WorkerId, WorkerSlots>,
    last_assigned: Option<WorkerId>,
}

impl JobAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a worker, or refresh its capacity if already tracked.
    /// Jobs already running on it are kept.
    pub fn register_worker(&mut self, worker: &Worker) {
        self.workers
            .entry(worker.id.clone())
            .and_modify(|slots| slots.capacity = worker.slots())
            .or_insert_with(|| WorkerSlots::new(worker.id.clone(), worker.slots()));
    }

    /// Pick the next eligible worker from `available`.
    ///
    /// Eligible means present in the snapshot and holding a free slot. Workers
    /// in the snapshot that were never registered here are tracked on sight.
    pub fn select_worker(&mut self, available: &[Worker]) -> Option<Worker> {
        for worker in available {
            if !self.workers.contains_key(&worker.id) {
                self.register_worker(worker);
            }
        }

        let candidates: HashMap<&str, &Worker> =
            available.iter().map(|w| (w.id.as_str(), w)).collect();

        // Everything after the last pick, then wrap around up to and including it.
        let (after, wrapped) = match self.last_assigned.as_deref() {
            Some(last) => (
                self.workers
                    .range::<str, _>((Bound::Excluded(last), Bound::Unbounded)),
                self.workers
                    .range::<str, _>((Bound::Unbounded, Bound::Included(last))),
            ),
            None => (
                self.workers.range::<str, _>(..),
                self.workers
                    .range::<str, _>((Bound::Unbounded, Bound::Excluded(""))),
            ),
        };

        let chosen = after
            .chain(wrapped)
            .filter(|(_, slots)| slots.has_capacity())
            .find_map(|(id, _)| candidates.get(id.as_str()).copied())?
            .clone();

        self.last_assigned = Some(chosen.id.clone());
        Some(chosen)
    }

    /// Occupy a slot on `worker_id` for `job_id`.
    /// Returns true if the worker has no free slot left afterwards.
    pub fn reserve(&mut self, worker_id: &str, job_id: &str) -> bool {
        match self.workers.get_mut(worker_id) {
            Some(slots) => {
                slots.running_jobs.insert(job_id.to_string());
                !slots.has_capacity()
            }
            None => false,
        }
    }

    /// Free the slot held by `job_id`.
    /// Returns true if the worker was saturated before the release.
    pub fn release(&mut self, worker_id: &str, job_id: &str) -> bool {
        match self.workers.get_mut(worker_id) {
            Some(slots) => {
                let was_full = !slots.has_capacity();
                slots.running_jobs.remove(job_id) && was_full
            }
            None => false,
        }
    }

    pub fn is_saturated(&self, worker_id: &str) -> bool {
        self.workers
            .get(worker_id)
            .is_some_and(|slots| !slots.has_capacity())
    }

    pub fn running_jobs(&self, worker_id: &str) -> usize {
        self.workers
            .get(worker_id)
            .map(|slots| slots.running_jobs.len())
            .unwrap_or(0)
    }

    /// All tracked workers in id order.
    pub fn all_workers(&self) -> Vec<&WorkerSlots> {
        self.workers.values().collect()
    }
}
