use std::sync::Arc;
use std::time::Duration;

use colt_scheduler::config::SchedulerConfig;
use colt_scheduler::scheduler::assigner::JobAssigner;
use colt_scheduler::scheduler::{Assignment, Job, JobQueue, JobStatus, Scheduler};
use colt_scheduler::store::{MemoryStore, Store};
use colt_scheduler::worker::{SimulatedExecutor, Worker, WorkerStatus};

fn worker_with_id(id: &str, cpu_cores: u32) -> Worker {
    let mut worker = Worker::new(format!("worker-{}", id), cpu_cores, 1024);
    worker.id = id.to_string();
    worker
}

fn make_scheduler(
    execution_ms: u64,
) -> (Arc<Scheduler>, Arc<MemoryStore>, Arc<JobQueue>) {
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(JobQueue::new());
    let executor = Arc::new(SimulatedExecutor::new(Duration::from_millis(execution_ms)));
    let scheduler = Arc::new(Scheduler::new(
        store.clone(),
        queue.clone(),
        executor,
        SchedulerConfig::default(),
    ));
    (scheduler, store, queue)
}

#[test]
fn test_job_creation() {
    let job = Job::new("greet", "echo", vec!["hello".to_string()]);
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.name, "greet");
    assert_eq!(job.command, "echo");
    assert_eq!(job.args, vec!["hello".to_string()]);
    assert!(job.assigned_worker.is_none());
    assert!(job.completed_at.is_none());
}

#[test]
fn test_job_ids_are_unique() {
    let a = Job::new("a", "true", vec![]);
    let b = Job::new("a", "true", vec![]);
    assert_ne!(a.id, b.id);
}

#[test]
fn test_job_finish_sets_completion_time() {
    let mut job = Job::new("a", "true", vec![]);
    job.mark_running("w1");
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.assigned_worker.as_deref(), Some("w1"));
    assert!(job.completed_at.is_none());

    job.finish(JobStatus::Completed, None);
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.completed_at.is_some());
}

#[test]
fn test_queue_is_fifo() {
    let queue = JobQueue::new();
    queue.enqueue("a".to_string());
    queue.enqueue("b".to_string());
    queue.enqueue("c".to_string());

    assert_eq!(queue.dequeue().as_deref(), Some("a"));
    assert_eq!(queue.dequeue().as_deref(), Some("b"));
    assert_eq!(queue.dequeue().as_deref(), Some("c"));

    // Empty queue yields None, not an error
    assert!(queue.dequeue().is_none());
    assert!(queue.peek().is_none());
}

#[test]
fn test_queue_peek_and_size() {
    let queue = JobQueue::new();
    assert!(queue.is_empty());

    queue.enqueue("a".to_string());
    queue.enqueue("b".to_string());
    assert_eq!(queue.peek().as_deref(), Some("a"));
    assert_eq!(queue.len(), 2);

    // Duplicates are not collapsed
    queue.enqueue("a".to_string());
    assert_eq!(queue.len(), 3);
}

#[test]
fn test_requeue_front_keeps_place_in_line() {
    let queue = JobQueue::new();
    queue.enqueue("first".to_string());
    queue.enqueue("second".to_string());

    let head = queue.dequeue().unwrap();
    queue.requeue_front(head);

    assert_eq!(queue.dequeue().as_deref(), Some("first"));
    assert_eq!(queue.dequeue().as_deref(), Some("second"));
}

#[tokio::test]
async fn test_dequeue_wait_wakes_on_enqueue() {
    let queue = Arc::new(JobQueue::new());

    let waiter = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.dequeue_wait().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.enqueue("late".to_string());

    let job_id = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter should wake up")
        .unwrap();
    assert_eq!(job_id, "late");
}

#[test]
fn test_round_robin_ignores_snapshot_order() {
    let mut assigner = JobAssigner::new();
    let (a, b, c) = (
        worker_with_id("a", 4),
        worker_with_id("b", 4),
        worker_with_id("c", 4),
    );
    for w in [&a, &b, &c] {
        assigner.register_worker(w);
    }

    let shuffled = [
        vec![c.clone(), a.clone(), b.clone()],
        vec![b.clone(), c.clone(), a.clone()],
        vec![a.clone(), b.clone(), c.clone()],
        vec![c.clone(), b.clone(), a.clone()],
    ];

    let picks: Vec<String> = shuffled
        .iter()
        .map(|snapshot| assigner.select_worker(snapshot).unwrap().id)
        .collect();
    assert_eq!(picks, vec!["a", "b", "c", "a"]);
}

#[test]
fn test_round_robin_skips_unavailable_workers() {
    let mut assigner = JobAssigner::new();
    let (a, b, c) = (
        worker_with_id("a", 4),
        worker_with_id("b", 4),
        worker_with_id("c", 4),
    );
    for w in [&a, &b, &c] {
        assigner.register_worker(w);
    }

    assert_eq!(assigner.select_worker(&[a.clone(), b.clone(), c.clone()]).unwrap().id, "a");
    // b dropped out of the active snapshot
    assert_eq!(assigner.select_worker(&[a.clone(), c.clone()]).unwrap().id, "c");
    // Wraps around to the start
    assert_eq!(assigner.select_worker(&[a.clone(), b.clone(), c.clone()]).unwrap().id, "a");
    assert_eq!(assigner.select_worker(&[a.clone(), b.clone(), c.clone()]).unwrap().id, "b");
}

#[test]
fn test_no_workers_available() {
    let mut assigner = JobAssigner::new();
    assigner.register_worker(&worker_with_id("a", 1));

    // Registered but not in the active snapshot
    assert!(assigner.select_worker(&[]).is_none());
}

#[test]
fn test_unregistered_workers_are_tracked_on_sight() {
    let mut assigner = JobAssigner::new();
    let stray = worker_with_id("stray", 2);

    assert_eq!(assigner.select_worker(&[stray.clone()]).unwrap().id, "stray");
    assert_eq!(assigner.all_workers().len(), 1);
    assert_eq!(assigner.all_workers()[0].capacity, 2);
}

#[test]
fn test_capacity_limits_selection() {
    let mut assigner = JobAssigner::new();
    let a = worker_with_id("a", 1);
    let b = worker_with_id("b", 2);
    assigner.register_worker(&a);
    assigner.register_worker(&b);
    let snapshot = vec![a.clone(), b.clone()];

    assert_eq!(assigner.select_worker(&snapshot).unwrap().id, "a");
    assert!(assigner.reserve("a", "job-1"), "single-slot worker is saturated");
    assert!(assigner.is_saturated("a"));

    assert_eq!(assigner.select_worker(&snapshot).unwrap().id, "b");
    assert!(!assigner.reserve("b", "job-2"));
    // a is full, so rotation stays on b
    assert_eq!(assigner.select_worker(&snapshot).unwrap().id, "b");
    assert!(assigner.reserve("b", "job-3"));

    assert!(assigner.select_worker(&snapshot).is_none());

    assert!(assigner.release("a", "job-1"), "release frees a saturated worker");
    assert!(!assigner.release("a", "job-1"), "double release is a no-op");
    assert_eq!(assigner.running_jobs("b"), 2);
    assert_eq!(assigner.select_worker(&snapshot).unwrap().id, "a");
}

#[tokio::test]
async fn test_schedule_job_marks_running() {
    let (scheduler, store, _queue) = make_scheduler(10_000);
    let worker = scheduler
        .register_worker(Worker::new("w1", 2, 1024))
        .await
        .unwrap();

    let job = Job::new("build", "make", vec![]);
    store.save_job(job.clone()).await.unwrap();

    let assignment = scheduler.schedule_job(job.clone()).await.unwrap();
    assert_eq!(
        assignment,
        Assignment::Assigned {
            worker_id: worker.id.clone()
        }
    );

    let stored = store.get_job(&job.id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Running);
    assert_eq!(stored.assigned_worker, Some(worker.id.clone()));
    assert_eq!(scheduler.running_jobs(&worker.id).await, 1);
}

#[tokio::test]
async fn test_schedule_job_without_workers_requeues() {
    let (scheduler, store, queue) = make_scheduler(10);
    let job = Job::new("orphan", "true", vec![]);
    store.save_job(job.clone()).await.unwrap();

    let assignment = scheduler.schedule_job(job.clone()).await.unwrap();
    assert_eq!(assignment, Assignment::Deferred);

    // Not dropped: back at the head of the queue and still pending
    assert_eq!(queue.peek(), Some(job.id.clone()));
    assert_eq!(
        store.get_job(&job.id).await.unwrap().status,
        JobStatus::Pending
    );
}

#[tokio::test]
async fn test_schedule_unsaved_job_fails_without_reserving() {
    let (scheduler, _store, queue) = make_scheduler(10);
    let worker = scheduler
        .register_worker(Worker::new("w1", 1, 512))
        .await
        .unwrap();

    let err = scheduler
        .schedule_job(Job::new("ghost", "true", vec![]))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(scheduler.running_jobs(&worker.id).await, 0);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_saturated_worker_goes_busy_then_active() {
    let (scheduler, store, _queue) = make_scheduler(100);
    let worker = scheduler
        .register_worker(Worker::new("single", 1, 512))
        .await
        .unwrap();

    let job = Job::new("one", "true", vec![]);
    store.save_job(job.clone()).await.unwrap();
    scheduler.schedule_job(job.clone()).await.unwrap();

    assert_eq!(
        store.get_worker(&worker.id).await.unwrap().status,
        WorkerStatus::Busy
    );
    assert!(store.get_available_workers().await.unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(
        store.get_job(&job.id).await.unwrap().status,
        JobStatus::Completed
    );
    assert_eq!(
        store.get_worker(&worker.id).await.unwrap().status,
        WorkerStatus::Active
    );
    assert_eq!(scheduler.running_jobs(&worker.id).await, 0);
}

#[tokio::test]
async fn test_stale_workers_are_evicted_and_revived() {
    let (scheduler, store, _queue) = make_scheduler(10);
    let mut stale = Worker::new("stale", 1, 512);
    stale.last_heartbeat = chrono::Utc::now() - chrono::Duration::seconds(60);
    let fresh = Worker::new("fresh", 1, 512);
    scheduler.register_worker(stale.clone()).await.unwrap();
    scheduler.register_worker(fresh.clone()).await.unwrap();

    let evicted = scheduler
        .evict_stale_workers(Duration::from_secs(30))
        .await
        .unwrap();
    assert_eq!(evicted, vec![stale.id.clone()]);

    let available = store.get_available_workers().await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, fresh.id);

    let revived = scheduler.heartbeat(&stale.id).await.unwrap();
    assert_eq!(revived.status, WorkerStatus::Active);
    assert!(revived.last_heartbeat > stale.last_heartbeat);
    assert_eq!(store.get_available_workers().await.unwrap().len(), 2);

    // A second pass finds nothing to evict
    assert!(scheduler
        .evict_stale_workers(Duration::from_secs(30))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_saturated_worker_revives_as_busy() {
    let (scheduler, store, _queue) = make_scheduler(300);
    let worker = scheduler
        .register_worker(Worker::new("single", 1, 512))
        .await
        .unwrap();

    let job = Job::new("long", "true", vec![]);
    store.save_job(job.clone()).await.unwrap();
    scheduler.schedule_job(job.clone()).await.unwrap();

    // Every heartbeat is older than a zero timeout
    let evicted = scheduler
        .evict_stale_workers(Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(evicted, vec![worker.id.clone()]);

    let revived = scheduler.heartbeat(&worker.id).await.unwrap();
    assert_eq!(revived.status, WorkerStatus::Busy);
    assert!(store.get_available_workers().await.unwrap().is_empty());

    // The slot frees when the job finishes
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(
        store.get_job(&job.id).await.unwrap().status,
        JobStatus::Completed
    );
    assert_eq!(
        store.get_worker(&worker.id).await.unwrap().status,
        WorkerStatus::Active
    );
}

#[tokio::test]
async fn test_heartbeat_unknown_worker() {
    let (scheduler, _store, _queue) = make_scheduler(10);
    let err = scheduler.heartbeat("missing").await.unwrap_err();
    assert!(err.is_not_found());
}
