pub mod assigner;
pub mod engine;
pub mod job;
pub mod queue;

pub use assigner::JobAssigner;
pub use engine::{Assignment, Scheduler};
pub use job::{Job, JobId, JobStatus};
pub use queue::JobQueue;
