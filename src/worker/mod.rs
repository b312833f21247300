//! Workers: the execution targets jobs are assigned to.
//!
//! - [`Worker`]: the stored record with declared [`Resources`] and a
//!   [`WorkerStatus`]. Only `active` workers receive new jobs.
//! - [`JobExecutor`]: the dispatch seam. [`SimulatedExecutor`] waits a fixed
//!   duration and reports completion; nothing is sent to a remote process.
//! - [`heartbeat`]: liveness tracking. A worker whose last heartbeat is older
//!   than the configured timeout is marked `offline`.

pub mod executor;
pub mod heartbeat;
pub mod model;

pub use executor::{ExecutionResult, JobExecutor, SimulatedExecutor};
pub use heartbeat::LivenessMonitor;
pub use model::{Resources, Worker, WorkerId, WorkerStatus};
