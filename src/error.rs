use std::fmt;

use thiserror::Error;

/// Which kind of record an operation was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Job,
    Worker,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Job => write!(f, "job"),
            RecordKind::Worker => write!(f, "worker"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Worker not found: {0}")]
    WorkerNotFound(String),

    #[error("Cannot update {kind} {id}: no such record")]
    ConflictOnUpdate { kind: RecordKind, id: String },

    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    /// True for every error caused by addressing a record that does not exist,
    /// whether through a lookup or an update.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SchedulerError::JobNotFound(_)
                | SchedulerError::WorkerNotFound(_)
                | SchedulerError::ConflictOnUpdate { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
