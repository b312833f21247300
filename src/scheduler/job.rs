use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => f.pad("pending"),
            JobStatus::Running => f.pad("running"),
            JobStatus::Completed => f.pad("completed"),
            JobStatus::Failed => f.pad("failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub status: JobStatus,
    pub assigned_worker: Option<String>,
    pub error: Option<String>,
    pub submit_time: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            command: command.into(),
            args,
            status: JobStatus::Pending,
            assigned_worker: None,
            error: None,
            submit_time: Utc::now(),
            completed_at: None,
        }
    }

    /// Move the job to `running` on the given worker.
    pub fn mark_running(&mut self, worker_id: &str) {
        self.status = JobStatus::Running;
        self.assigned_worker = Some(worker_id.to_string());
    }

    /// Record a terminal outcome. Non-terminal statuses leave `completed_at` untouched.
    pub fn finish(&mut self, status: JobStatus, error: Option<String>) {
        self.status = status;
        self.error = error;
        if status.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
    }
}
