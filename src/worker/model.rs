use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WorkerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Active,
    Busy,
    Offline,
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerStatus::Active => f.pad("active"),
            WorkerStatus::Busy => f.pad("busy"),
            WorkerStatus::Offline => f.pad("offline"),
        }
    }
}

/// Capacity a worker declared when it registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu_cores: u32,
    pub memory_mb: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub status: WorkerStatus,
    pub resources: Resources,
    pub last_heartbeat: DateTime<Utc>,
}

impl Worker {
    pub fn new(name: impl Into<String>, cpu_cores: u32, memory_mb: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            status: WorkerStatus::Active,
            resources: Resources {
                cpu_cores,
                memory_mb,
            },
            last_heartbeat: Utc::now(),
        }
    }

    /// Number of jobs this worker may run at once. A worker declaring zero
    /// cores still gets one slot.
    pub fn slots(&self) -> usize {
        self.resources.cpu_cores.max(1) as usize
    }

    pub fn update_heartbeat(&mut self) {
        self.last_heartbeat = Utc::now();
    }

    pub fn is_alive(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(timeout) {
            Ok(timeout) => now - self.last_heartbeat < timeout,
            // Timeouts too large for chrono never expire.
            Err(_) => true,
        }
    }
}
