use std::net::SocketAddr;
use std::time::Duration;

/// Timing knobs for the assignment loop and simulated execution.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How long the simulated executor "runs" each job
    pub execution_duration_ms: u64,
    /// First wait after finding no eligible worker
    pub retry_backoff_min_ms: u64,
    /// Cap for the doubling backoff
    pub retry_backoff_max_ms: u64,
    /// Mark workers offline when their heartbeat is older than this.
    /// `None` disables liveness eviction.
    pub worker_timeout_ms: Option<u64>,
    /// How often the liveness monitor runs when eviction is enabled
    pub liveness_check_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            execution_duration_ms: 5000,
            retry_backoff_min_ms: 100,
            retry_backoff_max_ms: 5000,
            worker_timeout_ms: None,
            liveness_check_interval_ms: 1000,
        }
    }
}

impl SchedulerConfig {
    pub fn execution_duration(&self) -> Duration {
        Duration::from_millis(self.execution_duration_ms)
    }

    /// First retry wait. Never zero, so the doubling always makes progress.
    pub fn retry_backoff_min(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_min_ms.max(1))
    }

    pub fn retry_backoff_max(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_max_ms).max(self.retry_backoff_min())
    }

    /// Backoff to use after `current`, doubling up to the configured cap.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        current
            .max(self.retry_backoff_min())
            .saturating_mul(2)
            .min(self.retry_backoff_max())
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen_addr: SocketAddr,
    pub scheduler: SchedulerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_execution_duration_ms(mut self, ms: u64) -> Self {
        self.scheduler.execution_duration_ms = ms;
        self
    }

    pub fn with_retry_backoff_ms(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.scheduler.retry_backoff_min_ms = min_ms;
        self.scheduler.retry_backoff_max_ms = max_ms;
        self
    }

    pub fn with_worker_timeout_ms(mut self, timeout_ms: u64, check_interval_ms: u64) -> Self {
        self.scheduler.worker_timeout_ms = Some(timeout_ms);
        self.scheduler.liveness_check_interval_ms = check_interval_ms;
        self
    }
}
