use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scheduler::Scheduler;

/// Periodically takes workers offline once their heartbeat is older than `timeout`.
pub struct LivenessMonitor {
    interval: Duration,
    timeout: Duration,
}

impl LivenessMonitor {
    /// A zero `interval_ms` is raised to one millisecond.
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms.max(1)),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(&self, scheduler: Arc<Scheduler>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = scheduler.evict_stale_workers(self.timeout).await {
                tracing::warn!(error = %e, "Worker liveness check failed");
            }
        }

        tracing::debug!("Liveness monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_clamped() {
        let monitor = LivenessMonitor::new(0, 500);
        assert_eq!(monitor.interval, Duration::from_millis(1));
        assert_eq!(monitor.timeout, Duration::from_millis(500));
    }
}
