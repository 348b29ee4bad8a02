use std::time::Duration;

use tokio::time::interval;

use crate::features::reports::services::CleanupService;

/// Background sweeper for stale unverified reports
///
/// Covers deployments without an external scheduler; everyone else triggers
/// `/cron/cleanup` and leaves the worker disabled.
pub struct CleanupWorker {
    cleanup: CleanupService,
    interval_secs: u64,
}

impl CleanupWorker {
    pub fn new(cleanup: CleanupService, interval_secs: u64) -> Self {
        Self {
            cleanup,
            interval_secs,
        }
    }

    /// Run the sweeper in a background loop
    pub async fn run(&self) {
        tracing::info!("Starting cleanup worker (every {}s)", self.interval_secs);

        let mut interval = interval(Duration::from_secs(self.interval_secs));

        loop {
            interval.tick().await;

            match self.cleanup.run().await {
                Ok(0) => {}
                Ok(deleted) => {
                    tracing::info!("Cleanup worker removed {} stale reports", deleted);
                }
                Err(e) => {
                    tracing::error!("Cleanup worker run failed: {:?}", e);
                }
            }
        }
    }
}
