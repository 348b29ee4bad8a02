use std::sync::Arc;

use chrono::Duration;

use crate::core::error::Result;
use crate::features::reports::services::report_service::ReportStore;
use crate::modules::storage::ObjectStorage;
use crate::shared::clock::{Clock, SystemClock};

/// Service for purging stale unverified reports
pub struct CleanupService {
    reports: Arc<dyn ReportStore>,
    storage: Arc<dyn ObjectStorage>,
    max_age_hours: i64,
    clock: Arc<dyn Clock>,
}

impl CleanupService {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        storage: Arc<dyn ObjectStorage>,
        max_age_hours: i64,
    ) -> Self {
        Self::with_clock(reports, storage, max_age_hours, Arc::new(SystemClock))
    }

    /// Constructor with an injected clock.
    pub fn with_clock(
        reports: Arc<dyn ReportStore>,
        storage: Arc<dyn ObjectStorage>,
        max_age_hours: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reports,
            storage,
            max_age_hours,
            clock,
        }
    }

    /// Delete unverified reports older than the configured age, with their
    /// photo blobs and rows. Returns the number of reports removed.
    ///
    /// Blob and photo row deletion is best effort; only a failure to delete
    /// the report rows themselves fails the run.
    pub async fn run(&self) -> Result<u64> {
        let cutoff = self.clock.now() - Duration::hours(self.max_age_hours);
        let ids = self.reports.stale_unverified_ids(cutoff).await?;

        if ids.is_empty() {
            tracing::info!("Cleanup found no stale reports");
            return Ok(0);
        }

        let photos = self.reports.photos_for(&ids).await?;
        for photo in &photos {
            if let Err(e) = self.storage.delete(&photo.storage_path).await {
                // Orphaned blobs are invisible to the map; leave them for a
                // manual sweep.
                tracing::warn!("Failed to delete photo blob {}: {}", photo.storage_path, e);
            }
        }

        if let Err(e) = self.reports.delete_photo_rows(&ids).await {
            tracing::warn!("Failed to delete photo rows: {}", e);
        }

        let deleted = self.reports.delete_by_ids(&ids).await?;

        tracing::info!(
            "Cleanup removed {} reports older than {}h ({} photo blobs)",
            deleted,
            self.max_age_hours,
            photos.len()
        );

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Utc};

    use crate::shared::test_helpers::{stored_report, InMemoryReportStore, InMemoryStorage};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn sweeper(
        reports: Arc<InMemoryReportStore>,
        storage: Arc<InMemoryStorage>,
        now: DateTime<Utc>,
    ) -> CleanupService {
        CleanupService::with_clock(reports, storage, 48, Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn test_sweeps_only_unverified_reports_strictly_older_than_the_cutoff() {
        let now = Utc::now();
        let reports = Arc::new(InMemoryReportStore::new());
        let stale = stored_report(now - Duration::hours(49), false);
        let boundary = stored_report(now - Duration::hours(48), false);
        let fresh = stored_report(now - Duration::hours(47), false);
        let verified = stored_report(now - Duration::hours(200), true);
        let stale_id = stale.id;
        let kept_ids = [boundary.id, fresh.id, verified.id];
        for report in [stale, boundary, fresh, verified] {
            reports.seed(report);
        }
        reports.seed_photo(stale_id, "stale/1.jpg");
        let storage = Arc::new(InMemoryStorage::new());

        let deleted = sweeper(reports.clone(), storage.clone(), now)
            .run()
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        let remaining = reports.report_ids();
        assert!(!remaining.contains(&stale_id));
        for id in kept_ids {
            assert!(remaining.contains(&id));
        }
        assert_eq!(storage.deleted_keys(), vec!["stale/1.jpg".to_string()]);
        assert!(reports.photo_paths().is_empty());
    }

    #[tokio::test]
    async fn test_second_sweep_finds_nothing() {
        let now = Utc::now();
        let reports = Arc::new(InMemoryReportStore::new());
        reports.seed(stored_report(now - Duration::hours(72), false));
        let storage = Arc::new(InMemoryStorage::new());
        let sweeper = sweeper(reports, storage, now);

        assert_eq!(sweeper.run().await.unwrap(), 1);
        assert_eq!(sweeper.run().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blob_delete_failure_does_not_stop_the_sweep() {
        let now = Utc::now();
        let reports = Arc::new(InMemoryReportStore::new());
        let stale = stored_report(now - Duration::hours(72), false);
        let stale_id = stale.id;
        reports.seed(stale);
        reports.seed_photo(stale_id, "gone/1.jpg");
        let mut storage = InMemoryStorage::new();
        storage.fail_deletes = true;

        let deleted = sweeper(reports.clone(), Arc::new(storage), now)
            .run()
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(reports.report_ids().is_empty());
        assert!(reports.photo_paths().is_empty());
    }
}
