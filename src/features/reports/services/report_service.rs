use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{CreateReport, Report, ReportCategory, ReportPhoto};
use crate::shared::constants::REPORTS_LIST_CAP;

const REPORT_COLUMNS: &str = "id, lat, lng, severity, comment, first_name, last_name, \
    submitter_hash, category, status, municipality, settlement, verified, metadata, \
    created_at, updated_at, resolved_at";

/// Persistence operations of the submission and cleanup flows, split from
/// [`ReportService`] so both flows can run against an in-memory store under
/// test.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a new report row.
    async fn create(&self, data: &CreateReport) -> Result<Report>;

    /// Delete a single report row. Used to undo a failed submission.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Record one stored photo for a report.
    async fn insert_photo(&self, report_id: Uuid, storage_path: &str) -> Result<()>;

    /// Photo rows for a set of reports, oldest first.
    async fn photos_for(&self, report_ids: &[Uuid]) -> Result<Vec<ReportPhoto>>;

    /// Ids of unverified reports created before `cutoff`.
    async fn stale_unverified_ids(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>>;

    /// Delete photo rows for a set of reports. Returns the number removed.
    async fn delete_photo_rows(&self, report_ids: &[Uuid]) -> Result<u64>;

    /// Delete report rows by id. Returns the number removed.
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64>;
}

/// Service for report persistence
#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List verified reports, newest first, with optional exact-match filters.
    ///
    /// Capped at [`REPORTS_LIST_CAP`] rows so the map endpoint stays bounded
    /// on busy deployments.
    pub async fn list_verified(
        &self,
        category: Option<ReportCategory>,
        settlement: Option<&str>,
        municipality: Option<&str>,
    ) -> Result<Vec<Report>> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE verified = TRUE"
        ));

        if let Some(category) = category {
            query.push(" AND category = ");
            query.push_bind(category);
        }
        if let Some(settlement) = settlement {
            query.push(" AND settlement = ");
            query.push_bind(settlement.to_string());
        }
        if let Some(municipality) = municipality {
            query.push(" AND municipality = ");
            query.push_bind(municipality.to_string());
        }

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(REPORTS_LIST_CAP);

        query
            .build_query_as::<Report>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list reports: {:?}", e);
                AppError::Database(e)
            })
    }
}

#[async_trait]
impl ReportStore for ReportService {
    async fn create(&self, data: &CreateReport) -> Result<Report> {
        let report = sqlx::query_as::<_, Report>(&format!(
            "INSERT INTO reports \
                (lat, lng, severity, comment, first_name, last_name, submitter_hash, \
                 category, municipality, settlement, verified, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(data.lat)
        .bind(data.lng)
        .bind(data.severity)
        .bind(&data.comment)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.submitter_hash)
        .bind(data.category)
        .bind(&data.municipality)
        .bind(&data.settlement)
        .bind(data.verified)
        .bind(&data.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create report: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Created report: {}", report.id);

        Ok(report)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete report {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        tracing::info!("Deleted report: {}", id);

        Ok(())
    }

    async fn insert_photo(&self, report_id: Uuid, storage_path: &str) -> Result<()> {
        sqlx::query("INSERT INTO report_photos (report_id, storage_path) VALUES ($1, $2)")
            .bind(report_id)
            .bind(storage_path)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to insert photo row for report {}: {:?}",
                    report_id,
                    e
                );
                AppError::Database(e)
            })?;

        Ok(())
    }

    async fn photos_for(&self, report_ids: &[Uuid]) -> Result<Vec<ReportPhoto>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, ReportPhoto>(
            "SELECT id, report_id, storage_path, created_at \
             FROM report_photos WHERE report_id = ANY($1) ORDER BY created_at",
        )
        .bind(report_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list report photos: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn stale_unverified_ids(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM reports WHERE verified = FALSE AND created_at < $1",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find stale reports: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn delete_photo_rows(&self, report_ids: &[Uuid]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM report_photos WHERE report_id = ANY($1)")
            .bind(report_ids)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete photo rows: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected())
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete reports: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected())
    }
}
