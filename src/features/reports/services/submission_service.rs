//! Submission writer: report row, photo blobs, photo rows.
//!
//! There is no cross-store transaction, so the writer records an undo step
//! after the report insert and runs it when a later step fails. Photo blobs
//! already uploaded when an upload fails are left behind; only the report row
//! is retracted, which keeps the map free of half-submitted reports.

use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{CreateReport, Report};
use crate::features::reports::services::compensation::Compensations;
use crate::features::reports::services::report_service::ReportStore;
use crate::features::reports::services::submission_validator::{PhotoUpload, ValidatedSubmission};
use crate::modules::storage::ObjectStorage;
use crate::shared::constants::{
    DEFAULT_PHOTO_CONTENT_TYPE, DEFAULT_PHOTO_EXTENSION, MSG_BUCKET_CREATE_FAILED,
    MSG_REPORT_INSERT_FAILED, MSG_UPLOAD_FAILED,
};
use crate::shared::hash::submitter_hash;

lazy_static! {
    /// Characters allowed in a photo file extension after lowercasing.
    static ref EXTENSION_SANITIZER: Regex = Regex::new(r"[^a-z0-9]").unwrap();
}

/// Service for the multi-store submission flow
pub struct SubmissionService {
    reports: Arc<dyn ReportStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl SubmissionService {
    pub fn new(reports: Arc<dyn ReportStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { reports, storage }
    }

    /// Persist a validated submission.
    ///
    /// Order matters: the report row lands first so photo rows have an id to
    /// reference, then blobs, then photo rows. A bucket or upload failure
    /// rolls the report row back and surfaces a user-facing message; a photo
    /// row failure is only logged so the report survives with fewer linked
    /// photos.
    pub async fn submit(
        &self,
        submission: ValidatedSubmission,
        images: &[PhotoUpload],
    ) -> Result<(Report, Vec<String>)> {
        let mut undo = Compensations::new();

        let data = CreateReport {
            lat: submission.lat,
            lng: submission.lng,
            severity: submission.severity,
            comment: submission.comment,
            first_name: submission.first_name.clone(),
            last_name: submission.last_name.clone(),
            submitter_hash: submitter_hash(&submission.first_name, &submission.last_name),
            category: submission.category,
            municipality: submission.municipality,
            settlement: submission.settlement,
            verified: true,
            metadata: submission.metadata,
        };

        let report = match self.reports.create(&data).await {
            Ok(report) => report,
            Err(_) => {
                return Err(AppError::Internal(MSG_REPORT_INSERT_FAILED.to_string()));
            }
        };

        {
            let reports = Arc::clone(&self.reports);
            let report_id = report.id;
            undo.push(
                "report row",
                Box::pin(async move {
                    if reports.delete(report_id).await.is_err() {
                        tracing::error!("Rollback left an orphaned report row: {}", report_id);
                    }
                }),
            );
        }

        if let Err(e) = self.storage.ensure_bucket().await {
            tracing::error!("Bucket check failed: {}", e);
            undo.run().await;
            return Err(AppError::Storage(bucket_missing_message(
                &self.storage.bucket_name(),
            )));
        }

        let mut stored_paths = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            let key = photo_key(
                report.id,
                Utc::now().timestamp_millis(),
                index,
                image.file_name.as_deref(),
            );
            let content_type = image
                .content_type
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_PHOTO_CONTENT_TYPE);

            if let Err(e) = self
                .storage
                .upload(&key, &image.bytes, content_type)
                .await
            {
                tracing::error!("Photo upload failed for report {}: {}", report.id, e);
                undo.run().await;
                let message = if e.to_string().contains("NoSuchBucket") {
                    bucket_missing_message(&self.storage.bucket_name())
                } else {
                    MSG_UPLOAD_FAILED.to_string()
                };
                return Err(AppError::Storage(message));
            }

            stored_paths.push(key);
        }

        for path in &stored_paths {
            if let Err(e) = self.reports.insert_photo(report.id, path).await {
                // The blob exists and the report stands; only the link is lost.
                tracing::warn!(
                    "Photo row insert failed for report {} ({}): {}",
                    report.id,
                    path,
                    e
                );
            }
        }

        tracing::info!(
            "Stored report {} with {} photos",
            report.id,
            stored_paths.len()
        );

        Ok((report, stored_paths))
    }
}

fn bucket_missing_message(bucket: &str) -> String {
    format!(
        "{} Създайте bucket \"{}\" в MinIO.",
        MSG_BUCKET_CREATE_FAILED, bucket
    )
}

/// Storage key for one photo: `{report_id}/{timestamp}-{index}.{ext}`.
fn photo_key(
    report_id: Uuid,
    timestamp_millis: i64,
    index: usize,
    file_name: Option<&str>,
) -> String {
    format!(
        "{}/{}-{}.{}",
        report_id,
        timestamp_millis,
        index,
        photo_extension(file_name)
    )
}

/// Lowercased, alphanumeric-only extension from the uploaded file name.
fn photo_extension(file_name: Option<&str>) -> String {
    let raw = file_name
        .and_then(|name| name.rsplit('.').next())
        .unwrap_or(DEFAULT_PHOTO_EXTENSION)
        .to_lowercase();
    let sanitized = EXTENSION_SANITIZER.replace_all(&raw, "").to_string();
    if sanitized.is_empty() {
        DEFAULT_PHOTO_EXTENSION.to_string()
    } else {
        sanitized
    }
}
