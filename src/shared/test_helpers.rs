//! Doubles and builders shared by the route and service tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{
    CreateReport, Report, ReportCategory, ReportPhoto, ReportStatus, Severity,
};
use crate::features::reports::services::ReportStore;
use crate::modules::storage::ObjectStorage;
use crate::shared::hash::submitter_hash;

/// Boundary used by [`MultipartBuilder`]. Any fixed token works as long as it
/// never appears in the payload bytes.
pub const TEST_BOUNDARY: &str = "x-test-boundary-7MA4YWxkTrZu0gW";

/// Hand-rolled multipart/form-data body, so tests control the exact bytes a
/// browser form would send.
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body
            .extend_from_slice(format!("--{TEST_BOUNDARY}\r\n").as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body
            .extend_from_slice(format!("--{TEST_BOUNDARY}\r\n").as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Final body bytes and the matching Content-Type header value.
    pub fn build(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{TEST_BOUNDARY}--\r\n").as_bytes());
        (
            format!("multipart/form-data; boundary={TEST_BOUNDARY}"),
            self.body,
        )
    }
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Report row fixture for seeding [`InMemoryReportStore`].
pub fn stored_report(created_at: DateTime<Utc>, verified: bool) -> Report {
    Report {
        id: Uuid::new_v4(),
        lat: 43.1332,
        lng: 24.7111,
        severity: Severity::Medium,
        comment: None,
        first_name: "Иван".to_string(),
        last_name: "Петров".to_string(),
        submitter_hash: submitter_hash("Иван", "Петров"),
        category: ReportCategory::Pothole,
        municipality: "Lovech".to_string(),
        settlement: "Lovech".to_string(),
        status: ReportStatus::New,
        verified,
        metadata: serde_json::json!({}),
        created_at,
        updated_at: None,
        resolved_at: None,
    }
}

/// In-memory [`ReportStore`] double with switches to make single operations
/// fail.
pub struct InMemoryReportStore {
    pub fail_create: bool,
    pub fail_photo_rows: bool,
    reports: Mutex<Vec<Report>>,
    photos: Mutex<Vec<ReportPhoto>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            fail_create: false,
            fail_photo_rows: false,
            reports: Mutex::new(Vec::new()),
            photos: Mutex::new(Vec::new()),
        }
    }

    pub fn seed(&self, report: Report) {
        self.reports.lock().unwrap().push(report);
    }

    pub fn seed_photo(&self, report_id: Uuid, storage_path: &str) {
        self.photos.lock().unwrap().push(ReportPhoto {
            id: Uuid::new_v4(),
            report_id,
            storage_path: storage_path.to_string(),
            created_at: Utc::now(),
        });
    }

    pub fn report_ids(&self) -> Vec<Uuid> {
        self.reports.lock().unwrap().iter().map(|r| r.id).collect()
    }

    pub fn photo_paths(&self) -> Vec<String> {
        self.photos
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.storage_path.clone())
            .collect()
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create(&self, data: &CreateReport) -> Result<Report> {
        if self.fail_create {
            return Err(AppError::Internal("insert refused".to_string()));
        }
        let report = Report {
            id: Uuid::new_v4(),
            lat: data.lat,
            lng: data.lng,
            severity: data.severity,
            comment: data.comment.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            submitter_hash: data.submitter_hash.clone(),
            category: data.category,
            municipality: data.municipality.clone(),
            settlement: data.settlement.clone(),
            status: ReportStatus::New,
            verified: data.verified,
            metadata: data.metadata.clone(),
            created_at: Utc::now(),
            updated_at: None,
            resolved_at: None,
        };
        self.reports.lock().unwrap().push(report.clone());
        Ok(report)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.reports.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn insert_photo(&self, report_id: Uuid, storage_path: &str) -> Result<()> {
        if self.fail_photo_rows {
            return Err(AppError::Internal("photo row refused".to_string()));
        }
        self.photos.lock().unwrap().push(ReportPhoto {
            id: Uuid::new_v4(),
            report_id,
            storage_path: storage_path.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn photos_for(&self, report_ids: &[Uuid]) -> Result<Vec<ReportPhoto>> {
        Ok(self
            .photos
            .lock()
            .unwrap()
            .iter()
            .filter(|p| report_ids.contains(&p.report_id))
            .cloned()
            .collect())
    }

    async fn stale_unverified_ids(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.verified && r.created_at < cutoff)
            .map(|r| r.id)
            .collect())
    }

    async fn delete_photo_rows(&self, report_ids: &[Uuid]) -> Result<u64> {
        let mut photos = self.photos.lock().unwrap();
        let before = photos.len();
        photos.retain(|p| !report_ids.contains(&p.report_id));
        Ok((before - photos.len()) as u64)
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        let mut reports = self.reports.lock().unwrap();
        let before = reports.len();
        reports.retain(|r| !ids.contains(&r.id));
        Ok((before - reports.len()) as u64)
    }
}

/// [`ObjectStorage`] double recording uploads and deletions, with switches to
/// make single operations fail.
pub struct InMemoryStorage {
    pub fail_bucket: bool,
    pub upload_error: Option<String>,
    pub fail_deletes: bool,
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            fail_bucket: false,
            upload_error: None,
            fail_deletes: false,
            uploaded: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn ensure_bucket(&self) -> Result<()> {
        if self.fail_bucket {
            return Err(AppError::Storage("bucket unreachable".to_string()));
        }
        Ok(())
    }

    async fn upload(&self, key: &str, _data: &[u8], _content_type: &str) -> Result<()> {
        if let Some(message) = &self.upload_error {
            return Err(AppError::Storage(message.clone()));
        }
        self.uploaded.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes {
            return Err(AppError::Storage("delete refused".to_string()));
        }
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://storage.local/test-bucket/{key}")
    }

    fn bucket_name(&self) -> String {
        "test-bucket".to_string()
    }
}
