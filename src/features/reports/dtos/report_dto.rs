use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::reports::models::{Report, ReportCategory, ReportStatus, Severity};

/// Query params for listing verified reports
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ReportQueryParams {
    /// Filter by category slug (e.g. "pothole")
    pub category: Option<String>,
    /// Filter by settlement name
    pub settlement: Option<String>,
    /// Filter by municipality name
    pub municipality: Option<String>,
}

/// One stored photo of a report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhotoDto {
    /// Object key inside the photo bucket
    pub storage_path: String,
    /// Public download URL
    pub url: String,
}

/// Response DTO for a report with its photos
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDto {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    #[schema(value_type = i32, minimum = 1, maximum = 3)]
    pub severity: Severity,
    pub comment: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub category: ReportCategory,
    pub status: ReportStatus,
    pub municipality: String,
    pub settlement: String,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub photos: Vec<PhotoDto>,
}

impl From<(Report, Vec<PhotoDto>)> for ReportDto {
    fn from((r, photos): (Report, Vec<PhotoDto>)) -> Self {
        Self {
            id: r.id,
            lat: r.lat,
            lng: r.lng,
            severity: r.severity,
            comment: r.comment,
            first_name: r.first_name,
            last_name: r.last_name,
            category: r.category,
            status: r.status,
            municipality: r.municipality,
            settlement: r.settlement,
            metadata: r.metadata,
            created_at: r.created_at,
            updated_at: r.updated_at,
            resolved_at: r.resolved_at,
            photos,
        }
    }
}

/// Response for the report listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportsListResponse {
    pub reports: Vec<ReportDto>,
    /// Present only when loading failed and `reports` is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportsListResponse {
    pub fn ok(reports: Vec<ReportDto>) -> Self {
        Self {
            reports,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            reports: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Response for a stored submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitReportResponse {
    pub success: bool,
    pub id: Uuid,
    pub report: ReportDto,
}

/// Response for the cleanup trigger
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CleanupResponse {
    /// Number of reports removed
    pub deleted: u64,
}

/// Submission form for OpenAPI documentation.
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SubmitReportForm {
    /// Latitude in decimal degrees
    #[schema(example = "43.1332")]
    pub lat: String,
    /// Longitude in decimal degrees
    #[schema(example = "24.7172")]
    pub lng: String,
    /// Severity from 1 (low) to 3 (high)
    #[schema(example = "2")]
    pub severity: String,
    /// Free-text description, up to 500 characters
    pub comment: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// Category slug; unknown values fall back to "pothole"
    #[schema(example = "pothole")]
    pub category: Option<String>,
    pub municipality: Option<String>,
    /// Settlement name, or "Other" together with `settlement_custom`
    pub settlement: Option<String>,
    pub settlement_custom: Option<String>,
    /// One to five photos of the damage
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub images: Vec<String>,
}
