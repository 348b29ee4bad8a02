use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a stored report photo
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct ReportPhoto {
    pub id: Uuid,
    pub report_id: Uuid,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}
