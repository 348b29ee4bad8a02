use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Report category enum matching the database enum. Unknown input falls back
/// to the default rather than failing validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    #[default]
    Pothole,
    FallenTree,
    RoadMarking,
    StreetLight,
    TrafficSign,
    Hazard,
}

impl ReportCategory {
    /// Parses the wire slug used by the form and the list filter.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "pothole" => Some(ReportCategory::Pothole),
            "fallen_tree" => Some(ReportCategory::FallenTree),
            "road_marking" => Some(ReportCategory::RoadMarking),
            "street_light" => Some(ReportCategory::StreetLight),
            "traffic_sign" => Some(ReportCategory::TrafficSign),
            "hazard" => Some(ReportCategory::Hazard),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportCategory::Pothole => write!(f, "pothole"),
            ReportCategory::FallenTree => write!(f, "fallen_tree"),
            ReportCategory::RoadMarking => write!(f, "road_marking"),
            ReportCategory::StreetLight => write!(f, "street_light"),
            ReportCategory::TrafficSign => write!(f, "traffic_sign"),
            ReportCategory::Hazard => write!(f, "hazard"),
        }
    }
}

/// Report lifecycle status matching the database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    New,
    InProgress,
    Resolved,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::New => write!(f, "new"),
            ReportStatus::InProgress => write!(f, "in_progress"),
            ReportStatus::Resolved => write!(f, "resolved"),
        }
    }
}

/// Severity ordinal, stored as an integer column and serialized as a bare
/// number. Its meaning is category-dependent (a severity-2 pothole is "large",
/// a severity-2 fallen tree "partially blocks the road").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[repr(i32)]
pub enum Severity {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Severity {
    pub fn from_ordinal(value: i32) -> Option<Self> {
        match value {
            1 => Some(Severity::Low),
            2 => Some(Severity::Medium),
            3 => Some(Severity::High),
            _ => None,
        }
    }

    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i32::deserialize(deserializer)?;
        Severity::from_ordinal(raw)
            .ok_or_else(|| serde::de::Error::custom("severity must be 1, 2 or 3"))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ordinal())
    }
}

/// Database model for a citizen report
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct Report {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub severity: Severity,
    pub comment: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub submitter_hash: String,
    pub category: ReportCategory,
    pub municipality: String,
    pub settlement: String,
    pub status: ReportStatus,
    pub verified: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Data for inserting a new report row
#[derive(Debug)]
pub struct CreateReport {
    pub lat: f64,
    pub lng: f64,
    pub severity: Severity,
    pub comment: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub submitter_hash: String,
    pub category: ReportCategory,
    pub municipality: String,
    pub settlement: String,
    pub verified: bool,
    pub metadata: serde_json::Value,
}
