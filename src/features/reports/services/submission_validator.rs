//! Validation of raw submission form fields.
//!
//! Runs after multipart parsing and before any database or storage write, so
//! a rejected submission leaves no trace.

use crate::core::config::SubmissionConfig;
use crate::core::error::{AppError, Result};
use crate::features::reports::models::{ReportCategory, Severity};
use crate::shared::constants::{
    MAX_COMMENT_CHARS, MAX_IMAGES, MIN_IMAGES, MSG_COMMENT_TOO_LONG,
    MSG_CUSTOM_SETTLEMENT_REQUIRED, MSG_IMAGE_COUNT, MSG_IMAGE_TOO_LARGE, MSG_INVALID_FIELDS,
    MSG_NOT_AN_IMAGE, SETTLEMENT_OTHER,
};

/// One photo part extracted from the multipart body.
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Form fields as they arrive on the wire, before any interpretation.
#[derive(Default)]
pub struct RawSubmission {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub severity: Option<String>,
    pub comment: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub category: Option<String>,
    pub municipality: Option<String>,
    pub settlement: Option<String>,
    pub settlement_custom: Option<String>,
    pub images: Vec<PhotoUpload>,
}

/// Submission fields after validation and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub lat: f64,
    pub lng: f64,
    pub severity: Severity,
    pub comment: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub category: ReportCategory,
    pub municipality: String,
    pub settlement: String,
    /// Carries the free-text settlement name when the sentinel is selected.
    pub metadata: serde_json::Value,
}

/// Validate a raw submission.
///
/// Field handling mirrors the web form: an unknown category falls back to
/// pothole rather than failing, while broken coordinates, severity, or names
/// reject the whole submission with one generic message.
pub fn validate(raw: &RawSubmission, config: &SubmissionConfig) -> Result<ValidatedSubmission> {
    let category = raw
        .category
        .as_deref()
        .and_then(ReportCategory::from_slug)
        .unwrap_or_default();

    let municipality = non_blank(raw.municipality.as_deref())
        .unwrap_or(&config.default_municipality)
        .to_string();

    let (settlement, metadata) = match non_blank(raw.settlement.as_deref()) {
        Some(s) if s == SETTLEMENT_OTHER => match non_blank(raw.settlement_custom.as_deref()) {
            Some(custom) => (
                SETTLEMENT_OTHER.to_string(),
                serde_json::json!({ "settlement_custom": custom }),
            ),
            None => {
                return Err(AppError::Validation(
                    MSG_CUSTOM_SETTLEMENT_REQUIRED.to_string(),
                ))
            }
        },
        Some(s) => (s.to_string(), serde_json::json!({})),
        None => (config.default_settlement.clone(), serde_json::json!({})),
    };

    let lat = parse_coordinate(raw.lat.as_deref(), -90.0, 90.0);
    let lng = parse_coordinate(raw.lng.as_deref(), -180.0, 180.0);
    let severity = raw
        .severity
        .as_deref()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .and_then(Severity::from_ordinal);
    let first_name = non_blank(raw.first_name.as_deref());
    let last_name = non_blank(raw.last_name.as_deref());

    let (Some(lat), Some(lng), Some(severity), Some(first_name), Some(last_name)) =
        (lat, lng, severity, first_name, last_name)
    else {
        return Err(AppError::Validation(MSG_INVALID_FIELDS.to_string()));
    };

    let comment = match raw.comment.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(c) if c.chars().count() > MAX_COMMENT_CHARS => {
            return Err(AppError::Validation(MSG_COMMENT_TOO_LONG.to_string()))
        }
        Some(c) => Some(c.to_string()),
    };

    if raw.images.len() < MIN_IMAGES || raw.images.len() > MAX_IMAGES {
        return Err(AppError::Validation(MSG_IMAGE_COUNT.to_string()));
    }
    for image in &raw.images {
        if image.bytes.len() > config.max_image_bytes {
            return Err(AppError::Validation(MSG_IMAGE_TOO_LARGE.to_string()));
        }
        // A missing declared type is tolerated; the upload falls back to jpeg
        if let Some(content_type) = image.content_type.as_deref().filter(|c| !c.is_empty()) {
            if !content_type.starts_with("image/") {
                return Err(AppError::Validation(MSG_NOT_AN_IMAGE.to_string()));
            }
        }
    }

    Ok(ValidatedSubmission {
        lat,
        lng,
        severity,
        comment,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        category,
        municipality,
        settlement,
        metadata,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_coordinate(value: Option<&str>, min: f64, max: f64) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && (min..=max).contains(v))
}
