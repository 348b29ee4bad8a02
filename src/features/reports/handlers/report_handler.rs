use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::core::config::SubmissionConfig;
use crate::core::error::{AppError, Result};
use crate::features::rate_limits::{identify, GateDecision, RateGate};
use crate::features::reports::dtos::{
    CleanupResponse, PhotoDto, ReportDto, ReportQueryParams, ReportsListResponse,
    SubmitReportForm, SubmitReportResponse,
};
use crate::features::reports::models::ReportCategory;
use crate::features::reports::services::{
    validate, CleanupService, PhotoUpload, RawSubmission, ReportService, ReportStore,
    SubmissionService,
};
use crate::modules::storage::ObjectStorage;
use crate::shared::constants::{
    MSG_BACKEND_UNCONFIGURED, MSG_CLEANUP_FAILED, MSG_INVALID_BODY, MSG_LOAD_REPORTS_FAILED,
    MSG_RATE_LIMITED, MSG_SERVER_ERROR, MSG_UNAUTHORIZED,
};
use crate::shared::types::ErrorResponse;

/// Database and storage side of the app, present only when both are
/// configured.
pub struct Backend {
    pub reports: ReportService,
    pub submissions: SubmissionService,
    pub cleanup: CleanupService,
    pub storage: Arc<dyn ObjectStorage>,
}

/// State for report handlers
#[derive(Clone)]
pub struct ReportsState {
    pub backend: Option<Arc<Backend>>,
    pub rate_gate: Arc<RateGate>,
    pub submission: SubmissionConfig,
    pub cron_secret: Option<String>,
}

/// List verified reports for map rendering
///
/// Responds 200 with an empty list when the backend is not configured, so a
/// fresh deployment renders an empty map instead of an error page.
#[utoipa::path(
    get,
    path = "/reports",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "Verified reports, newest first", body = ReportsListResponse),
        (status = 500, description = "Loading failed", body = ReportsListResponse)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<ReportsState>,
    Query(params): Query<ReportQueryParams>,
) -> Response {
    let Some(backend) = state.backend.as_ref() else {
        tracing::debug!("Report listing requested without a configured backend");
        return list_response(StatusCode::OK, ReportsListResponse::ok(Vec::new()));
    };

    // An unknown category slug drops the filter instead of failing the read.
    let category = params.category.as_deref().and_then(ReportCategory::from_slug);

    match load_reports(
        backend,
        category,
        params.settlement.as_deref(),
        params.municipality.as_deref(),
    )
    .await
    {
        Ok(reports) => list_response(StatusCode::OK, ReportsListResponse::ok(reports)),
        Err(e) => {
            tracing::error!("Report listing failed: {}", e);
            list_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ReportsListResponse::failed(MSG_LOAD_REPORTS_FAILED),
            )
        }
    }
}

async fn load_reports(
    backend: &Backend,
    category: Option<ReportCategory>,
    settlement: Option<&str>,
    municipality: Option<&str>,
) -> Result<Vec<ReportDto>> {
    let reports = backend
        .reports
        .list_verified(category, settlement, municipality)
        .await?;

    let ids: Vec<Uuid> = reports.iter().map(|r| r.id).collect();
    // A broken photo lookup degrades to markers without photos.
    let photos = match backend.reports.photos_for(&ids).await {
        Ok(photos) => photos,
        Err(e) => {
            tracing::warn!("Photo lookup failed, returning reports without photos: {}", e);
            Vec::new()
        }
    };

    let mut photos_by_report: HashMap<Uuid, Vec<PhotoDto>> = HashMap::new();
    for photo in photos {
        let url = backend.storage.public_url(&photo.storage_path);
        photos_by_report
            .entry(photo.report_id)
            .or_default()
            .push(PhotoDto {
                storage_path: photo.storage_path,
                url,
            });
    }

    Ok(reports
        .into_iter()
        .map(|report| {
            let photos = photos_by_report.remove(&report.id).unwrap_or_default();
            ReportDto::from((report, photos))
        })
        .collect())
}

/// Map data is refreshed after every submission; never let proxies cache it.
fn list_response(status: StatusCode, body: ReportsListResponse) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], Json(body)).into_response()
}

/// Submit a new report
///
/// Multipart form with text fields and one to five `images` parts. One
/// submission per client per window; the slot is released again when the
/// submission fails.
#[utoipa::path(
    post,
    path = "/reports/submit",
    request_body(content = SubmitReportForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Report stored", body = SubmitReportResponse),
        (status = 400, description = "Invalid fields or body", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
        (status = 500, description = "Submission failed and was rolled back", body = ErrorResponse),
        (status = 503, description = "Backend not configured", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn submit_report(
    State(state): State<ReportsState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<SubmitReportResponse>> {
    let client_id = identify(&headers);
    if let GateDecision::Limited = state.rate_gate.check_and_record(&client_id).await {
        tracing::info!("Rate limited submission from {}", client_id);
        return Err(AppError::RateLimited(MSG_RATE_LIMITED.to_string()));
    }

    match handle_submission(&state, multipart).await {
        Ok(response) => Ok(response),
        Err(e) => {
            // The claimed slot is only kept for stored submissions.
            state.rate_gate.forgive(&client_id).await;
            Err(e)
        }
    }
}

async fn handle_submission(
    state: &ReportsState,
    multipart: Multipart,
) -> Result<Json<SubmitReportResponse>> {
    let raw = parse_submission(multipart).await?;
    let validated = validate(&raw, &state.submission)?;

    let backend = state
        .backend
        .as_ref()
        .ok_or_else(|| AppError::Unconfigured(MSG_BACKEND_UNCONFIGURED.to_string()))?;

    let (report, paths) = backend.submissions.submit(validated, &raw.images).await?;

    let photos = paths
        .into_iter()
        .map(|path| PhotoDto {
            url: backend.storage.public_url(&path),
            storage_path: path,
        })
        .collect();

    Ok(Json(SubmitReportResponse {
        success: true,
        id: report.id,
        report: ReportDto::from((report, photos)),
    }))
}

/// Pull fields and photos out of the multipart body without interpreting
/// them. Unknown fields are ignored.
async fn parse_submission(mut multipart: Multipart) -> Result<RawSubmission> {
    let mut raw = RawSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "images" | "images[]" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(invalid_body)?;
                raw.images.push(PhotoUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {
                let value = field.text().await.map_err(invalid_body)?;
                match name.as_str() {
                    "lat" => raw.lat = Some(value),
                    "lng" => raw.lng = Some(value),
                    "severity" => raw.severity = Some(value),
                    "comment" => raw.comment = Some(value),
                    "first_name" => raw.first_name = Some(value),
                    "last_name" => raw.last_name = Some(value),
                    "category" => raw.category = Some(value),
                    "municipality" => raw.municipality = Some(value),
                    "settlement" => raw.settlement = Some(value),
                    "settlement_custom" => raw.settlement_custom = Some(value),
                    _ => {}
                }
            }
        }
    }

    Ok(raw)
}

fn invalid_body(e: axum::extract::multipart::MultipartError) -> AppError {
    tracing::warn!("Malformed multipart body: {}", e);
    AppError::BadRequest(MSG_INVALID_BODY.to_string())
}

/// Purge stale unverified reports
///
/// Meant to be hit by an external scheduler. Protected by a bearer secret
/// when `CRON_SECRET` is set, open otherwise.
#[utoipa::path(
    get,
    path = "/cron/cleanup",
    responses(
        (status = 200, description = "Cleanup finished", body = CleanupResponse),
        (status = 401, description = "Missing or wrong bearer secret", body = ErrorResponse),
        (status = 500, description = "Cleanup failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "cron"
)]
pub async fn run_cleanup(
    State(state): State<ReportsState>,
    headers: HeaderMap,
) -> Result<Json<CleanupResponse>> {
    if let Some(secret) = &state.cron_secret {
        if !bearer_authorized(&headers, secret) {
            return Err(AppError::Unauthorized(MSG_UNAUTHORIZED.to_string()));
        }
    }

    let backend = state
        .backend
        .as_ref()
        .ok_or_else(|| AppError::Internal(MSG_SERVER_ERROR.to_string()))?;

    let deleted = backend.cleanup.run().await.map_err(|e| {
        tracing::error!("Cleanup run failed: {}", e);
        AppError::Internal(MSG_CLEANUP_FAILED.to_string())
    })?;

    Ok(Json(CleanupResponse { deleted }))
}

fn bearer_authorized(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {secret}"))
        .unwrap_or(false)
}
