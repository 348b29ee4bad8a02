use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::shared::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports
        reports_handlers::list_reports,
        reports_handlers::submit_report,
        // Cron
        reports_handlers::run_cleanup,
    ),
    components(
        schemas(
            // Shared
            ErrorResponse,
            // Reports
            reports_models::ReportCategory,
            reports_models::ReportStatus,
            reports_dtos::PhotoDto,
            reports_dtos::ReportDto,
            reports_dtos::ReportsListResponse,
            reports_dtos::SubmitReportForm,
            reports_dtos::SubmitReportResponse,
            reports_dtos::CleanupResponse,
        )
    ),
    tags(
        (name = "reports", description = "Citizen road damage reports"),
        (name = "cron", description = "Scheduled maintenance endpoints"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Dupkite API",
        version = "0.1.0",
        description = "API documentation for Dupkite",
    )
)]
pub struct ApiDoc;

/// Adds the bearer security scheme used by the cron endpoint
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
