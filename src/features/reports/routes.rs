use axum::{
    routing::{get, post},
    Router,
};

use crate::features::reports::handlers::{self, ReportsState};

/// Create routes for the reports feature
///
/// All routes are public; the cleanup trigger guards itself with the
/// configured bearer secret.
pub fn routes(state: ReportsState) -> Router {
    Router::new()
        .route("/reports", get(handlers::list_reports))
        .route("/reports/submit", post(handlers::submit_report))
        .route("/cron/cleanup", get(handlers::run_cleanup))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{header, HeaderName, HeaderValue, StatusCode};
    use axum_test::{TestResponse, TestServer};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    use super::routes;
    use crate::core::config::{RateLimitConfig, SubmissionConfig};
    use crate::features::rate_limits::services::{InMemoryRateStore, RateGate, RateStore};
    use crate::features::reports::handlers::ReportsState;
    use crate::shared::clock::{Clock, SystemClock};
    use crate::shared::constants::{
        MSG_BACKEND_UNCONFIGURED, MSG_CUSTOM_SETTLEMENT_REQUIRED, MSG_IMAGE_COUNT,
        MSG_INVALID_FIELDS, MSG_NOT_AN_IMAGE, MSG_RATE_LIMITED, MSG_SERVER_ERROR,
        MSG_UNAUTHORIZED, SETTLEMENT_OTHER, UNKNOWN_CLIENT_ID,
    };
    use crate::shared::test_helpers::MultipartBuilder;

    fn rate_config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            window_secs: 300,
            exempt_ips: Vec::new(),
        }
    }

    fn unconfigured_state(gate: RateGate) -> ReportsState {
        ReportsState {
            backend: None,
            rate_gate: Arc::new(gate),
            submission: SubmissionConfig {
                max_image_bytes: 4 * 1024 * 1024,
                default_municipality: "Lovech".to_string(),
                default_settlement: "Lovech".to_string(),
            },
            cron_secret: None,
        }
    }

    fn server(state: ReportsState) -> TestServer {
        TestServer::new(routes(state)).unwrap()
    }

    fn default_server() -> TestServer {
        server(unconfigured_state(RateGate::in_memory(&rate_config())))
    }

    fn valid_form() -> MultipartBuilder {
        MultipartBuilder::new()
            .text("lat", "43.1332")
            .text("lng", "24.7172")
            .text("severity", "2")
            .text("first_name", "Иван")
            .text("last_name", "Петров")
            .text("category", "pothole")
            .file("images", "dupka.jpg", "image/jpeg", b"fake image bytes")
    }

    async fn post_form(server: &TestServer, form: MultipartBuilder) -> TestResponse {
        let (content_type, body) = form.build();
        server
            .post("/reports/submit")
            .content_type(&content_type)
            .bytes(body.into())
            .await
    }

    fn error_of(response: &TestResponse) -> String {
        let body: Value = response.json();
        body["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_listing_without_a_backend_is_an_empty_ok() {
        let server = default_server();

        let response = server.get("/reports").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({ "reports": [] }));
        assert_eq!(response.header(header::CACHE_CONTROL), "no-store");

        let filtered = server
            .get("/reports")
            .add_query_param("category", "pothole")
            .add_query_param("settlement", "Ловеч")
            .await;
        assert_eq!(filtered.status_code(), StatusCode::OK);
        assert_eq!(filtered.json::<Value>(), json!({ "reports": [] }));
    }

    #[tokio::test]
    async fn test_valid_submission_without_a_backend_is_503() {
        let server = default_server();

        let response = post_form(&server, valid_form()).await;
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error_of(&response), MSG_BACKEND_UNCONFIGURED);
    }

    #[tokio::test]
    async fn test_failed_submission_releases_the_rate_slot() {
        let server = default_server();

        for _ in 0..3 {
            let response = post_form(&server, valid_form()).await;
            assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn test_missing_required_fields_is_400() {
        let server = default_server();

        let form = MultipartBuilder::new()
            .text("lng", "24.7172")
            .text("severity", "2")
            .text("first_name", "Иван")
            .text("last_name", "Петров")
            .file("images", "dupka.jpg", "image/jpeg", b"bytes");
        let response = post_form(&server, form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&response), MSG_INVALID_FIELDS);
    }

    #[tokio::test]
    async fn test_submission_without_photos_is_400() {
        let server = default_server();

        let form = MultipartBuilder::new()
            .text("lat", "43.1332")
            .text("lng", "24.7172")
            .text("severity", "2")
            .text("first_name", "Иван")
            .text("last_name", "Петров");
        let response = post_form(&server, form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&response), MSG_IMAGE_COUNT);
    }

    #[tokio::test]
    async fn test_other_settlement_without_a_custom_name_is_400() {
        let server = default_server();

        let response = post_form(
            &server,
            valid_form().text("settlement", SETTLEMENT_OTHER),
        )
        .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&response), MSG_CUSTOM_SETTLEMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_non_image_upload_is_400() {
        let server = default_server();

        let form = MultipartBuilder::new()
            .text("lat", "43.1332")
            .text("lng", "24.7172")
            .text("severity", "2")
            .text("first_name", "Иван")
            .text("last_name", "Петров")
            .file("images", "doc.pdf", "application/pdf", b"%PDF-1.4");
        let response = post_form(&server, form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&response), MSG_NOT_AN_IMAGE);
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_400() {
        let server = default_server();

        let response = server
            .post("/reports/submit")
            .content_type("application/json")
            .bytes(b"{}".to_vec().into())
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_repeated_submission_from_one_client_is_429() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(InMemoryRateStore::new(clock.clone()));
        store
            .set(UNKNOWN_CLIENT_ID, Utc::now(), Duration::seconds(300))
            .await;
        let gate = RateGate::new(&rate_config(), store, clock);
        let server = server(unconfigured_state(gate));

        let response = post_form(&server, valid_form()).await;
        assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error_of(&response), MSG_RATE_LIMITED);
    }

    #[tokio::test]
    async fn test_clients_are_tracked_separately() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(InMemoryRateStore::new(clock.clone()));
        store
            .set("1.2.3.4", Utc::now(), Duration::seconds(300))
            .await;
        let gate = RateGate::new(&rate_config(), store, clock);
        let server = server(unconfigured_state(gate));

        let (content_type, body) = valid_form().build();
        let fresh = server
            .post("/reports/submit")
            .content_type(&content_type)
            .add_header(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_static("5.6.7.8"),
            )
            .bytes(body.into())
            .await;
        assert_eq!(fresh.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let (content_type, body) = valid_form().build();
        let limited = server
            .post("/reports/submit")
            .content_type(&content_type)
            .add_header(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_static("1.2.3.4"),
            )
            .bytes(body.into())
            .await;
        assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_exempt_client_skips_the_gate() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(InMemoryRateStore::new(clock.clone()));
        store
            .set("10.0.0.5", Utc::now(), Duration::seconds(300))
            .await;
        let config = RateLimitConfig {
            exempt_ips: vec!["10.0.0.5".to_string()],
            ..rate_config()
        };
        let gate = RateGate::new(&config, store, clock);
        let server = server(unconfigured_state(gate));

        let (content_type, body) = valid_form().build();
        let response = server
            .post("/reports/submit")
            .content_type(&content_type)
            .add_header(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_static("10.0.0.5"),
            )
            .bytes(body.into())
            .await;

        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_disabled_gate_lets_repeat_clients_through() {
        let config = RateLimitConfig {
            enabled: false,
            ..rate_config()
        };
        let server = server(unconfigured_state(RateGate::in_memory(&config)));

        for _ in 0..2 {
            let response = post_form(&server, valid_form()).await;
            assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn test_cleanup_requires_the_secret_when_configured() {
        let mut state = unconfigured_state(RateGate::in_memory(&rate_config()));
        state.cron_secret = Some("cron-s3cret".to_string());
        let server = server(state);

        let missing = server.get("/cron/cleanup").await;
        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(&missing), MSG_UNAUTHORIZED);

        let wrong = server
            .get("/cron/cleanup")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_static("Bearer nope"),
            )
            .await;
        assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);

        // Correct secret, no backend: falls through to the backend check.
        let right = server
            .get("/cron/cleanup")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_static("Bearer cron-s3cret"),
            )
            .await;
        assert_eq!(right.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(&right), MSG_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_cleanup_runs_open_when_no_secret_is_configured() {
        let server = default_server();

        let response = server.get("/cron/cleanup").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(&response), MSG_SERVER_ERROR);
    }
}
