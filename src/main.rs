mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::rate_limits::RateGate;
use crate::features::reports::{
    routes as reports_routes, Backend, CleanupService, CleanupWorker, ReportService, ReportsState,
    SubmissionService,
};
use crate::modules::storage::{MinioStorage, ObjectStorage};
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Database and storage together form the backend; with either missing the
    // service still starts, serves an empty map and refuses submissions.
    let backend = match (config.database.clone(), config.storage.clone()) {
        (Some(database_config), Some(storage_config)) => {
            // Create database connection pool
            let pool = database::create_pool(&database_config).await?;
            tracing::info!("Database connection pool created");

            // Run migrations automatically
            tracing::info!("Running database migrations...");
            database::run_migrations(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
            tracing::info!("Database migrations completed successfully");

            // Initialize MinIO client for photo storage
            let storage: Arc<dyn ObjectStorage> = Arc::new(
                MinioStorage::new(storage_config)
                    .map_err(|e| anyhow::anyhow!("Failed to initialize storage client: {}", e))?,
            );
            // The submit path re-checks the bucket, so startup only reports
            if let Err(e) = storage.ensure_bucket().await {
                tracing::warn!("Storage bucket not reachable yet: {}", e);
            }
            tracing::info!(
                "Storage client initialized for bucket: {}",
                storage.bucket_name()
            );

            // Initialize report services
            let reports = ReportService::new(pool.clone());
            let submissions =
                SubmissionService::new(Arc::new(reports.clone()), Arc::clone(&storage));
            let cleanup = CleanupService::new(
                Arc::new(reports.clone()),
                Arc::clone(&storage),
                config.cleanup.max_age_hours,
            );
            tracing::info!("Report services initialized");

            Some(Arc::new(Backend {
                reports,
                submissions,
                cleanup,
                storage,
            }))
        }
        _ => {
            tracing::warn!(
                "DATABASE_URL or MinIO credentials missing; running without a backend \
                 (empty report list, submissions refused)"
            );
            None
        }
    };

    // Spawn the cleanup worker (if a backend and an interval are configured)
    if let (Some(backend), Some(interval_secs)) = (&backend, config.cleanup.worker_interval_secs) {
        let worker = CleanupWorker::new(
            CleanupService::new(
                Arc::new(backend.reports.clone()),
                Arc::clone(&backend.storage),
                config.cleanup.max_age_hours,
            ),
            interval_secs,
        );
        tokio::spawn(async move {
            worker.run().await;
        });
        tracing::info!("Cleanup worker spawned (every {}s)", interval_secs);
    }

    // Initialize the per-client submission gate
    let rate_gate = Arc::new(RateGate::in_memory(&config.rate_limit));
    tracing::info!(
        "Rate gate initialized (enabled: {}, window: {}s)",
        config.rate_limit.enabled,
        config.rate_limit.window_secs
    );

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let state = ReportsState {
        backend,
        rate_gate,
        submission: config.submission.clone(),
        cron_secret: config.cleanup.cron_secret.clone(),
    };

    let app = Router::new()
        .merge(swagger)
        .merge(reports_routes::routes(state))
        .merge(health_route)
        // Room for a full photo set; axum's default caps multipart at 2MB
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
