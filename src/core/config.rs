use std::env;

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Config {
    pub app: AppConfig,
    pub database: Option<DatabaseConfig>,
    pub storage: Option<StorageConfig>,
    pub rate_limit: RateLimitConfig,
    pub submission: SubmissionConfig,
    pub cleanup: CleanupConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Per-client submission cooldown settings
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_secs: u64,
    /// Client identities exempt from the cooldown (deployment configuration,
    /// never compiled in)
    pub exempt_ips: Vec<String>,
}

/// Submission-side limits and defaults
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    /// Per-photo byte ceiling; the client compresses before upload
    pub max_image_bytes: usize,
    pub default_municipality: String,
    pub default_settlement: String,
}

/// Cleanup job settings
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Bearer secret for the HTTP trigger; unset means the trigger runs
    /// unauthenticated (documented operational posture)
    pub cron_secret: Option<String>,
    pub max_age_hours: i64,
    /// Interval for the in-process scheduler; unset disables it
    pub worker_interval_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// MinIO/S3 storage configuration for report photos
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL for photo links (defaults to endpoint)
    pub public_endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing report photos
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            submission: SubmissionConfig::from_env()?,
            cleanup: CleanupConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 25 * 1024 * 1024; // five 4MB photos + form fields

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Conservative defaults for a single-municipality deployment
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    /// Returns `None` when `DATABASE_URL` is unset: the service then runs in
    /// the degraded unconfigured mode instead of refusing to start.
    pub fn from_env() -> Result<Option<Self>, String> {
        let url = match env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
            Some(url) => url,
            None => return Ok(None),
        };

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Some(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        }))
    }
}

impl RateLimitConfig {
    const DEFAULT_WINDOW_SECS: u64 = 300; // 5 minutes

    pub fn from_env() -> Result<Self, String> {
        let enabled = env::var("RATE_LIMIT_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .map_err(|_| "RATE_LIMIT_ENABLED must be true or false".to_string())?;

        let window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_WINDOW_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "RATE_LIMIT_WINDOW_SECS must be a valid number".to_string())?;

        let exempt_ips = env::var("RATE_LIMIT_EXEMPT_IPS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            enabled,
            window_secs,
            exempt_ips,
        })
    }
}

impl SubmissionConfig {
    const DEFAULT_MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024; // 4MB, client-side compression assumed

    pub fn from_env() -> Result<Self, String> {
        let max_image_bytes = env::var("MAX_IMAGE_BYTES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_IMAGE_BYTES.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_IMAGE_BYTES must be a valid number".to_string())?;

        let default_municipality =
            env::var("DEFAULT_MUNICIPALITY").unwrap_or_else(|_| "Lovech".to_string());

        let default_settlement =
            env::var("DEFAULT_SETTLEMENT").unwrap_or_else(|_| "Lovech".to_string());

        Ok(Self {
            max_image_bytes,
            default_municipality,
            default_settlement,
        })
    }
}

impl CleanupConfig {
    const DEFAULT_MAX_AGE_HOURS: i64 = 48;

    pub fn from_env() -> Result<Self, String> {
        // Only treat a non-empty value as a configured secret
        let cron_secret = env::var("CRON_SECRET").ok().filter(|s| !s.is_empty());

        let max_age_hours = env::var("CLEANUP_MAX_AGE_HOURS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_AGE_HOURS.to_string())
            .parse::<i64>()
            .map_err(|_| "CLEANUP_MAX_AGE_HOURS must be a valid number".to_string())?;

        let worker_interval_secs = match env::var("CLEANUP_INTERVAL_SECS") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| "CLEANUP_INTERVAL_SECS must be a valid number".to_string())?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            cron_secret,
            max_age_hours,
            worker_interval_secs,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Dupkite API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Citizen road-damage reporting API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    /// Returns `None` when either MinIO credential is unset: photo storage is
    /// then unconfigured and submissions are refused with a 503.
    pub fn from_env() -> Result<Option<Self>, String> {
        let access_key = env::var("MINIO_ACCESS_KEY").ok().filter(|s| !s.is_empty());
        let secret_key = env::var("MINIO_SECRET_KEY").ok().filter(|s| !s.is_empty());

        let (access_key, secret_key) = match (access_key, secret_key) {
            (Some(a), Some(s)) => (a, s),
            _ => return Ok(None),
        };

        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "pothole-photos".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Some(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
        }))
    }
}
