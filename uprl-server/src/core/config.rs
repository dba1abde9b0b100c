use crate::ingest::IngestConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
///
/// # Environment variables
///
/// Every knob can be overridden via environment variables:
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/uprl | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | DB_FILE | uprl.redb | Fact store filename under WORK_DIR |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | EVENT_TIMEOUT_MS | 30000 | Per-event pipeline budget |
/// | STORAGE_TIMEOUT_MS | 5000 | Scope-lock acquisition budget |
/// | LOCK_ATTEMPTS | 3 | Scope-lock attempts before conflict |
/// | STORAGE_ATTEMPTS | 3 | Commit attempts before DLQ |
/// | BACKOFF_BASE_MS | 100 | Base commit retry backoff |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown budget |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/uprl HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Fact store filename (relative to work_dir)
    pub db_file: String,
    /// development | staging | production
    pub environment: String,
    /// Per-event pipeline budget (ms)
    pub event_timeout_ms: u64,
    /// Scope-lock acquisition budget (ms)
    pub storage_timeout_ms: u64,
    /// Scope-lock attempts before VersionConflictError
    pub lock_attempts: u32,
    /// Commit attempts before StorageError is dead-lettered
    pub storage_attempts: u32,
    /// Base commit retry backoff (ms)
    pub backoff_base_ms: u64,
    /// Graceful shutdown budget (ms)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/uprl".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "uprl.redb".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            event_timeout_ms: std::env::var("EVENT_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            storage_timeout_ms: std::env::var("STORAGE_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            lock_attempts: std::env::var("LOCK_ATTEMPTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            storage_attempts: std::env::var("STORAGE_ATTEMPTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            backoff_base_ms: std::env::var("BACKOFF_BASE_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(100),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// Override work_dir and port (test scenarios)
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Full path of the fact store database
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }

    /// Pipeline tuning derived from this configuration
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            event_timeout: Duration::from_millis(self.event_timeout_ms),
            lock_timeout: Duration::from_millis(self.storage_timeout_ms),
            lock_attempts: self.lock_attempts,
            storage_attempts: self.storage_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }

    /// Whether running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
