use config::{Config, Environment, File};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::errors::AppError;

/// Runtime configuration, layered from `config/default.toml`, an optional
/// per-environment file and `APP_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment (development / test / production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Capacity of the in-process domain event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Request timeout applied by the HTTP layer (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Builds a configuration suitable for tests and embedded use.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: default_host(),
            port: default_port(),
            environment: "test".to_string(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: true,
            db_max_connections: 1,
            db_min_connections: 1,
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Loads configuration files and environment overrides.
///
/// `RUN_MODE` selects the per-environment overlay (`config/production.toml`
/// etc.); `APP_DATABASE_URL` and friends override individual keys.
pub fn load_config() -> Result<AppConfig, AppError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    let cfg = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .set_default("database_url", "sqlite://backoffice.db?mode=rwc")
        .map_err(|e| AppError::Config(e.to_string()))?
        .set_default("environment", run_mode.clone())
        .map_err(|e| AppError::Config(e.to_string()))?
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    cfg.try_deserialize()
        .map_err(|e| AppError::Config(e.to_string()))
}

/// Installs the global tracing subscriber.
pub fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_apply() {
        let cfg = AppConfig::for_database("sqlite::memory:");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_max_connections, 1);
        assert!(cfg.auto_migrate);
    }
}
