use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::migrator::Migrator;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool from application configuration.
pub async fn establish_connection(cfg: &AppConfig) -> Result<DbPool, AppError> {
    debug!(url = %cfg.database_url(), "configuring database connection");

    let mut opt = ConnectOptions::new(cfg.database_url().to_string());
    opt.max_connections(cfg.db_max_connections)
        .min_connections(cfg.db_min_connections)
        .connect_timeout(Duration::from_secs(cfg.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.db_idle_timeout_secs))
        .sqlx_logging(false);

    info!(
        max_connections = cfg.db_max_connections,
        "connecting to database"
    );

    let pool = Database::connect(opt).await?;
    Ok(pool)
}

/// Applies all pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    info!("running database migrations");
    Migrator::up(pool, None).await?;
    Ok(())
}
