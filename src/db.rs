//! Pool construction and schema management.

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;

use crate::config::StorageConfig;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Build a pool without opening any connection yet.
pub fn lazy_pool(config: &StorageConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect_lazy_with(config.connect_options())
}

/// Connect eagerly, failing if the database is unreachable.
pub async fn connect(config: &StorageConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect_with(config.connect_options())
        .await
}

/// Create the `emails` table and its indexes if absent.
///
/// Idempotent: applied migrations are tracked and skipped.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), MigrateError> {
    log::info!("checking database migration state");
    MIGRATOR.run(pool).await?;
    log::info!("database migrations up to date");
    Ok(())
}

/// Single round trip used to decide the storage mode at startup.
pub async fn check_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT NOW()").execute(pool).await?;
    Ok(())
}
