//! Embedded schema migrations.

use sqlx::PgPool;
use tracing::info;

use deepsearch_core::error::{AppError, ErrorKind};

/// Run all pending migrations embedded in this crate.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, format!("Migration failed: {e}"), e)
        })?;

    info!("Database migrations complete");
    Ok(())
}
