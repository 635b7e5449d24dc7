use thiserror::Error;

use crate::app_error::AppError;

/// Errors that abort application startup.
///
/// Display messages are safe for logs. Debug output includes the source chain,
/// which may contain the connection string; log with `%e`.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Database migration failed")]
    Migration(#[source] sqlx::migrate::MigrateError),

    #[error("Plan catalog is not usable")]
    Catalog(#[source] AppError),

    #[error("Log file could not be created")]
    LogFile(#[source] std::io::Error),
}

impl From<sqlx::Error> for InfraError {
    fn from(e: sqlx::Error) -> Self {
        InfraError::DatabaseConnection(e)
    }
}

impl From<sqlx::migrate::MigrateError> for InfraError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        InfraError::Migration(e)
    }
}
