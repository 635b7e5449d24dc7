use sqlx::{PgPool, error::ErrorKind};
use uuid::Uuid;

use crate::app_error::AppError;

pub mod subscription_plan;
pub mod user_subscription;

/// Unique index backing the one-ACTIVE-subscription-per-user invariant.
pub const ONE_ACTIVE_PER_USER_INDEX: &str = "user_subscriptions_one_active_per_user";

const FEATURES_LOG_PREVIEW: usize = 120;

/// Decode the `features` JSONB column of a plan. NULL is an empty list; any
/// other shape is logged and treated as empty so a bad row never hides a plan.
pub fn decode_plan_features(raw: serde_json::Value, plan_id: Uuid) -> Vec<String> {
    if raw.is_null() {
        return Vec::new();
    }

    let preview: String = raw.to_string().chars().take(FEATURES_LOG_PREVIEW).collect();
    match serde_json::from_value::<Vec<String>>(raw) {
        Ok(features) => features,
        Err(err) => {
            tracing::warn!(
                plan_id = %plan_id,
                raw_json = %preview,
                error = %err,
                "Plan features are not a list of strings, ignoring them"
            );
            Vec::new()
        }
    }
}

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let sqlx::Error::Database(db_err) = &err else {
            if matches!(err, sqlx::Error::RowNotFound) {
                return AppError::NotFound;
            }
            tracing::error!(error = ?err, "Database error");
            return AppError::Database("Database operation failed".into());
        };

        match db_err.kind() {
            ErrorKind::UniqueViolation if db_err.constraint() == Some(ONE_ACTIVE_PER_USER_INDEX) => {
                tracing::warn!(error = %db_err, "Concurrent subscription change rejected");
                AppError::Conflict("Another subscription change for this user is in progress".into())
            }
            ErrorKind::UniqueViolation => {
                AppError::InvalidInput("A record with this value already exists".into())
            }
            ErrorKind::ForeignKeyViolation => {
                AppError::InvalidInput("Referenced plan does not exist".into())
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
