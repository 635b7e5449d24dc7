use thiserror::Error;
use uuid::Uuid;

/// Resource kinds whose counts are capped by the user's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedResource {
    Trips,
    Clubs,
}

impl LimitedResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitedResource::Trips => "trips",
            LimitedResource::Clubs => "clubs",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Subscription plan not found: {0}")]
    PlanNotFound(Uuid),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Limit reached: your plan allows at most {max_allowed} {}", .resource.as_str())]
    LimitExceeded {
        resource: LimitedResource,
        max_allowed: i32,
    },

    /// Fatal catalog or setup problem; not recoverable per request.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Conflicting concurrent update: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            AppError::PaymentFailed(_) => ErrorCode::PaymentFailed,
            AppError::LimitExceeded { .. } => ErrorCode::LimitExceeded,
            AppError::Configuration(_) => ErrorCode::ConfigurationError,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Business-rule failures are reported to the caller as `{success:false, message}`.
    pub fn is_business_failure(&self) -> bool {
        matches!(
            self,
            AppError::NotFound
                | AppError::PlanNotFound(_)
                | AppError::PaymentFailed(_)
                | AppError::LimitExceeded { .. }
                | AppError::InvalidInput(_)
                | AppError::Conflict(_)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    InvalidCredentials,
    InvalidInput,
    NotFound,
    PlanNotFound,
    PaymentFailed,
    LimitExceeded,
    ConfigurationError,
    Conflict,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PlanNotFound => "PLAN_NOT_FOUND",
            ErrorCode::PaymentFailed => "PAYMENT_FAILED",
            ErrorCode::LimitExceeded => "LIMIT_EXCEEDED",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
