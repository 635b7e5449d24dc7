use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Shown in place of internal details for every 5xx response.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        if self.is_business_failure() {
            tracing::info!(error = %self, "Request rejected");
        } else {
            tracing::error!(error = ?self, "Request failed");
        }

        match self {
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, INTERNAL_ERROR_MESSAGE.into())
            }
            AppError::InvalidCredentials => {
                error_resp(StatusCode::UNAUTHORIZED, code, "Authentication required".into())
            }
            AppError::InvalidInput(msg) => error_resp(StatusCode::BAD_REQUEST, code, msg),
            e @ AppError::NotFound => error_resp(StatusCode::NOT_FOUND, code, e.to_string()),
            e @ AppError::PlanNotFound(_) => error_resp(StatusCode::NOT_FOUND, code, e.to_string()),
            AppError::PaymentFailed(msg) => error_resp(StatusCode::BAD_REQUEST, code, msg),
            e @ AppError::LimitExceeded { .. } => {
                error_resp(StatusCode::BAD_REQUEST, code, e.to_string())
            }
            AppError::Conflict(msg) => error_resp(StatusCode::CONFLICT, code, msg),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: String) -> Response {
    let body = serde_json::json!({ "success": false, "code": code.as_str(), "message": message });
    (status, Json(body)).into_response()
}
