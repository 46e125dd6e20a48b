use aegis_core::AppError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

mod types;

use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = match self.0 {
            AppError::Validation(message) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message))
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorResponse::new(message)),
            AppError::Conflict(message) => (StatusCode::CONFLICT, ErrorResponse::new(message)),
            AppError::DependentsExist {
                message,
                dependents,
            } => (
                StatusCode::CONFLICT,
                ErrorResponse::new(message).with_details(dependents),
            ),
            AppError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, ErrorResponse::new(message))
            }
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, ErrorResponse::new(message)),
            AppError::Internal(message) => {
                error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(payload)).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
