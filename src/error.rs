use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

/// SQLSTATE raised when `statement_timeout` cancels a query
const QUERY_CANCELED: &str = "57014";

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// True when the request may succeed if retried unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(e)) => {
                e.code().as_deref() == Some(QUERY_CANCELED)
            }
            AppError::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }

    /// Level at which the failure is written to the server log, if at all.
    ///
    /// Client errors are left to the access log.
    pub fn log_level(&self) -> Option<log::Level> {
        match self {
            _ if self.is_retryable() => Some(log::Level::Warn),
            AppError::Database(_) | AppError::Internal(_) => Some(log::Level::Error),
            _ => None,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NotFound",
            AppError::Validation(_) => "ValidationError",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Database(_) if self.is_retryable() => "StorageUnavailable",
            AppError::Database(_) => "DatabaseError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Database(_) if self.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Some(level) = self.log_level() {
            log::log!(level, "Request failed: {}", self);
        }

        let response = ErrorResponse {
            error: ErrorDetail {
                error_type: self.error_type().to_string(),
                message: self.to_string(),
            },
        };

        let mut builder = HttpResponse::build(self.status_code());
        if self.is_retryable() {
            builder.insert_header(("Retry-After", "1"));
        }
        builder.json(response)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
