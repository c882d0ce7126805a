use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Service-wide error type. Every failure a handler can produce maps to one
/// of these variants, and `ResponseError` turns them into the standard
/// `{"error": {"message", "status", "timestamp"}}` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Business-rule conflicts: insufficient balance, invalid date ranges,
    /// duplicate emails, transitions out of a terminal status. Clients see
    /// these as 400, not 409.
    #[error("{0}")]
    Conflict(String),

    /// Update carried no meaningful delta.
    #[error("{0}")]
    NoChange(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn no_change(msg: impl Into<String>) -> Self {
        ApiError::NoChange(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    /// Message exposed to clients. Server-side failures keep their detail in
    /// the logs only.
    pub(crate) fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) | ApiError::Database(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NoChange(_) => StatusCode::NOT_MODIFIED,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "request rejected");
        }

        HttpResponse::build(status).json(json!({
            "error": {
                "message": self.public_message(),
                "status": status.as_u16(),
                "timestamp": Utc::now().to_rfc3339(),
            }
        }))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// MySQL integrity-constraint violations (SQLSTATE 23000): duplicate keys
/// and foreign-key breaks. Handlers turn these into client errors instead
/// of a 500.
pub fn is_constraint_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}
