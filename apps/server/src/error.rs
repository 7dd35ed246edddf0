//! # API Error Types
//!
//! Error types for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError / CoreError / DbError / JSON rejection                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (this module) ← code from ErrorKind, safe message            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  HTTP response: status + {"code": "...", "message": "..."}             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tavolo_core::{CoreError, ErrorKind, ValidationError};
use tavolo_db::DbError;

/// API error returned by every handler.
///
/// ```json
/// {
///   "code": "CONFLICT",
///   "message": "Table T1 already has an open order (Order ID: 5f0c...)"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Malformed or invalid request (400)
    InvalidInput,

    /// Single-tab table occupied, resource in use (409)
    Conflict,

    /// Not enough stock for an order line (400)
    InsufficientStock,

    /// Operation not allowed in the current state (400)
    InvalidState,

    /// Storage failure (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidInput
            | ErrorCode::InsufficientStock
            | ErrorCode::InvalidState => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::InvalidInput => ErrorCode::InvalidInput,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::InsufficientStock => ErrorCode::InsufficientStock,
            ErrorKind::InvalidState => ErrorCode::InvalidState,
            ErrorKind::InternalFailure => ErrorCode::Internal,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
///
/// Storage failures are logged with their details and reported with a
/// generic message; everything else passes its message through.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let code = ErrorCode::from(err.kind());

        match &err {
            DbError::Domain(_) => ApiError::new(code, err.to_string()),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(code, "Resource is still referenced by other records")
            }
            DbError::UniqueViolation { .. } | DbError::CheckViolation { .. } => {
                tracing::warn!("Constraint violation: {}", err);
                ApiError::new(code, err.to_string())
            }
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => {
                tracing::error!("Database operation failed: {}", err);
                ApiError::new(ErrorCode::Internal, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::new(err.kind().into(), err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

/// Malformed JSON bodies are reported in the API's own error shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::InsufficientStock.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidState.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err: ApiError = DbError::QueryFailed("no such table: orders".into()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_domain_message_passes_through() {
        let err: ApiError = DbError::from(CoreError::TableOccupied {
            table: "T1".into(),
            order_id: "abc".into(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(
            err.message,
            "Table T1 already has an open order (Order ID: abc)"
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::InsufficientStock, "x")).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(json["message"], "x");
    }
}
