//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Business rule (CoreError)           │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  DbError (this module) ← storage failures + wrapped domain errors      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in server) ← code + message, HTTP status from ErrorKind     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind as SqlErrorKind;
use tavolo_core::{CoreError, ErrorKind};
use thiserror::Error;

/// Failures of the storage layer, plus domain rejections raised inside it.
#[derive(Debug, Error)]
pub enum DbError {
    /// A business rule rejected the operation (not found, conflict, stock...).
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("{field} must be unique, '{value}' is taken")]
    UniqueViolation { field: String, value: String },

    /// A row still references, or no longer finds, its parent.
    ///
    /// - Deleting a product that order items still reference
    /// - Inserting an order for a table deleted mid-request
    #[error("Referenced row violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK constraint rejected the row (e.g. `stock >= 0`).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// The database file could not be opened, or the pool is closed.
    #[error("Cannot reach database: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite refused a statement for a reason other than a constraint.
    #[error("Statement failed: {0}")]
    QueryFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Timed out waiting for a database connection")]
    PoolExhausted,

    #[error("Unexpected database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound domain error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::Domain(CoreError::not_found(entity, id))
    }

    /// Classifies this error into the engine's taxonomy.
    ///
    /// Constraint violations that reach the caller unmapped are conflicts
    /// with existing data; everything else is a storage failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Domain(err) => err.kind(),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ErrorKind::Conflict
            }
            DbError::CheckViolation { .. } => ErrorKind::InvalidInput,
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ErrorKind::InternalFailure,
        }
    }

    /// True for a foreign key violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DbError::ForeignKeyViolation { .. })
    }
}

/// Constraint failures are classified by SQLite's extended result code
/// (through [`sqlx::error::ErrorKind`]); pool errors map onto the pool
/// variants; anything else is `Internal`.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let db_err = match err {
            sqlx::Error::Database(db_err) => db_err,
            sqlx::Error::PoolTimedOut => return DbError::PoolExhausted,
            sqlx::Error::PoolClosed => {
                return DbError::ConnectionFailed("connection pool is closed".to_string())
            }
            other => return DbError::Internal(other.to_string()),
        };

        let message = db_err.message().to_string();
        match db_err.kind() {
            SqlErrorKind::UniqueViolation => DbError::UniqueViolation {
                // "UNIQUE constraint failed: products.name"
                field: message
                    .rsplit(": ")
                    .next()
                    .unwrap_or("unknown")
                    .to_string(),
                value: "unknown".to_string(),
            },
            SqlErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
            SqlErrorKind::CheckViolation | SqlErrorKind::NotNullViolation => {
                DbError::CheckViolation { message }
            }
            _ => DbError::QueryFailed(message),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<tavolo_core::ValidationError> for DbError {
    fn from(err: tavolo_core::ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_wrapped_domain_error() {
        let err = DbError::not_found("Order", "42");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Order not found: 42");
    }

    #[test]
    fn test_kind_of_storage_errors() {
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::InternalFailure);
        assert_eq!(
            DbError::ForeignKeyViolation {
                message: "FOREIGN KEY constraint failed".into()
            }
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[tokio::test]
    async fn test_sqlite_constraint_errors_are_classified() {
        use crate::pool::{Database, DbConfig};

        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err: DbError = sqlx::query(
            "INSERT INTO products (id, name, price_cents, stock, created_at, updated_at) \
             VALUES ('p', 'Water', 100, -1, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap_err()
        .into();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err: DbError = sqlx::query(
            "INSERT INTO orders (id, table_id, status, kitchen_status, date, created_at, updated_at) \
             VALUES ('o', 'missing', 'open', 'Waiting', '2024-01-01', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap_err()
        .into();
        assert!(err.is_foreign_key_violation());
    }
}
