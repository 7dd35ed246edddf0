//! # Error Types
//!
//! Domain-specific error types for tavolo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tavolo-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tavolo-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  server errors (in app)                                                │
//! │  └── ApiError         - What the HTTP client sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error can be classified into an [`ErrorKind`], the taxonomy the
//! HTTP layer maps onto status codes.

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of every failure the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced order, table or product does not exist.
    NotFound,
    /// Malformed date, empty item list, bad quantity, unknown status...
    InvalidInput,
    /// A single-tab table already has an open order.
    Conflict,
    /// Requested quantity exceeds available stock.
    InsufficientStock,
    /// The entity is not in a state that allows the operation.
    InvalidState,
    /// Storage or transaction failure not caused by the caller.
    InternalFailure,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Each carries enough
/// context (id or name) to identify the offending entity.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The entity addressed by the operation does not exist.
    ///
    /// ## When This Occurs
    /// - `GET /orders/{id}` with an unknown id
    /// - Creating an order for a table that was deleted
    /// - Adjusting stock of a product that was deleted
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A request body references an entity that does not exist.
    ///
    /// Unlike [`CoreError::NotFound`] this is the caller's input being
    /// wrong, e.g. an order line naming an unknown product.
    #[error("{entity} referenced by request not found: {id}")]
    UnknownReference { entity: &'static str, id: String },

    /// A single-tab table already has an open order.
    ///
    /// ## User Workflow
    /// ```text
    /// Waiter opens order on T1 (single_tab)
    ///      │
    ///      ▼
    /// Second waiter opens order on T1
    ///      │
    ///      ▼
    /// TableOccupied { table: "T1", order_id: "..." }
    ///      │
    ///      ▼
    /// UI shows: "Table T1 already has an open order"
    /// ```
    #[error("Table {table} already has an open order (Order ID: {order_id})")]
    TableOccupied { table: String, order_id: String },

    /// Insufficient stock to commit an order line.
    #[error("Insufficient stock for product {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Closing an already closed order
    /// - Replacing the items of a closed order
    /// - Advancing the kitchen status of a closed order
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    /// Table cannot be removed while orders are open on it.
    #[error("Cannot delete table {table} with open orders")]
    TableHasOpenOrders { table: String },

    /// Product cannot be removed while order items reference it.
    #[error("Cannot delete product {product}: it is referenced by existing orders")]
    ProductInUse { product: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an UnknownReference error for an entity named in a request.
    pub fn unknown_reference(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::UnknownReference {
            entity,
            id: id.into(),
        }
    }

    /// Classifies this error into the engine's taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::UnknownReference { .. } | CoreError::Validation(_) => {
                ErrorKind::InvalidInput
            }
            CoreError::TableOccupied { .. } | CoreError::ProductInUse { .. } => {
                ErrorKind::Conflict
            }
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::InvalidOrderStatus { .. } | CoreError::TableHasOpenOrders { .. } => {
                ErrorKind::InvalidState
            }
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A request field that failed validation, named as it appears on the wire.
///
/// Raised before any database work, so a rejected request never opens a
/// transaction.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} needs at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} allows at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: &'static str },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    /// Unparseable value, e.g. a date not in `YYYY-MM-DD`.
    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: &'static str, reason: String },

    /// A closed set such as the kitchen statuses.
    #[error("{field} must be one of {}", .allowed.join(", "))]
    NotAllowed {
        field: &'static str,
        allowed: Vec<String>,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Espresso".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product Espresso: available 3, requested 5"
        );

        let err = CoreError::TableOccupied {
            table: "T1".to_string(),
            order_id: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Table T1 already has an open order (Order ID: abc)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items",
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::TooShort {
            field: "name",
            min: 3,
        };
        assert_eq!(err.to_string(), "name needs at least 3 characters");
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(CoreError::not_found("Order", "1").kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::unknown_reference("Product", "1").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            CoreError::InvalidOrderStatus {
                order_id: "1".into(),
                current_status: "closed".into(),
            }
            .kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            CoreError::ProductInUse {
                product: "Water".into()
            }
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "date",
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::InvalidInput);
    }
}
