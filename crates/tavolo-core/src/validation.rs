//! # Validation Module
//!
//! Request validation for Tavolo.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  └── JSON deserialization into request types                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Dates parsed into NaiveDate                                       │
//! │  └── Lines, quantities, names, prices, capacities                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: tavolo-db (inside the transaction)                           │
//! │  ├── Referenced rows exist                                             │
//! │  ├── Guarded stock decrement, CHECK (stock >= 0)                       │
//! │  └── Guarded insert for single-tab occupancy                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tavolo_core::validation::{parse_business_date, validate_quantity};
//!
//! let day = parse_business_date("2024-03-10").unwrap();
//! assert_eq!(day.to_string(), "2024-03-10");
//!
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{NewOrder, OrderLine, OrderRequest, ProductRequest, TableRequest};
use crate::{BUSINESS_DATE_FORMAT, MIN_PRODUCT_NAME_LEN};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Dates
// =============================================================================

/// Parses a business date in `YYYY-MM-DD` form.
///
/// ## Example
/// ```rust
/// use tavolo_core::validation::parse_business_date;
///
/// assert!(parse_business_date("2024-02-29").is_ok());
/// assert!(parse_business_date("2023-02-29").is_err());
/// assert!(parse_business_date("10/03/2024").is_err());
/// assert!(parse_business_date("").is_err());
/// ```
pub fn parse_business_date(raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: "date",
        });
    }

    NaiveDate::parse_from_str(raw, BUSINESS_DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidFormat {
            field: "date",
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

// =============================================================================
// Order Requests
// =============================================================================

/// A line quantity: at least one unit. Stock bounds it from above.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity",
        });
    }
    Ok(())
}

/// Validates the lines of an order request.
///
/// ## Rules
/// - At least one line
/// - Every line names a product
/// - Every quantity passes [`validate_quantity`]
///
/// The same product may appear on several lines.
pub fn validate_order_lines(lines: &[OrderLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items",
        });
    }

    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id",
            });
        }
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

/// Validates a create/update order request and parses its date.
///
/// ## User Workflow
/// ```text
/// POST /orders {table_id, date, items}
///      │
///      ▼
/// validate_order_request ← THIS FUNCTION
///      │
///      ├── table_id empty?   → Required
///      ├── date malformed?   → InvalidFormat
///      ├── items empty?      → Required
///      ├── quantity <= 0?    → MustBePositive
///      │
///      └── OK → NewOrder handed to the order engine
/// ```
pub fn validate_order_request(request: OrderRequest) -> ValidationResult<NewOrder> {
    let table_id = request.table_id.trim().to_string();
    if table_id.is_empty() {
        return Err(ValidationError::Required {
            field: "table_id",
        });
    }

    let date = parse_business_date(&request.date)?;
    validate_order_lines(&request.items)?;

    Ok(NewOrder {
        table_id,
        date,
        items: request.items,
    })
}

// =============================================================================
// Catalog Requests
// =============================================================================

/// Menu item name: 3 to 200 characters once trimmed.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name",
        });
    }

    let len = name.chars().count();
    if len < MIN_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooShort {
            field: "name",
            min: MIN_PRODUCT_NAME_LEN,
        });
    }

    if len > 200 {
        return Err(ValidationError::TooLong {
            field: "name",
            max: 200,
        });
    }

    Ok(())
}

/// Validates a unit price in cents. Free items are not allowed.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price_cents",
        });
    }

    Ok(())
}

/// Validates a stock count (zero allowed).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative { field: "stock" });
    }

    Ok(())
}

/// Validates a product create/update request.
pub fn validate_product_request(request: &ProductRequest) -> ValidationResult<()> {
    validate_product_name(&request.name)?;
    validate_price_cents(request.price_cents)?;
    validate_stock(request.stock)
}

/// Validates a table create/update request.
pub fn validate_table_request(request: &TableRequest) -> ValidationResult<()> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name",
        });
    }
    if name.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "name",
            max: 50,
        });
    }

    if request.capacity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "capacity",
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
