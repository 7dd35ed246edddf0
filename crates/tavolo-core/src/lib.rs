//! # tavolo-core: Pure Domain Logic for Tavolo
//!
//! This crate holds the restaurant order domain: tables, products, orders and
//! their line items, plus the rules that can be checked without touching the
//! database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavolo Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Web / Mobile Frontends (TypeScript)                │   │
//! │  │    Tables ──► Create Order ──► Kitchen View ──► Calendar        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tavolo-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │  Order    │  │   Money   │  │ CoreError │  │  requests │  │   │
//! │  │   │  Table    │  │  totals   │  │ ErrorKind │  │  dates    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tavolo-db (Order Transaction Engine)              │   │
//! │  │         SQLite queries, migrations, transactional repos         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Table, Order, OrderItem, statuses, views)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types and the error taxonomy
//! - [`validation`] - Request and input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tavolo_core::KitchenStatus;
//!
//! let status: KitchenStatus = "Preparing".parse().unwrap();
//! assert_eq!(status, KitchenStatus::Preparing);
//! assert!("Cooking".parse::<KitchenStatus>().is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Wire format of an order's business date.
pub const BUSINESS_DATE_FORMAT: &str = "%Y-%m-%d";

/// Minimum length of a product name.
pub const MIN_PRODUCT_NAME_LEN: usize = 3;
