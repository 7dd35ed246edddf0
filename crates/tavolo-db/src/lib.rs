//! # tavolo-db: Order Transaction Engine for Tavolo
//!
//! This crate owns every database operation of Tavolo. It uses SQLite
//! through sqlx, and every multi-step mutation runs as one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavolo Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /orders)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tavolo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ OrderRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ KitchenRepo   │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs,     │    │ ProductRepo   │    │  _schema.sql │  │   │
//! │  │   │ busy_timeout  │    │ TableRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   products · dining_tables · orders · order_items               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repositories (order, kitchen, product, table)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tavolo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./tavolo.db")).await?;
//!
//! let queue = db.kitchen().queue().await?;
//! let order = db.kitchen().advance(&queue[0].id, "Preparing").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

pub use repository::kitchen::KitchenRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::table::TableRepository;
