//! # Repository Module
//!
//! Database repositories for Tavolo.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │  db.orders().create(request)                                   │
//! │       ▼                                                                 │
//! │  OrderRepository ──────────┬──────────────────┐                        │
//! │  (lifecycle engine)        │                  │                        │
//! │       ▲                    ▼                  ▼                        │
//! │  KitchenRepository   ProductRepository   TableRepository               │
//! │  (status tracker)    (stock ledger)      (occupancy)                   │
//! │                                                                         │
//! │  Each repository holds a pool clone. Helpers that take a               │
//! │  `&mut SqliteConnection` run on a pool connection or inside            │
//! │  the caller's transaction alike.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and stock adjustments
//! - [`table::TableRepository`] - Table CRUD and availability
//! - [`order::OrderRepository`] - Order lifecycle and reads
//! - [`kitchen::KitchenRepository`] - Kitchen queue and status

pub mod kitchen;
pub mod order;
pub mod product;
pub mod table;
