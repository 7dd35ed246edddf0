//! # HTTP Routes
//!
//! All endpoints exposed to the web and mobile frontends.
//!
//! ## Route Organization
//! ```text
//! routes/
//! ├── mod.rs       ◄─── You are here (router assembly + handler tests)
//! ├── orders.rs    ◄─── Order lifecycle, listings, kitchen status
//! ├── kitchen.rs   ◄─── Kitchen queue
//! ├── products.rs  ◄─── Product catalog CRUD
//! ├── tables.rs    ◄─── Table CRUD + availability
//! └── health.rs    ◄─── Liveness probe
//! ```
//!
//! ## How a Request Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fetch('/orders', { method: 'POST', body: JSON.stringify(order) })      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  TraceLayer span ──► handler(State<AppState>, Json<OrderRequest>)       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  tavolo-db repository (one transaction)                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  201 + OrderView   or   ApiError {code, message}                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod kitchen;
pub mod orders;
pub mod products;
pub mod tables;

/// Every route of the API, still waiting for its state.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(orders::router())
        .merge(kitchen::router())
        .merge(products::router())
        .merge(tables::router())
        .merge(health::router())
}

// =============================================================================
// Handler Tests
// =============================================================================
