//! # Application State
//!
//! Shared state handed to every axum handler.
//!
//! ## Thread Safety
//! The `Database` from `tavolo-db` wraps a `SqlitePool`, which is cheap to
//! clone and safe to share. Handlers run queries concurrently without
//! explicit locking; every order mutation is serialized by SQLite itself.
//!
//! ## Usage in Handlers
//! ```rust,ignore
//! async fn get_order(
//!     State(state): State<AppState>,
//!     Path(id): Path<String>,
//! ) -> ApiResult<Json<OrderView>> {
//!     Ok(Json(state.db().orders().get(&id).await?))
//! }
//! ```

use tavolo_db::Database;

/// State shared by all routes.
#[derive(Debug, Clone)]
pub struct AppState {
    db: Database,
}

impl AppState {
    /// Creates the state around an open database.
    pub fn new(db: Database) -> Self {
        AppState { db }
    }

    /// Returns the database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }
}
