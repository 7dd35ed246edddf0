//! # Kitchen Repository
//!
//! The kitchen display: open orders oldest first, and the preparation stage
//! of each.
//!
//! ```text
//!   Waiting ◄──► Preparing ◄──► Ready
//! ```
//!
//! Any stage may follow any other. The stage is independent of the order's
//! open/closed status and never touches stock or occupancy.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::repository::order::{claim_open_order, load_view, OrderRepository};
use tavolo_core::{KitchenStatus, OrderView};

/// Repository for the kitchen queue.
#[derive(Debug, Clone)]
pub struct KitchenRepository {
    pool: SqlitePool,
}

impl KitchenRepository {
    /// Creates a new KitchenRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KitchenRepository { pool }
    }

    /// Open orders, the one waiting longest first.
    pub async fn queue(&self) -> DbResult<Vec<OrderView>> {
        OrderRepository::new(self.pool.clone())
            .list_open_ordered_by_age()
            .await
    }

    /// Sets the kitchen stage of an open order.
    ///
    /// ## Errors
    /// - `NotFound`: no such order
    /// - `InvalidState`: the order is closed
    /// - `InvalidInput`: `status` is not Waiting, Preparing or Ready
    pub async fn advance(&self, order_id: &str, status: &str) -> DbResult<OrderView> {
        let mut tx = self.pool.begin().await?;

        claim_open_order(&mut tx, order_id).await?;

        let status: KitchenStatus = status.trim().parse()?;

        sqlx::query("UPDATE orders SET kitchen_status = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .execute(&mut *tx)
            .await?;

        let view = load_view(&mut tx, order_id).await?;
        tx.commit().await?;

        info!(order_id = %order_id, kitchen_status = %status, "Kitchen status updated");
        Ok(view)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
