//! # Order Repository
//!
//! The order transaction engine: create, full-replacement update, close and
//! delete, each keeping product stock and table occupancy consistent.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → Order { status: open, kitchen_status: Waiting }     │
//! │         stock -= quantity for every line                               │
//! │                                                                         │
//! │  2. REPLACE (any number of times while open)                           │
//! │     └── update() → restore old lines, commit new lines                 │
//! │                                                                         │
//! │  3. CLOSE (terminal)                                                   │
//! │     └── close() → Order { status: closed }, table released            │
//! │                                                                         │
//! │  DELETE (any state)                                                    │
//! │     └── delete() → stock += quantity for every line, rows removed      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Race Window
//! Every mutating transaction starts with a write (guarded insert or a
//! claim on the order row), so SQLite's write lock is held before any check
//! is read. Occupancy and stock checks inside the transaction are therefore
//! serialized against every other writer; a concurrent writer waits up to
//! `busy_timeout` for the lock.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::{adjust_stock, fetch_product};
use crate::repository::table::{fetch_table, find_open_order};
use tavolo_core::validation::validate_order_request;
use tavolo_core::{
    CoreError, NewOrder, Order, OrderItem, OrderItemView, OrderLine, OrderRequest, OrderView,
    Product, Table,
};

const ORDER_COLUMNS: &str = "id, table_id, status, kitchen_status, date, created_at, updated_at";

/// Repository for the order lifecycle.
///
/// ## Usage
/// ```rust,ignore
/// let order = db.orders().create(OrderRequest {
///     table_id: table.id.clone(),
///     date: "2024-03-10".into(),
///     items: vec![OrderLine { product_id: pizza.id.clone(), quantity: 2 }],
/// }).await?;
///
/// let closed = db.orders().close(&order.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates an open order and commits stock for every line.
    ///
    /// ## Steps
    /// ```text
    /// validate request ── InvalidInput
    ///      │
    ///      ▼
    /// resolve table ───── NotFound
    ///      │
    ///      ▼
    /// single_tab occupied? ── Conflict (names the open order)
    ///      │
    ///      ▼
    /// products exist, stock >= quantity? ── InvalidInput / InsufficientStock
    ///      │
    ///      ▼
    /// BEGIN
    ///   guarded INSERT order (re-checks occupancy)
    ///   guarded stock decrement + INSERT item, per line
    /// COMMIT
    /// ```
    pub async fn create(&self, request: OrderRequest) -> DbResult<OrderView> {
        let new_order = validate_order_request(request)?;

        debug!(table_id = %new_order.table_id, date = %new_order.date, lines = new_order.items.len(), "Creating order");

        // Fast-fail checks, outside the write lock
        {
            let mut conn = self.pool.acquire().await?;

            let table = fetch_table(&mut conn, &new_order.table_id)
                .await?
                .ok_or_else(|| DbError::not_found("Table", &new_order.table_id))?;

            if table.single_tab {
                if let Some(open) = find_open_order(&mut conn, &table.id, None).await? {
                    warn!(table = %table.name, order_id = %open.id, "Table already has an open order");
                    return Err(CoreError::TableOccupied {
                        table: table.name,
                        order_id: open.id,
                    }
                    .into());
                }
            }

            check_stock(&mut conn, &new_order.items).await?;
        }

        let order_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Guarded insert: refuses a second open order on a single-tab table
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (id, table_id, status, kitchen_status, date, created_at, updated_at)
            SELECT ?1, ?2, 'open', 'Waiting', ?3, ?4, ?4
            WHERE NOT EXISTS (
                SELECT 1
                FROM dining_tables t
                JOIN orders o ON o.table_id = t.id AND o.status = 'open'
                WHERE t.id = ?2 AND t.single_tab = 1
            )
            "#,
        )
        .bind(&order_id)
        .bind(&new_order.table_id)
        .bind(new_order.date)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)
        .map_err(|err| {
            if err.is_foreign_key_violation() {
                DbError::not_found("Table", &new_order.table_id)
            } else {
                err
            }
        })?;

        if inserted.rows_affected() == 0 {
            let table = fetch_table(&mut tx, &new_order.table_id)
                .await?
                .ok_or_else(|| DbError::not_found("Table", &new_order.table_id))?;
            let open = find_open_order(&mut tx, &table.id, None).await?;
            warn!(table = %table.name, "Lost race for single-tab table");
            return Err(CoreError::TableOccupied {
                table: table.name,
                order_id: open.map(|o| o.id).unwrap_or_default(),
            }
            .into());
        }

        commit_lines(&mut tx, &order_id, &new_order.items).await?;

        let view = load_view(&mut tx, &order_id).await?;
        tx.commit().await?;

        info!(
            order_id = %view.id,
            table = %view.table.name,
            date = %view.date,
            total_cents = view.total_cents,
            "Order created"
        );

        Ok(view)
    }

    /// Replaces table, date and every line of an open order.
    ///
    /// For stock this is delete-then-create: all old quantities are
    /// restored before the new lines are checked and committed, so an order
    /// may grow into the stock it already held.
    ///
    /// ## Errors
    /// - `NotFound`: no such order
    /// - `InvalidState`: order is closed
    /// - `InvalidInput`: bad request, unknown new table, unknown product
    /// - `Conflict`: moving onto an occupied single-tab table
    /// - `InsufficientStock`: a new line exceeds restored stock
    ///
    /// Any failure rolls back the whole replacement.
    pub async fn update(&self, order_id: &str, request: OrderRequest) -> DbResult<OrderView> {
        let mut tx = self.pool.begin().await?;

        // The order is resolved before the body is looked at
        claim_open_order(&mut tx, order_id).await?;

        let new_order = validate_order_request(request)?;
        debug!(order_id = %order_id, lines = new_order.items.len(), "Replacing order");

        let current = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let table = fetch_table(&mut tx, &new_order.table_id)
            .await?
            .ok_or_else(|| CoreError::unknown_reference("Table", &new_order.table_id))?;

        if table.id != current.table_id && table.single_tab {
            if let Some(open) = find_open_order(&mut tx, &table.id, Some(order_id)).await? {
                warn!(table = %table.name, order_id = %open.id, "Cannot move order onto occupied table");
                return Err(CoreError::TableOccupied {
                    table: table.name,
                    order_id: open.id,
                }
                .into());
            }
        }

        release_lines(&mut tx, order_id).await?;
        replace_header(&mut tx, order_id, &new_order).await?;
        commit_lines(&mut tx, order_id, &new_order.items).await?;

        let view = load_view(&mut tx, order_id).await?;
        tx.commit().await?;

        info!(order_id = %order_id, table = %view.table.name, total_cents = view.total_cents, "Order replaced");
        Ok(view)
    }

    /// Closes an open order. No stock movement; releases a single-tab table.
    ///
    /// Returns the closed order with its table.
    pub async fn close(&self, order_id: &str) -> DbResult<OrderView> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            "UPDATE orders SET status = 'closed', updated_at = ?2 WHERE id = ?1 AND status = 'open'",
        )
        .bind(order_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_open(&mut conn, order_id).await);
        }

        let view = load_view(&mut conn, order_id).await?;
        info!(order_id = %order_id, table = %view.table.name, "Order closed");
        Ok(view)
    }

    /// Deletes an order in any state and restores the stock of its lines.
    ///
    /// Returns the order as it was before deletion.
    pub async fn delete(&self, order_id: &str) -> DbResult<OrderView> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query("UPDATE orders SET updated_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        if claimed.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        let view = load_view(&mut tx, order_id).await?;

        release_lines(&mut tx, order_id).await?;

        sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(order_id = %order_id, lines = view.items.len(), "Order deleted, stock restored");
        Ok(view)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order aggregate by ID.
    pub async fn get(&self, order_id: &str) -> DbResult<OrderView> {
        let mut conn = self.pool.acquire().await?;
        load_view(&mut conn, order_id).await
    }

    /// All orders, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<OrderView>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at, rowid");
        self.list_where(&sql, None).await
    }

    /// Orders whose business date is `day`.
    pub async fn list_by_date(&self, day: NaiveDate) -> DbResult<Vec<OrderView>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE date = ?1 ORDER BY created_at, rowid"
        );
        self.list_where(&sql, Some(day)).await
    }

    /// Open orders, oldest creation first.
    pub async fn list_open_ordered_by_age(&self) -> DbResult<Vec<OrderView>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = 'open' ORDER BY created_at, rowid"
        );
        self.list_where(&sql, None).await
    }

    async fn list_where(&self, sql: &str, day: Option<NaiveDate>) -> DbResult<Vec<OrderView>> {
        let mut conn = self.pool.acquire().await?;

        let mut query = sqlx::query_as::<_, Order>(sql);
        if let Some(day) = day {
            query = query.bind(day);
        }
        let orders = query.fetch_all(&mut *conn).await?;

        materialize(&mut conn, orders).await
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

/// Advisory stock check per product, summing repeated lines.
async fn check_stock(conn: &mut SqliteConnection, lines: &[OrderLine]) -> DbResult<()> {
    let mut requested: Vec<(&str, i64)> = Vec::new();
    for line in lines {
        match requested.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => *qty += line.quantity,
            None => requested.push((line.product_id.as_str(), line.quantity)),
        }
    }

    for (product_id, quantity) in requested {
        let product = fetch_product(conn, product_id)
            .await?
            .ok_or_else(|| CoreError::unknown_reference("Product", product_id))?;

        if !product.has_stock_for(quantity) {
            warn!(product = %product.name, available = product.stock, requested = quantity, "Insufficient stock");
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: quantity,
            }
            .into());
        }
    }

    Ok(())
}

/// Decrements stock and inserts one item per line.
async fn commit_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
    lines: &[OrderLine],
) -> DbResult<()> {
    let now = Utc::now();

    for line in lines {
        adjust_stock(conn, &line.product_id, -line.quantity)
            .await
            .map_err(|err| match err {
                DbError::Domain(CoreError::NotFound { entity, id }) => {
                    CoreError::unknown_reference(entity, id).into()
                }
                other => other,
            })?;

        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Returns every item's quantity to stock and deletes the items.
async fn release_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    let items = fetch_items(conn, order_id).await?;

    for item in &items {
        adjust_stock(conn, &item.product_id, item.quantity).await?;
    }

    sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    debug!(order_id = %order_id, released = items.len(), "Order lines released");
    Ok(())
}

/// Sets table and business date of an order.
async fn replace_header(
    conn: &mut SqliteConnection,
    order_id: &str,
    new_order: &NewOrder,
) -> DbResult<()> {
    sqlx::query("UPDATE orders SET table_id = ?2, date = ?3, updated_at = ?4 WHERE id = ?1")
        .bind(order_id)
        .bind(&new_order.table_id)
        .bind(new_order.date)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Takes the write lock on an open order.
///
/// Fails with `NotFound` or `InvalidOrderStatus` when the order is not open.
pub(crate) async fn claim_open_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    let claimed =
        sqlx::query("UPDATE orders SET updated_at = ?2 WHERE id = ?1 AND status = 'open'")
            .bind(order_id)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

    if claimed.rows_affected() == 0 {
        return Err(not_open(conn, order_id).await);
    }

    Ok(())
}

/// Explains why a guarded update on `orders` matched no row.
pub(crate) async fn not_open(conn: &mut SqliteConnection, order_id: &str) -> DbError {
    match fetch_order(conn, order_id).await {
        Ok(Some(order)) => CoreError::InvalidOrderStatus {
            order_id: order.id,
            current_status: order.status.to_string(),
        }
        .into(),
        Ok(None) => DbError::not_found("Order", order_id),
        Err(err) => err,
    }
}

// =============================================================================
// Aggregate materialization
// =============================================================================

pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(order)
}

async fn fetch_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, product_id, quantity, created_at
        FROM order_items
        WHERE order_id = ?1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Loads one order with its table and items, failing with NotFound.
pub(crate) async fn load_view(conn: &mut SqliteConnection, order_id: &str) -> DbResult<OrderView> {
    let order = fetch_order(conn, order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

    let mut views = materialize(conn, vec![order]).await?;
    views
        .pop()
        .ok_or_else(|| DbError::Internal(format!("order {order_id} vanished while loading")))
}

/// Joins tables and items-with-products onto orders. Read-only.
pub(crate) async fn materialize(
    conn: &mut SqliteConnection,
    orders: Vec<Order>,
) -> DbResult<Vec<OrderView>> {
    let mut tables: HashMap<String, Table> = HashMap::new();
    let mut products: HashMap<String, Product> = HashMap::new();
    let mut views = Vec::with_capacity(orders.len());

    for order in orders {
        if !tables.contains_key(&order.table_id) {
            let table = fetch_table(conn, &order.table_id)
                .await?
                .ok_or_else(|| DbError::not_found("Table", &order.table_id))?;
            tables.insert(table.id.clone(), table);
        }
        let table = tables
            .get(&order.table_id)
            .cloned()
            .ok_or_else(|| DbError::not_found("Table", &order.table_id))?;

        let items = fetch_items(conn, &order.id).await?;
        let mut item_views = Vec::with_capacity(items.len());
        for item in items {
            if !products.contains_key(&item.product_id) {
                let product = fetch_product(conn, &item.product_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;
                products.insert(product.id.clone(), product);
            }
            let product = products
                .get(&item.product_id)
                .cloned()
                .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;
            item_views.push(OrderItemView::new(item, product));
        }

        views.push(OrderView::new(order, table, item_views));
    }

    Ok(views)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tavolo_core::{ErrorKind, KitchenStatus, OrderStatus, ProductRequest, TableRequest};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, name: &str, stock: i64) -> Product {
        db.products()
            .create(&ProductRequest {
                name: name.to_string(),
                price_cents: 850,
                stock,
            })
            .await
            .unwrap()
    }

    async fn table(db: &Database, name: &str, single_tab: bool) -> Table {
        db.tables()
            .create(&TableRequest {
                name: name.to_string(),
                capacity: 4,
                single_tab: Some(single_tab),
            })
            .await
            .unwrap()
    }

    fn request(table_id: &str, date: &str, lines: &[(&str, i64)]) -> OrderRequest {
        OrderRequest {
            table_id: table_id.to_string(),
            date: date.to_string(),
            items: lines
                .iter()
                .map(|(product_id, quantity)| OrderLine {
                    product_id: product_id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    async fn stock_of(db: &Database, product_id: &str) -> i64 {
        db.products().get(product_id).await.unwrap().stock
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_commits_stock_and_materializes() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 10).await;
        let p2 = product(&db, "Tiramisu", 4).await;

        let order = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 3), (&p2.id, 1)]))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.kitchen_status, KitchenStatus::Waiting);
        assert_eq!(order.date.to_string(), "2024-03-10");
        assert_eq!(order.table, t1);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product.name, "Margherita");
        assert_eq!(order.items[0].line_total_cents, 3 * 850);
        assert_eq!(order.total_cents, 4 * 850);

        assert_eq!(stock_of(&db, &p1.id).await, 7);
        assert_eq!(stock_of(&db, &p2.id).await, 3);
    }

    #[tokio::test]
    async fn test_single_tab_worked_example() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 10).await;

        let order = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 3)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &p1.id).await, 7);
        assert!(!db.tables().can_accept_new_order(&t1.id).await.unwrap());

        let err = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains(&order.id));
        assert_eq!(stock_of(&db, &p1.id).await, 7);

        db.orders().close(&order.id).await.unwrap();
        assert!(db.tables().can_accept_new_order(&t1.id).await.unwrap());
        assert_eq!(stock_of(&db, &p1.id).await, 7);
    }

    #[tokio::test]
    async fn test_shared_table_accepts_many_orders() {
        let db = setup().await;
        let bar = table(&db, "Bar", false).await;
        let p1 = product(&db, "Spritz", 10).await;

        for _ in 0..3 {
            db.orders()
                .create(request(&bar.id, "2024-03-10", &[(&p1.id, 1)]))
                .await
                .unwrap();
        }

        assert_eq!(db.orders().list_all().await.unwrap().len(), 3);
        assert_eq!(stock_of(&db, &p1.id).await, 7);
    }

    #[tokio::test]
    async fn test_large_orders_are_bounded_by_stock_only() {
        let db = setup().await;
        let bar = table(&db, "Bar", false).await;
        let water = product(&db, "Water", 5000).await;

        let order = db
            .orders()
            .create(request(&bar.id, "2024-03-10", &[(&water.id, 1000)]))
            .await
            .unwrap();
        assert_eq!(order.quantity_of(&water.id), 1000);
        assert_eq!(stock_of(&db, &water.id).await, 4000);

        let lines: Vec<(&str, i64)> = (0..150).map(|_| (water.id.as_str(), 1)).collect();
        let order = db
            .orders()
            .create(request(&bar.id, "2024-03-10", &lines))
            .await
            .unwrap();
        assert_eq!(order.items.len(), 150);
        assert_eq!(stock_of(&db, &water.id).await, 3850);

        let err = db
            .orders()
            .create(request(&bar.id, "2024-03-10", &[(&water.id, 3851)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(stock_of(&db, &water.id).await, 3850);
    }

    #[tokio::test]
    async fn test_create_rejections_leave_no_trace() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 2).await;

        // Unknown table
        let err = db
            .orders()
            .create(request("missing", "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // Unknown product
        let err = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 1), ("missing", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        // Repeated lines are summed against stock
        let err = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 2), (&p1.id, 1)]))
            .await
            .unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientStock {
                product,
                available,
                requested,
            }) => {
                assert_eq!(product, "Margherita");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Malformed input
        for bad in [
            request(&t1.id, "10/03/2024", &[(&p1.id, 1)]),
            request(&t1.id, "2024-03-10", &[]),
            request(&t1.id, "2024-03-10", &[(&p1.id, 0)]),
        ] {
            let err = db.orders().create(bad).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }

        assert!(db.orders().list_all().await.unwrap().is_empty());
        assert_eq!(stock_of(&db, &p1.id).await, 2);
        assert!(db.tables().can_accept_new_order(&t1.id).await.unwrap());
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_update_replacement_worked_example() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 5).await;
        let p2 = product(&db, "Tiramisu", 4).await;

        let order = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 2), (&p2.id, 1)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &p1.id).await, 3);
        assert_eq!(stock_of(&db, &p2.id).await, 3);

        let updated = db
            .orders()
            .update(&order.id, request(&t1.id, "2024-03-11", &[(&p1.id, 5)]))
            .await
            .unwrap();

        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.quantity_of(&p1.id), 5);
        assert_eq!(updated.date.to_string(), "2024-03-11");
        assert_eq!(stock_of(&db, &p1.id).await, 0);
        assert_eq!(stock_of(&db, &p2.id).await, 4);
    }

    #[tokio::test]
    async fn test_update_failure_rolls_back_everything() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 5).await;
        let p2 = product(&db, "Tiramisu", 1).await;

        let order = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 2)]))
            .await
            .unwrap();

        // P2 only has 1 left
        let err = db
            .orders()
            .update(&order.id, request(&t1.id, "2024-03-12", &[(&p1.id, 1), (&p2.id, 2)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        let unchanged = db.orders().get(&order.id).await.unwrap();
        assert_eq!(unchanged.items, order.items);
        assert_eq!(unchanged.date, order.date);
        assert_eq!(stock_of(&db, &p1.id).await, 3);
        assert_eq!(stock_of(&db, &p2.id).await, 1);

        let err = db
            .orders()
            .update(&order.id, request(&t1.id, "2024-03-12", &[("missing", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(stock_of(&db, &p1.id).await, 3);
    }

    #[tokio::test]
    async fn test_update_moves_between_tables() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let t2 = table(&db, "T2", true).await;
        let p1 = product(&db, "Margherita", 10).await;

        let first = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap();
        let second = db
            .orders()
            .create(request(&t2.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap();

        // T2 is taken by the second order
        let err = db
            .orders()
            .update(&first.id, request(&t2.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        db.orders().close(&second.id).await.unwrap();

        let moved = db
            .orders()
            .update(&first.id, request(&t2.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap();
        assert_eq!(moved.table_id, t2.id);
        assert!(db.tables().can_accept_new_order(&t1.id).await.unwrap());
        assert!(!db.tables().can_accept_new_order(&t2.id).await.unwrap());

        // Staying on its own single-tab table is fine
        db.orders()
            .update(&first.id, request(&t2.id, "2024-03-10", &[(&p1.id, 2)]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_rejections() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 10).await;

        let err = db
            .orders()
            .update("missing", request(&t1.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // A missing order wins over a bad body
        let err = db
            .orders()
            .update("missing", request("", "not-a-date", &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let order = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap();

        let err = db
            .orders()
            .update(&order.id, request("missing", "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        db.orders().close(&order.id).await.unwrap();
        let err = db
            .orders()
            .update(&order.id, request(&t1.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = db
            .orders()
            .update(&order.id, request(&t1.id, "2024-03-10", &[(&p1.id, 0)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(stock_of(&db, &p1.id).await, 9);
    }

    // -------------------------------------------------------------------------
    // Close / Delete
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_second_close_is_rejected() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 10).await;
        let order = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap();

        let closed = db.orders().close(&order.id).await.unwrap();
        assert_eq!(closed.status, OrderStatus::Closed);
        assert_eq!(closed.table.name, "T1");

        let err = db.orders().close(&order.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let stored = db.orders().get(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Closed);
        assert_eq!(stored.updated_at, closed.updated_at);

        let err = db.orders().close("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 10).await;
        let p2 = product(&db, "Tiramisu", 4).await;

        let order = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 3), (&p2.id, 2), (&p1.id, 1)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &p1.id).await, 6);

        let deleted = db.orders().delete(&order.id).await.unwrap();
        assert_eq!(deleted.id, order.id);

        assert_eq!(stock_of(&db, &p1.id).await, 10);
        assert_eq!(stock_of(&db, &p2.id).await, 4);
        assert_eq!(db.orders().get(&order.id).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(db.tables().can_accept_new_order(&t1.id).await.unwrap());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        let err = db.orders().delete(&order.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_closed_order_restores_stock() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 10).await;
        let order = db
            .orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 4)]))
            .await
            .unwrap();
        db.orders().close(&order.id).await.unwrap();

        db.orders().delete(&order.id).await.unwrap();
        assert_eq!(stock_of(&db, &p1.id).await, 10);
    }

    #[tokio::test]
    async fn test_referenced_product_cannot_be_deleted() {
        let db = setup().await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 10).await;
        db.orders()
            .create(request(&t1.id, "2024-03-10", &[(&p1.id, 1)]))
            .await
            .unwrap();

        let err = db.products().delete(&p1.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductInUse { .. })));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_by_date_is_exact_day() {
        let db = setup().await;
        let bar = table(&db, "Bar", false).await;
        let p1 = product(&db, "Spritz", 50).await;

        for date in ["2024-03-09", "2024-03-10", "2024-03-10", "2024-03-11"] {
            db.orders()
                .create(request(&bar.id, date, &[(&p1.id, 1)]))
                .await
                .unwrap();
        }

        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let orders = db.orders().list_by_date(day).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.date == day));

        let empty = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        assert!(db.orders().list_by_date(empty).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_orders_by_age() {
        let db = setup().await;
        let bar = table(&db, "Bar", false).await;
        let p1 = product(&db, "Spritz", 50).await;

        let mut ids = Vec::new();
        for _ in 0..4 {
            let order = db
                .orders()
                .create(request(&bar.id, "2024-03-10", &[(&p1.id, 1)]))
                .await
                .unwrap();
            ids.push(order.id);
        }
        db.orders().close(&ids[1]).await.unwrap();

        let open: Vec<_> = db
            .orders()
            .list_open_ordered_by_age()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(open, vec![ids[0].clone(), ids[2].clone(), ids[3].clone()]);
        assert_eq!(db.orders().list_all().await.unwrap().len(), 4);
    }

    // -------------------------------------------------------------------------
    // Concurrency (file-backed, several connections)
    // -------------------------------------------------------------------------

    async fn file_db(dir: &tempfile::TempDir) -> Database {
        Database::new(DbConfig::new(dir.path().join("tavolo.db")).max_connections(8))
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_on_single_tab_table() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let t1 = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 100).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let orders = db.orders();
            let req = request(&t1.id, "2024-03-10", &[(&p1.id, 1)]);
            handles.push(tokio::spawn(async move { orders.create(req).await }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(stock_of(&db, &p1.id).await, 99);
        assert_eq!(db.orders().list_open_ordered_by_age().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let bar = table(&db, "Bar", false).await;
        let p1 = product(&db, "Last Tiramisu", 5).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let orders = db.orders();
            let req = request(&bar.id, "2024-03-10", &[(&p1.id, 1)]);
            handles.push(tokio::spawn(async move { orders.create(req).await }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::InsufficientStock),
            }
        }

        assert_eq!(created, 5);
        assert_eq!(stock_of(&db, &p1.id).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_move_and_create_on_single_tab_table() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let target = table(&db, "T1", true).await;
        let p1 = product(&db, "Margherita", 100).await;

        for round in 0..5 {
            let origin = table(&db, &format!("Origin {round}"), false).await;
            let moving = db
                .orders()
                .create(request(&origin.id, "2024-03-10", &[(&p1.id, 1)]))
                .await
                .unwrap();

            let mut handles = Vec::new();
            for i in 0..6 {
                let orders = db.orders();
                if i == 3 {
                    let id = moving.id.clone();
                    let req = request(&target.id, "2024-03-10", &[(&p1.id, 1)]);
                    handles.push(tokio::spawn(async move { orders.update(&id, req).await }));
                } else {
                    let req = request(&target.id, "2024-03-10", &[(&p1.id, 1)]);
                    handles.push(tokio::spawn(async move { orders.create(req).await }));
                }
            }

            let mut succeeded = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => succeeded += 1,
                    Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
                }
            }
            assert_eq!(succeeded, 1);

            let open_on_target = db
                .orders()
                .list_open_ordered_by_age()
                .await
                .unwrap()
                .into_iter()
                .filter(|o| o.table.id == target.id)
                .collect::<Vec<_>>();
            assert_eq!(open_on_target.len(), 1);

            db.orders().close(&open_on_target[0].id).await.unwrap();
        }
    }
}
