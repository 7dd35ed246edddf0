//! # Table Repository
//!
//! Dining table CRUD and the occupancy resolver.
//!
//! ## Occupancy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Can table T accept a new order?                        │
//! │                                                                         │
//! │  T.single_tab = false ──────────────────────────────► yes, always      │
//! │                                                                         │
//! │  T.single_tab = true                                                   │
//! │       │                                                                 │
//! │       ├── open order on T exists? ──► no  (Conflict names the order)   │
//! │       └── otherwise               ──► yes                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Answers are point-in-time snapshots. The order engine repeats the check
//! inside its write transaction, where it cannot race.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tavolo_core::validation::validate_table_request;
use tavolo_core::{CoreError, Order, Table, TableRequest};

const TABLE_COLUMNS: &str = "id, name, capacity, single_tab, created_at, updated_at";

/// Repository for dining tables.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Lists every table, by name.
    pub async fn list(&self) -> DbResult<Vec<Table>> {
        let sql = format!("SELECT {TABLE_COLUMNS} FROM dining_tables ORDER BY name, id");
        let tables = sqlx::query_as::<_, Table>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(tables)
    }

    /// Lists tables that can accept a new order right now.
    pub async fn list_available(&self) -> DbResult<Vec<Table>> {
        let tables = sqlx::query_as::<_, Table>(
            r#"
            SELECT t.id, t.name, t.capacity, t.single_tab, t.created_at, t.updated_at
            FROM dining_tables t
            WHERE t.single_tab = 0
               OR NOT EXISTS (
                    SELECT 1 FROM orders o
                    WHERE o.table_id = t.id AND o.status = 'open'
               )
            ORDER BY t.name, t.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = tables.len(), "Listed available tables");
        Ok(tables)
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Table>> {
        let mut conn = self.pool.acquire().await?;
        fetch_table(&mut conn, id).await
    }

    /// Gets a table by ID, failing with NotFound if absent.
    pub async fn get(&self, id: &str) -> DbResult<Table> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Table", id))
    }

    /// Creates a table. `single_tab` defaults to true.
    pub async fn create(&self, request: &TableRequest) -> DbResult<Table> {
        validate_table_request(request)?;

        let now = Utc::now();
        let table = Table {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            capacity: request.capacity,
            single_tab: request.single_tab.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO dining_tables (id, name, capacity, single_tab, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&table.id)
        .bind(&table.name)
        .bind(table.capacity)
        .bind(table.single_tab)
        .bind(table.created_at)
        .bind(table.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %table.id, name = %table.name, single_tab = table.single_tab, "Table created");
        Ok(table)
    }

    /// Updates name and capacity; `single_tab` only when given.
    pub async fn update(&self, id: &str, request: &TableRequest) -> DbResult<Table> {
        validate_table_request(request)?;

        debug!(id = %id, "Updating table");

        let result = sqlx::query(
            r#"
            UPDATE dining_tables
            SET name = ?2,
                capacity = ?3,
                single_tab = COALESCE(?4, single_tab),
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(request.name.trim())
        .bind(request.capacity)
        .bind(request.single_tab)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        self.get(id).await
    }

    /// Deletes a table.
    ///
    /// ## Errors
    /// - `NotFound` if absent
    /// - `TableHasOpenOrders` while an open order references it
    /// - `ForeignKeyViolation` while closed orders still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        // Claim the row first so no order can be opened on it meanwhile
        let claimed = sqlx::query("UPDATE dining_tables SET updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        if claimed.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        if find_open_order(&mut tx, id, None).await?.is_some() {
            let table = fetch_table(&mut tx, id)
                .await?
                .ok_or_else(|| DbError::not_found("Table", id))?;
            return Err(CoreError::TableHasOpenOrders { table: table.name }.into());
        }

        sqlx::query("DELETE FROM dining_tables WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, "Table deleted");
        Ok(())
    }

    /// True when the table may receive a new order now.
    ///
    /// Fails with `NotFound` if the table is absent.
    pub async fn can_accept_new_order(&self, table_id: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let table = fetch_table(&mut conn, table_id)
            .await?
            .ok_or_else(|| DbError::not_found("Table", table_id))?;

        if !table.single_tab {
            return Ok(true);
        }

        Ok(find_open_order(&mut conn, table_id, None).await?.is_none())
    }

    /// The open order on the table, if any, skipping `excluding`.
    pub async fn find_open_order(
        &self,
        table_id: &str,
        excluding: Option<&str>,
    ) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        find_open_order(&mut conn, table_id, excluding).await
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

/// Fetches a table on the given connection.
pub(crate) async fn fetch_table(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Table>> {
    let sql = format!("SELECT {TABLE_COLUMNS} FROM dining_tables WHERE id = ?1");
    let table = sqlx::query_as::<_, Table>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(table)
}

/// Oldest open order on `table_id`, ignoring the order `excluding`.
pub(crate) async fn find_open_order(
    conn: &mut SqliteConnection,
    table_id: &str,
    excluding: Option<&str>,
) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, table_id, status, kitchen_status, date, created_at, updated_at
        FROM orders
        WHERE table_id = ?1
          AND status = 'open'
          AND (?2 IS NULL OR id <> ?2)
        ORDER BY created_at, rowid
        LIMIT 1
        "#,
    )
    .bind(table_id)
    .bind(excluding)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

// =============================================================================
// Unit Tests
// =============================================================================
