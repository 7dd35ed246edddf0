//! # Product Repository
//!
//! Product catalog CRUD and the stock ledger.
//!
//! ## Stock Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, compute, write back                               │
//! │     SELECT stock ... → 7                                           │
//! │     UPDATE products SET stock = 4 WHERE id = ?                     │
//! │                                                                     │
//! │  ✅ CORRECT: guarded delta inside the caller's transaction         │
//! │     UPDATE products SET stock = stock - 3                          │
//! │     WHERE id = ? AND stock >= 3                                    │
//! │                                                                     │
//! │  Two orders racing for the last 3 units: the second UPDATE         │
//! │  matches zero rows and the order fails with InsufficientStock.     │
//! │  CHECK (stock >= 0) in the schema backs this up.                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Order logic only ever touches stock through [`adjust_stock`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tavolo_core::validation::validate_product_request;
use tavolo_core::{CoreError, Product, ProductRequest};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, stock, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let espresso = repo.create(&ProductRequest {
///     name: "Espresso".into(),
///     price_cents: 250,
///     stock: 40,
/// }).await?;
///
/// // Restock 10 units
/// repo.adjust_stock(&espresso.id, 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Gets a product by ID, failing with NotFound if absent.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Creates a product.
    pub async fn create(&self, request: &ProductRequest) -> DbResult<Product> {
        validate_product_request(request)?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: request.name.trim().to_string(),
            price_cents: request.price_cents,
            stock: request.stock,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Updates a product's name, price and stock.
    ///
    /// Setting stock here is a catalog correction (inventory count), not an
    /// order movement.
    pub async fn update(&self, id: &str, request: &ProductRequest) -> DbResult<Product> {
        validate_product_request(request)?;

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, price_cents = ?3, stock = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(request.name.trim())
        .bind(request.price_cents)
        .bind(request.stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Deletes a product.
    ///
    /// Fails with `ProductInUse` while any order item references it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let product = self.get(id).await?;

        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from);

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(DbError::not_found("Product", id)),
            Ok(_) => {
                info!(id = %id, "Product deleted");
                Ok(())
            }
            Err(err) if err.is_foreign_key_violation() => Err(CoreError::ProductInUse {
                product: product.name,
            }
            .into()),
            Err(err) => Err(err),
        }
    }

    /// Adds `delta` to a product's stock and returns the updated product.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock(&mut conn, id, delta).await?;

        fetch_product(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

/// Fetches a product on the given connection.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Atomically adds signed `delta` to a product's stock.
///
/// Decrements are guarded (`stock >= quantity` inside the UPDATE), so a
/// decrement that would go below zero changes nothing.
///
/// ## Errors
/// - `NotFound` if the product does not exist
/// - `InsufficientStock` if a decrement exceeds the current stock
pub async fn adjust_stock(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<()> {
    debug!(id = %id, delta = delta, "Adjusting stock");

    let now = Utc::now();

    let result = if delta < 0 {
        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(id)
        .bind(-delta)
        .bind(now)
        .execute(&mut *conn)
        .await?
    } else {
        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?
    };

    if result.rows_affected() == 1 {
        return Ok(());
    }

    match fetch_product(conn, id).await? {
        None => Err(DbError::not_found("Product", id)),
        Some(product) => Err(CoreError::InsufficientStock {
            product: product.name,
            available: product.stock,
            requested: -delta,
        }
        .into()),
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
