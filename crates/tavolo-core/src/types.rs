//! # Domain Types
//!
//! Core domain types used throughout Tavolo.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Table       │   │      Order      │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  table_id (FK)  │◄──│  order_id (FK)  │       │
//! │  │  name           │   │  status         │   │  product_id ────┼──┐    │
//! │  │  capacity       │   │  kitchen_status │   │  quantity       │  │    │
//! │  │  single_tab     │   │  date (day)     │   └─────────────────┘  │    │
//! │  └─────────────────┘   └─────────────────┘                        │    │
//! │                                                                    │    │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐  │    │
//! │  │  OrderStatus    │   │ KitchenStatus   │   │    Product      │◄─┘    │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Open           │   │  Waiting        │   │  id (UUID)      │       │
//! │  │  Closed         │   │  Preparing      │   │  price_cents    │       │
//! │  └─────────────────┘   │  Ready          │   │  stock (>= 0)   │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Aggregate Views
//! Reads never return a bare [`Order`]: they return an [`OrderView`], the
//! order with its [`Table`] and every item joined with its [`Product`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A menu product with its stock count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to waiters and in the kitchen.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Units available. Never negative; mutated by orders only through
    /// the stock ledger.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be committed from current stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Table
// =============================================================================

/// A dining table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Table {
    pub id: String,
    pub name: String,
    /// Number of seats.
    pub capacity: i64,
    /// When true, at most one open order may reference this table.
    pub single_tab: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order: `Open → Closed`, closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order is active: items may be replaced, kitchen status advanced.
    #[default]
    Open,
    /// Order is settled. Releases a single-tab table.
    Closed,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Closed => "closed",
        }
    }

    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Open)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Kitchen Status
// =============================================================================

/// Preparation stage of an open order, shown on the kitchen display.
///
/// Any stage may follow any other; only membership in this set is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum KitchenStatus {
    #[default]
    Waiting,
    Preparing,
    Ready,
}

impl KitchenStatus {
    /// Every valid stage, in display order.
    pub const ALL: [KitchenStatus; 3] = [
        KitchenStatus::Waiting,
        KitchenStatus::Preparing,
        KitchenStatus::Ready,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            KitchenStatus::Waiting => "Waiting",
            KitchenStatus::Preparing => "Preparing",
            KitchenStatus::Ready => "Ready",
        }
    }
}

impl fmt::Display for KitchenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KitchenStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KitchenStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status",
                allowed: KitchenStatus::ALL
                    .iter()
                    .map(|status| status.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order row, without its joined table and items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub table_id: String,
    pub status: OrderStatus,
    pub kitchen_status: KitchenStatus,
    /// Business day the order belongs to (not necessarily creation day).
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of an order.
///
/// `quantity` is the stock committed when the line was written; it is the
/// exact amount returned to stock when the line is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Aggregate Views
// =============================================================================

/// An order line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItemView {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub product: Product,
    /// Current unit price × quantity.
    pub line_total_cents: i64,
}

impl OrderItemView {
    pub fn new(item: OrderItem, product: Product) -> Self {
        let line_total_cents = product.price().multiply_quantity(item.quantity).cents();
        OrderItemView {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            product,
            line_total_cents,
        }
    }
}

/// A fully materialized order: the order, its table and its items with
/// products. This is what every read and write of the engine returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderView {
    pub id: String,
    pub table_id: String,
    pub table: Table,
    pub status: OrderStatus,
    pub kitchen_status: KitchenStatus,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub items: Vec<OrderItemView>,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn new(order: Order, table: Table, items: Vec<OrderItemView>) -> Self {
        let total: Money = items
            .iter()
            .map(|item| Money::from_cents(item.line_total_cents))
            .sum();

        OrderView {
            id: order.id,
            table_id: order.table_id,
            table,
            status: order.status,
            kitchen_status: order.kitchen_status,
            date: order.date,
            items,
            total_cents: total.cents(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }

    /// Committed quantity of `product_id` across all lines.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .sum()
    }
}

// =============================================================================
// Requests
// =============================================================================

/// One requested order line, as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Raw create/update order request, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRequest {
    pub table_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

/// A validated order request: parsed date, non-empty positive lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub table_id: String,
    pub date: NaiveDate,
    pub items: Vec<OrderLine>,
}

/// Product create/update request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductRequest {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

/// Table create/update request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TableRequest {
    pub name: String,
    pub capacity: i64,
    /// Omitted on update keeps the current policy.
    #[serde(default)]
    pub single_tab: Option<bool>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            price_cents,
            stock: 10,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(id: &str, product_id: &str, quantity: i64) -> OrderItem {
        OrderItem {
            id: id.to_string(),
            order_id: "o1".to_string(),
            product_id: product_id.to_string(),
            quantity,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_status_default_and_str() {
        assert_eq!(OrderStatus::default(), OrderStatus::Open);
        assert_eq!(OrderStatus::Closed.to_string(), "closed");
        assert!(OrderStatus::Open.is_open());
        assert!(!OrderStatus::Closed.is_open());
    }

    #[test]
    fn test_kitchen_status_parse() {
        assert_eq!(KitchenStatus::default(), KitchenStatus::Waiting);
        for status in KitchenStatus::ALL {
            assert_eq!(status.as_str().parse::<KitchenStatus>().unwrap(), status);
        }
        assert!("ready".parse::<KitchenStatus>().is_err());
        assert!("Served".parse::<KitchenStatus>().is_err());
        assert!("".parse::<KitchenStatus>().is_err());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Open).unwrap(), "\"open\"");
        assert_eq!(
            serde_json::to_string(&KitchenStatus::Preparing).unwrap(),
            "\"Preparing\""
        );
    }

    #[test]
    fn test_order_view_totals() {
        let now = Utc::now();
        let order = Order {
            id: "o1".to_string(),
            table_id: "t1".to_string(),
            status: OrderStatus::Open,
            kitchen_status: KitchenStatus::Waiting,
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            created_at: now,
            updated_at: now,
        };
        let table = Table {
            id: "t1".to_string(),
            name: "T1".to_string(),
            capacity: 4,
            single_tab: true,
            created_at: now,
            updated_at: now,
        };
        let items = vec![
            OrderItemView::new(item("i1", "p1", 2), product("p1", 250)),
            OrderItemView::new(item("i2", "p2", 1), product("p2", 900)),
            OrderItemView::new(item("i3", "p1", 1), product("p1", 250)),
        ];

        let view = OrderView::new(order, table, items);
        assert_eq!(view.items[0].line_total_cents, 500);
        assert_eq!(view.total_cents, 1650);
        assert_eq!(view.quantity_of("p1"), 3);
        assert_eq!(view.quantity_of("p3"), 0);
    }
}
