//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CHECKOUT (inside the checkout transaction)                         │
//! │     └── insert_order()  → Order { status: Paid, total }                │
//! │     └── insert_items()  → OrderItem × N (snapshot prices)              │
//! │                                                                         │
//! │  2. HISTORY (pool reads, after commit)                                 │
//! │     └── list_for_user() → sorted by OrderSort, paged                   │
//! │     └── find_for_user() + items()                                      │
//! │                                                                         │
//! │  Orders are never updated or deleted here.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::DbResult;
use spot_core::{Order, OrderItem, OrderSort, OrderSortField, SortDirection, UserId};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts the order header.
    pub async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        order: &Order,
    ) -> DbResult<()> {
        debug!(id = %order.id, total_cents = order.total_cents, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(order.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Inserts order items.
    ///
    /// ## Snapshot Pattern
    /// Title, image and unit price are copied values. Nothing here reads
    /// the products table.
    pub async fn insert_items(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        items: &[OrderItem],
    ) -> DbResult<()> {
        for item in items {
            debug!(
                order_id = %item.order_id,
                product_id = %item.product_id,
                "Inserting order item",
            );

            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id,
                    title_snapshot, image_url_snapshot, unit_price_cents,
                    quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.title_snapshot)
            .bind(&item.image_url_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Gets an order by id, only if it belongs to `user`.
    pub async fn find_for_user(&self, user: &UserId, order_id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, total_cents, created_at
            FROM orders
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all items for an order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                id, order_id, product_id,
                title_snapshot, image_url_snapshot, unit_price_cents,
                quantity, line_total_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// A page of the user's orders in `sort` order.
    ///
    /// Ties fall back to creation order in the same direction.
    pub async fn list_for_user(
        &self,
        user: &UserId,
        sort: OrderSort,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Order>> {
        debug!(user = %user, ?sort, limit, offset, "Listing orders");

        let sql = format!(
            r#"
            SELECT id, user_id, status, total_cents, created_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY {}
            LIMIT ?2 OFFSET ?3
            "#,
            order_by(sort)
        );

        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Number of orders the user has placed.
    pub async fn count_for_user(&self, user: &UserId) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = ?1")
            .bind(user.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// `ORDER BY` body for a sort. Only these fixed strings reach the SQL.
fn order_by(sort: OrderSort) -> &'static str {
    match (sort.by, sort.direction) {
        (OrderSortField::CreatedAt, SortDirection::Desc) => "created_at DESC, rowid DESC",
        (OrderSortField::CreatedAt, SortDirection::Asc) => "created_at ASC, rowid ASC",
        (OrderSortField::Total, SortDirection::Desc) => {
            "total_cents DESC, created_at DESC, rowid DESC"
        }
        (OrderSortField::Total, SortDirection::Asc) => "total_cents ASC, created_at ASC, rowid ASC",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
