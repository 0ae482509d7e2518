//! # Cart Repository
//!
//! Database operations for carts and cart lines.
//!
//! ## Ownership
//! ```text
//! carts (user_id UNIQUE) ──1:N──► cart_items (UNIQUE cart_id, product_id)
//!
//! Every line lookup that takes a line id from a caller also filters on
//! the owning user, so a foreign id behaves exactly like a missing one.
//! ```

use chrono::Utc;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::DbResult;
use spot_core::{Cart, CartItem, CartLineView, Money, UserId};

/// A cart line joined with its live product row.
#[derive(Debug, FromRow)]
struct CartLineRow {
    id: String,
    product_id: String,
    quantity: i64,
    title: String,
    image_url: Option<String>,
    price_cents: i64,
}

impl From<CartLineRow> for CartLineView {
    fn from(row: CartLineRow) -> Self {
        CartLineView::new(
            row.id,
            row.product_id,
            row.title,
            row.image_url,
            Money::from_cents(row.price_cents),
            row.quantity,
        )
    }
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Gets the user's cart, if one was ever created.
    pub async fn find_by_user(&self, user: &UserId) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            SELECT id, user_id, created_at, updated_at
            FROM carts
            WHERE user_id = ?1
            "#,
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Gets all lines of a cart, oldest first.
    pub async fn items(&self, cart_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, cart_id, product_id, quantity, created_at, updated_at
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a line by id, only if it belongs to `user`'s cart.
    pub async fn find_owned_item(
        &self,
        user: &UserId,
        item_id: &str,
    ) -> DbResult<Option<CartItem>> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity, ci.created_at, ci.updated_at
            FROM cart_items ci
            INNER JOIN carts c ON c.id = ci.cart_id
            WHERE ci.id = ?1 AND c.user_id = ?2
            "#,
        )
        .bind(item_id)
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Cart lines joined with live product title, image and price.
    pub async fn line_views(&self, cart_id: &str) -> DbResult<Vec<CartLineView>> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r#"
            SELECT
                ci.id, ci.product_id, ci.quantity,
                p.title, p.image_url, p.price_cents
            FROM cart_items ci
            INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?1
            ORDER BY ci.created_at, ci.id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLineView::from).collect())
    }

    // =========================================================================
    // Transactional
    // =========================================================================

    /// Returns the user's cart, creating it first if needed.
    ///
    /// `INSERT ... ON CONFLICT DO NOTHING` keeps the one-cart-per-user rule
    /// when two requests race to create it.
    pub async fn get_or_create(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user: &UserId,
    ) -> DbResult<Cart> {
        let fresh = Cart::new(user);

        let inserted = sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&fresh.id)
        .bind(&fresh.user_id)
        .bind(fresh.created_at)
        .bind(fresh.updated_at)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if inserted == 1 {
            debug!(cart_id = %fresh.id, user = %user, "Created cart");
            return Ok(fresh);
        }

        let cart = sqlx::query_as::<_, Cart>(
            r#"
            SELECT id, user_id, created_at, updated_at
            FROM carts
            WHERE user_id = ?1
            "#,
        )
        .bind(user.as_str())
        .fetch_one(&mut **tx)
        .await?;

        Ok(cart)
    }

    /// Gets all lines of a cart inside `tx`.
    pub async fn items_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        cart_id: &str,
    ) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, cart_id, product_id, quantity, created_at, updated_at
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(items)
    }

    /// Owned-line lookup inside `tx`.
    pub async fn find_owned_item_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user: &UserId,
        item_id: &str,
    ) -> DbResult<Option<CartItem>> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity, ci.created_at, ci.updated_at
            FROM cart_items ci
            INNER JOIN carts c ON c.id = ci.cart_id
            WHERE ci.id = ?1 AND c.user_id = ?2
            "#,
        )
        .bind(item_id)
        .bind(user.as_str())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(item)
    }

    /// The line for `product_id` in this cart, if any.
    pub async fn find_item_by_product(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        cart_id: &str,
        product_id: &str,
    ) -> DbResult<Option<CartItem>> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, cart_id, product_id, quantity, created_at, updated_at
            FROM cart_items
            WHERE cart_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(item)
    }

    /// Number of distinct lines in a cart.
    pub async fn count_items(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        cart_id: &str,
    ) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .fetch_one(&mut **tx)
            .await?;

        Ok(count as usize)
    }

    /// Inserts a new line.
    pub async fn insert_item(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        item: &CartItem,
    ) -> DbResult<()> {
        debug!(
            cart_id = %item.cart_id,
            product_id = %item.product_id,
            quantity = item.quantity,
            "Inserting cart item",
        );

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.cart_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Sets the quantity of a line owned by `user`.
    ///
    /// Returns `false` when the line is missing or foreign.
    pub async fn set_owned_quantity(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user: &UserId,
        item_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(item_id = %item_id, quantity = quantity, "Setting cart item quantity");

        let result = sqlx::query(
            r#"
            UPDATE cart_items
            SET quantity = ?3, updated_at = ?4
            WHERE id = ?1
              AND cart_id IN (SELECT id FROM carts WHERE user_id = ?2)
            "#,
        )
        .bind(item_id)
        .bind(user.as_str())
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes the given lines. Returns how many were removed.
    pub async fn delete_items(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        item_ids: &[String],
    ) -> DbResult<u64> {
        let mut removed = 0;
        for id in item_ids {
            removed += sqlx::query("DELETE FROM cart_items WHERE id = ?1")
                .bind(id)
                .execute(&mut **tx)
                .await?
                .rows_affected();
        }

        debug!(requested = item_ids.len(), removed = removed, "Deleted cart items");
        Ok(removed)
    }

    // =========================================================================
    // Single-statement writes (pool)
    // =========================================================================

    /// Deletes a line owned by `user`. Returns `false` when missing or foreign.
    pub async fn delete_owned_item(&self, user: &UserId, item_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE id = ?1
              AND cart_id IN (SELECT id FROM carts WHERE user_id = ?2)
            "#,
        )
        .bind(item_id)
        .bind(user.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes every line in the user's cart. The cart row stays.
    pub async fn clear(&self, user: &UserId) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?1)
            "#,
        )
        .bind(user.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
