//! # Cart Service
//!
//! Cart mutations and the cart view.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item / update_item (one transaction)                               │
//! │                                                                         │
//! │  begin ──► lock product row ──► read stock under lock                   │
//! │                 │                                                       │
//! │                 ├── qty (or combined qty) > stock → InsufficientStock   │
//! │                 ▼                                                       │
//! │           insert / update cart line ──► commit                          │
//! │                                                                         │
//! │  remove_item / clear are single ownership-scoped DELETEs.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation takes the current user explicitly. A line id that belongs
//! to another user's cart is reported exactly like a missing one.

use spot_core::validation::{validate_cart_size, validate_quantity};
use spot_core::{ensure_stock, CartItem, CartView, CoreError, Product, UserId, MAX_CART_ITEMS};
use spot_db::Database;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, instrument};

use crate::error::{ShopError, ShopResult};
use crate::retry::RetryPolicy;

/// Cart operations for one shop database.
#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
    retry: RetryPolicy,
    validate_stock_on_update: bool,
}

impl CartService {
    pub fn new(db: Database, retry: RetryPolicy, validate_stock_on_update: bool) -> Self {
        CartService {
            db,
            retry,
            validate_stock_on_update,
        }
    }

    /// The user's cart with live product data.
    ///
    /// A user without a cart row gets an empty view (`id: None`, subtotal
    /// 0.00). Nothing is created.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn get_cart(&self, user: &UserId) -> ShopResult<CartView> {
        let carts = self.db.carts();

        let Some(cart) = carts.find_by_user(user).await? else {
            return Ok(CartView::empty());
        };

        let lines = carts.line_views(&cart.id).await?;
        Ok(CartView::new(cart.id, lines))
    }

    /// Adds `quantity` of a product, merging into an existing line.
    ///
    /// The cart is created on first use. When the product is already in the
    /// cart the combined quantity is checked against stock.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn add_item(
        &self,
        user: &UserId,
        product_id: &str,
        quantity: i64,
    ) -> ShopResult<CartView> {
        validate_quantity(quantity)?;

        self.retry
            .run("add_item", move || self.try_add_item(user, product_id, quantity))
            .await?;

        self.get_cart(user).await
    }

    async fn try_add_item(&self, user: &UserId, product_id: &str, quantity: i64) -> ShopResult<()> {
        let carts = self.db.carts();
        let mut tx = self.db.begin().await?;

        let product = self.lock_product(&mut tx, product_id).await?;
        if !product.is_active {
            return Err(CoreError::ProductInactive(product.id).into());
        }

        let cart = carts.get_or_create(&mut tx, user).await?;

        match carts.find_item_by_product(&mut tx, &cart.id, &product.id).await? {
            Some(existing) => {
                let combined = existing.quantity + quantity;
                validate_quantity(combined)?;
                ensure_stock(&product, combined)?;

                carts.set_owned_quantity(&mut tx, user, &existing.id, combined).await?;
                debug!(line_id = %existing.id, quantity = combined, "Merged into existing line");
            }
            None => {
                ensure_stock(&product, quantity)?;

                let lines = carts.count_items(&mut tx, &cart.id).await?;
                validate_cart_size(lines)
                    .map_err(|_| CoreError::CartTooLarge { max: MAX_CART_ITEMS })?;

                carts
                    .insert_item(&mut tx, &CartItem::new(&cart.id, &product.id, quantity))
                    .await?;
            }
        }

        tx.commit().await?;
        info!(product_id = %product.id, quantity, "Item added to cart");
        Ok(())
    }

    /// Sets a line's quantity.
    ///
    /// With stock validation on, the new quantity is checked against stock
    /// read under the product lock. With it off, any quantity in range is
    /// accepted.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn update_item(
        &self,
        user: &UserId,
        item_id: &str,
        quantity: i64,
    ) -> ShopResult<CartView> {
        validate_quantity(quantity)?;

        self.retry
            .run("update_item", move || self.try_update_item(user, item_id, quantity))
            .await?;

        self.get_cart(user).await
    }

    async fn try_update_item(&self, user: &UserId, item_id: &str, quantity: i64) -> ShopResult<()> {
        let carts = self.db.carts();

        if !self.validate_stock_on_update {
            let mut tx = self.db.begin().await?;
            if !carts.set_owned_quantity(&mut tx, user, item_id, quantity).await? {
                return Err(CoreError::CartItemNotFound(item_id.to_string()).into());
            }
            tx.commit().await?;
            return Ok(());
        }

        // Which product to lock comes from outside the transaction; the line
        // is read again once the lock is held.
        let line = carts
            .find_owned_item(user, item_id)
            .await?
            .ok_or_else(|| CoreError::CartItemNotFound(item_id.to_string()))?;

        let mut tx = self.db.begin().await?;
        let product = self.lock_product(&mut tx, &line.product_id).await?;

        let line = carts
            .find_owned_item_in_tx(&mut tx, user, item_id)
            .await?
            .ok_or_else(|| CoreError::CartItemNotFound(item_id.to_string()))?;

        ensure_stock(&product, quantity)?;
        carts.set_owned_quantity(&mut tx, user, &line.id, quantity).await?;

        tx.commit().await?;
        debug!(line_id = %line.id, quantity, "Cart line updated");
        Ok(())
    }

    /// Deletes one line from the user's cart.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn remove_item(&self, user: &UserId, item_id: &str) -> ShopResult<()> {
        let removed = self
            .retry
            .run("remove_item", move || async move {
                self.db
                    .carts()
                    .delete_owned_item(user, item_id)
                    .await
                    .map_err(ShopError::from)
            })
            .await?;

        if !removed {
            return Err(CoreError::CartItemNotFound(item_id.to_string()).into());
        }

        debug!(line_id = %item_id, "Cart line removed");
        Ok(())
    }

    /// Deletes every line. The cart row stays; no cart is not an error.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn clear(&self, user: &UserId) -> ShopResult<()> {
        let removed = self
            .retry
            .run("clear_cart", move || async move {
                self.db.carts().clear(user).await.map_err(ShopError::from)
            })
            .await?;

        debug!(removed, "Cart cleared");
        Ok(())
    }

    async fn lock_product(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        product_id: &str,
    ) -> ShopResult<Product> {
        let locked = self
            .db
            .products()
            .lock_for_update(tx, &[product_id.to_string()])
            .await?;

        locked
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }
}
