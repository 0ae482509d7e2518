//! # Checkout Engine
//!
//! Turns selected cart lines into a paid order, atomically.
//!
//! ## Transaction Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          checkout(user, line ids)                       │
//! │                                                                         │
//! │  outside the transaction                                               │
//! │  ├── cart for user                 missing → NotFound                   │
//! │  ├── select_lines(cart, ids)       empty   → InvalidRequest             │
//! │  └── lock_order(lines)             product ids, ascending               │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │  ├── lock products in that order   (first write takes the db lock)     │
//! │  ├── re-read selected lines        vanished lines dropped               │
//! │  ├── plan_checkout(lines, locked)  short → InsufficientStock            │
//! │  ├── INSERT order (PAID) + items   prices copied from locked rows       │
//! │  ├── UPDATE stock - qty            guarded: stock >= qty                │
//! │  └── DELETE consumed cart lines                                         │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any error drops the transaction: no order, no decrement, cart intact. │
//! │  Transient errors replay the whole thing under the retry policy.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use spot_core::{
    lock_order, plan_checkout, select_lines, CoreError, Order, OrderView, Product, UserId,
};
use spot_db::Database;
use tracing::{debug, info, instrument, warn};

use crate::error::{ShopError, ShopResult};
use crate::retry::RetryPolicy;

/// Cart-to-order conversion.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    db: Database,
    retry: RetryPolicy,
}

impl CheckoutEngine {
    pub fn new(db: Database, retry: RetryPolicy) -> Self {
        CheckoutEngine { db, retry }
    }

    /// Checks out the selected lines of the user's cart.
    ///
    /// Ids that are unknown or belong to another cart are ignored; duplicates
    /// count once. Lines that were not selected stay in the cart.
    ///
    /// ## Errors
    /// - `InvalidRequest`: empty selection, or nothing selected is in the cart
    /// - `NotFound`: the user has no cart
    /// - `InsufficientStock`: some product cannot cover its combined quantity
    /// - `Transient`: lock contention outlasted the retry policy
    #[instrument(
        skip(self, user, selected_item_ids),
        fields(user = %user, selected = selected_item_ids.len())
    )]
    pub async fn checkout(
        &self,
        user: &UserId,
        selected_item_ids: &[String],
    ) -> ShopResult<OrderView> {
        if selected_item_ids.is_empty() {
            return Err(CoreError::NothingSelected.into());
        }

        self.retry
            .run("checkout", move || self.try_checkout(user, selected_item_ids))
            .await
    }

    async fn try_checkout(
        &self,
        user: &UserId,
        selected_item_ids: &[String],
    ) -> ShopResult<OrderView> {
        let carts = self.db.carts();
        let products = self.db.products();
        let orders = self.db.orders();

        let cart = carts
            .find_by_user(user)
            .await?
            .ok_or(CoreError::CartNotFound)?;

        let candidates = select_lines(&carts.items(&cart.id).await?, selected_item_ids);
        if candidates.is_empty() {
            return Err(CoreError::NoValidItems.into());
        }
        let lock_ids = lock_order(&candidates);

        let mut tx = self.db.begin().await?;

        let locked: BTreeMap<String, Product> = products
            .lock_for_update(&mut tx, &lock_ids)
            .await?
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        debug!(products = locked.len(), "Products locked");

        let lines = select_lines(&carts.items_in_tx(&mut tx, &cart.id).await?, selected_item_ids);
        if lines.is_empty() {
            return Err(CoreError::NoValidItems.into());
        }
        if let Some(line) = lines.iter().find(|line| !locked.contains_key(&line.product_id)) {
            return Err(ShopError::Transient(format!(
                "cart line {} appeared after products were locked",
                line.id
            )));
        }

        let plan = plan_checkout(&lines, &locked).map_err(|err| {
            warn!(error = %err, "Checkout rejected");
            ShopError::from(err)
        })?;

        let order = Order::paid(user, plan.total);
        let items = plan.order_items(&order.id, order.created_at);

        orders.insert_order(&mut tx, &order).await?;
        orders.insert_items(&mut tx, &items).await?;

        for (product_id, quantity) in &plan.decrements {
            if !products.decrement_stock(&mut tx, product_id, *quantity).await? {
                return Err(ShopError::Conflict(format!(
                    "stock for product {} changed during checkout",
                    product_id
                )));
            }
        }

        carts.delete_items(&mut tx, &plan.cart_item_ids()).await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            total = %order.total(),
            lines = items.len(),
            "Order created"
        );

        Ok(OrderView::new(order, items))
    }
}
