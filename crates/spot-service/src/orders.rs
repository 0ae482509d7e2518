//! # Order Service
//!
//! Read side of orders: history listing and single-order lookup. Orders are
//! only ever written by [`CheckoutEngine`](crate::CheckoutEngine).

use spot_core::validation::validate_page;
use spot_core::{CoreError, OrderPage, OrderSort, OrderView, UserId};
use spot_db::Database;
use tracing::instrument;

use crate::error::ShopResult;

/// Order history for one shop database.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    /// One page of the user's orders, newest first, each with its items.
    ///
    /// `page` is zero-based; `size` must be 1..=100.
    pub async fn list_orders(&self, user: &UserId, page: i64, size: i64) -> ShopResult<OrderPage> {
        self.list_orders_sorted(user, page, size, OrderSort::default()).await
    }

    /// Same as [`list_orders`](Self::list_orders) in a caller-chosen order.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn list_orders_sorted(
        &self,
        user: &UserId,
        page: i64,
        size: i64,
        sort: OrderSort,
    ) -> ShopResult<OrderPage> {
        validate_page(page, size)?;

        let orders = self.db.orders();
        let total = orders.count_for_user(user).await?;
        let offset = page.saturating_mul(size);
        let headers = orders.list_for_user(user, sort, size, offset).await?;

        let mut content = Vec::with_capacity(headers.len());
        for order in headers {
            let items = orders.items(&order.id).await?;
            content.push(OrderView::new(order, items));
        }

        Ok(OrderPage::new(content, total, size, page))
    }

    /// A single order. Someone else's order is reported as not found.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn get_order(&self, user: &UserId, order_id: &str) -> ShopResult<OrderView> {
        let orders = self.db.orders();

        let order = orders
            .find_for_user(user, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        let items = orders.items(&order.id).await?;

        Ok(OrderView::new(order, items))
    }
}
