//! # Checkout Planning
//!
//! The pure half of checkout. spot-service owns the transaction and the
//! locks; this module decides what the transaction writes.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout (one transaction)                        │
//! │                                                                         │
//! │  selected line ids                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  select_lines(cart, selected)   foreign / unknown ids dropped          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock_order(lines)              product ids, ascending, deduplicated   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [service] lock products in that order, re-read rows                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_checkout(lines, locked)   ← stock check, snapshot prices, total  │
//! │       │                                                                 │
//! │       ├── any line short? → InsufficientStock, nothing written         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [service] insert order + items, decrement stock, delete lines         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartItem, OrderItem, Product};

// =============================================================================
// Selection
// =============================================================================

/// Intersects the cart's lines with the caller's selection.
///
/// Ids that are unknown or belong to another cart are ignored. Duplicate ids
/// select a line once. Cart order is preserved.
pub fn select_lines(cart_lines: &[CartItem], selected_ids: &[String]) -> Vec<CartItem> {
    let wanted: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();

    cart_lines
        .iter()
        .filter(|line| wanted.contains(line.id.as_str()))
        .cloned()
        .collect()
}

/// Product ids to lock, in ascending order without duplicates.
///
/// Every writer that locks more than one product must use this order so two
/// checkouts over overlapping products cannot deadlock.
pub fn lock_order(lines: &[CartItem]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.product_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Plan
// =============================================================================

/// Fails with `InsufficientStock` when `product` cannot cover `requested`.
///
/// `requested` is reported as given, so callers pass the combined quantity
/// when a line is being topped up.
pub fn ensure_stock(product: &Product, requested: i64) -> CoreResult<()> {
    if product.can_fulfil(requested) {
        return Ok(());
    }

    Err(CoreError::InsufficientStock {
        product_id: product.id.clone(),
        requested,
        available: product.stock,
    })
}

/// One order line priced from a locked product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub cart_item_id: String,
    pub product_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub quantity: i64,
    /// Price copied from the locked row. Never re-read.
    pub unit_price: Money,
    pub line_total: Money,
}

/// Everything the checkout transaction needs to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    pub total: Money,
    /// Per-product stock decrement, ascending by product id.
    pub decrements: Vec<(String, i64)>,
}

impl CheckoutPlan {
    /// Snapshotted order items for `order_id`.
    pub fn order_items(&self, order_id: &str, created_at: DateTime<Utc>) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.to_string(),
                product_id: line.product_id.clone(),
                title_snapshot: line.title.clone(),
                image_url_snapshot: line.image_url.clone(),
                unit_price_cents: line.unit_price.cents(),
                quantity: line.quantity,
                line_total_cents: line.line_total.cents(),
                created_at,
            })
            .collect()
    }

    /// Cart lines consumed by this checkout.
    pub fn cart_item_ids(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.cart_item_id.clone()).collect()
    }
}

/// Validates stock and prices the selected lines against locked products.
///
/// ## Rules
/// - `lines` must not be empty (`NoValidItems`)
/// - every product must be present in `locked` (`ProductNotFound`)
/// - requested quantity per product must not exceed its stock
///   (`InsufficientStock`, reported for the lowest failing product id)
/// - total = Σ(locked price × quantity)
///
/// ## Example
/// ```rust
/// use std::collections::BTreeMap;
/// use spot_core::{plan_checkout, CartItem, Money, Product};
///
/// let mug = Product::new("Mug", Money::from_cents(1000), 5);
/// let line = CartItem::new("cart-1", mug.id.clone(), 2);
/// let locked = BTreeMap::from([(mug.id.clone(), mug)]);
///
/// let plan = plan_checkout(&[line], &locked).unwrap();
/// assert_eq!(plan.total, Money::from_cents(2000));
/// ```
pub fn plan_checkout(
    lines: &[CartItem],
    locked: &BTreeMap<String, Product>,
) -> CoreResult<CheckoutPlan> {
    if lines.is_empty() {
        return Err(CoreError::NoValidItems);
    }

    let mut requested: BTreeMap<&str, i64> = BTreeMap::new();
    for line in lines {
        *requested.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
    }

    for (product_id, quantity) in &requested {
        let product = locked
            .get(*product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        ensure_stock(product, *quantity)?;
    }

    let mut planned = Vec::with_capacity(lines.len());
    for line in lines {
        let product = locked
            .get(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
        let unit_price = product.price();

        planned.push(PlannedLine {
            cart_item_id: line.id.clone(),
            product_id: product.id.clone(),
            title: product.title.clone(),
            image_url: product.image_url.clone(),
            quantity: line.quantity,
            unit_price,
            line_total: unit_price.multiply_quantity(line.quantity),
        });
    }

    let total = planned.iter().map(|line| line.line_total).sum();
    let decrements = requested
        .into_iter()
        .map(|(product_id, quantity)| (product_id.to_string(), quantity))
        .collect();

    Ok(CheckoutPlan {
        lines: planned,
        total,
        decrements,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        let mut p = Product::new(format!("Product {id}"), Money::from_cents(price), stock);
        p.id = id.to_string();
        p
    }

    fn line(id: &str, product_id: &str, qty: i64) -> CartItem {
        let mut item = CartItem::new("cart-1", product_id, qty);
        item.id = id.to_string();
        item
    }

    fn locked(products: Vec<Product>) -> BTreeMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    #[test]
    fn test_ensure_stock_reports_requested_quantity() {
        let p = product("p1", 500, 3);
        assert!(ensure_stock(&p, 3).is_ok());

        let err = ensure_stock(&p, 4).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: "p1".to_string(),
                requested: 4,
                available: 3,
            }
        );
    }

    #[test]
    fn test_select_lines_ignores_foreign_ids() {
        let cart = vec![line("l1", "p1", 1), line("l2", "p2", 1)];
        let selected = vec!["l2".to_string(), "other-cart-line".to_string()];

        let chosen = select_lines(&cart, &selected);
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].id, "l2");
    }

    #[test]
    fn test_select_lines_deduplicates() {
        let cart = vec![line("l1", "p1", 1)];
        let selected = vec!["l1".to_string(), "l1".to_string()];

        assert_eq!(select_lines(&cart, &selected).len(), 1);
    }

    #[test]
    fn test_lock_order_is_ascending_and_unique() {
        let lines = vec![line("a", "p3", 1), line("b", "p1", 1), line("c", "p3", 2)];
        assert_eq!(lock_order(&lines), vec!["p1".to_string(), "p3".to_string()]);
    }

    #[test]
    fn test_plan_totals_from_locked_prices() {
        let lines = vec![line("l1", "p1", 2), line("l2", "p2", 3)];
        let products = locked(vec![product("p1", 1000, 5), product("p2", 250, 3)]);

        let plan = plan_checkout(&lines, &products).unwrap();

        assert_eq!(plan.total.cents(), 2750);
        assert_eq!(plan.lines[0].line_total.cents(), 2000);
        assert_eq!(plan.lines[1].unit_price.cents(), 250);
        assert_eq!(
            plan.decrements,
            vec![("p1".to_string(), 2), ("p2".to_string(), 3)]
        );
        assert_eq!(plan.cart_item_ids(), vec!["l1".to_string(), "l2".to_string()]);
    }

    #[test]
    fn test_plan_rejects_short_stock() {
        let lines = vec![line("l1", "p1", 1), line("l2", "p2", 10)];
        let products = locked(vec![product("p1", 1000, 5), product("p2", 500, 3)]);

        let err = plan_checkout(&lines, &products).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: "p2".to_string(),
                requested: 10,
                available: 3,
            }
        );
    }

    #[test]
    fn test_plan_reports_lowest_failing_product() {
        let lines = vec![line("l1", "p2", 9), line("l2", "p1", 9)];
        let products = locked(vec![product("p1", 100, 1), product("p2", 100, 1)]);

        match plan_checkout(&lines, &products) {
            Err(CoreError::InsufficientStock { product_id, .. }) => assert_eq!(product_id, "p1"),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_allows_exact_stock() {
        let lines = vec![line("l1", "p1", 5)];
        let products = locked(vec![product("p1", 100, 5)]);

        assert!(plan_checkout(&lines, &products).is_ok());
    }

    #[test]
    fn test_plan_requires_lines_and_locked_products() {
        let products = locked(vec![product("p1", 100, 5)]);
        assert_eq!(plan_checkout(&[], &products), Err(CoreError::NoValidItems));

        let lines = vec![line("l1", "missing", 1)];
        assert_eq!(
            plan_checkout(&lines, &products),
            Err(CoreError::ProductNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_order_items_copy_snapshot() {
        let lines = vec![line("l1", "p1", 2)];
        let products = locked(vec![product("p1", 1000, 5)]);
        let plan = plan_checkout(&lines, &products).unwrap();

        let items = plan.order_items("order-1", Utc::now());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order_id, "order-1");
        assert_eq!(items[0].unit_price_cents, 1000);
        assert_eq!(items[0].line_total_cents, 2000);
        assert_eq!(items[0].title_snapshot, "Product p1");
    }
}
