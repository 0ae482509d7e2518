//! # Views
//!
//! Read models handed back to callers. Field names serialize as camelCase
//! and every view exports a TypeScript binding.
//!
//! ```text
//! CartView  { id?, items: [CartLineView], subtotal }     live prices
//! OrderView { id, status, total, createdAt, items }      snapshot prices
//! OrderPage { content: [OrderView], totalElements, ... } sorted by OrderSort
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Order, OrderItem, OrderStatus};

// =============================================================================
// Cart
// =============================================================================

/// One cart line joined with the live product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLineView {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

impl CartLineView {
    pub fn new(
        id: String,
        product_id: String,
        title: String,
        image_url: Option<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        CartLineView {
            id,
            product_id,
            title,
            image_url,
            unit_price,
            quantity,
            line_total: unit_price.multiply_quantity(quantity),
        }
    }
}

/// A user's cart. `id` is `None` when the user has never added anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartView {
    pub id: Option<String>,
    pub items: Vec<CartLineView>,
    pub subtotal: Money,
}

impl CartView {
    /// The representation of a cart that does not exist.
    pub fn empty() -> Self {
        CartView {
            id: None,
            items: Vec::new(),
            subtotal: Money::zero(),
        }
    }

    /// Builds a view, computing the subtotal from live line totals.
    pub fn new(id: String, items: Vec<CartLineView>) -> Self {
        let subtotal = items.iter().map(|line| line.line_total).sum();
        CartView {
            id: Some(id),
            items,
            subtotal,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItemView {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        OrderItemView {
            unit_price: item.unit_price(),
            line_total: item.line_total(),
            id: item.id,
            product_id: item.product_id,
            title: item.title_snapshot,
            image_url: item.image_url_snapshot,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderView {
    pub id: String,
    pub status: OrderStatus,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        OrderView {
            total: order.total(),
            id: order.id,
            status: order.status,
            created_at: order.created_at,
            items: items.into_iter().map(OrderItemView::from).collect(),
        }
    }
}

/// A page of order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderPage {
    pub content: Vec<OrderView>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub size: i64,
    /// Zero-based page number.
    pub number: i64,
}

impl OrderPage {
    pub fn new(content: Vec<OrderView>, total_elements: i64, size: i64, number: i64) -> Self {
        let total_pages = if size > 0 {
            (total_elements + size - 1) / size
        } else {
            0
        };
        OrderPage {
            content,
            total_elements,
            total_pages,
            size,
            number,
        }
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Column an order history page is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum OrderSortField {
    #[default]
    CreatedAt,
    Total,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Ordering of an order history page. The default is newest first.
///
/// ```rust
/// use spot_core::{OrderSort, OrderSortField, SortDirection};
///
/// let sort = OrderSort::parse("total", "ASC").unwrap();
/// assert_eq!(sort, OrderSort::new(OrderSortField::Total, SortDirection::Asc));
/// assert!(OrderSort::parse("password", "desc").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderSort {
    pub by: OrderSortField,
    pub direction: SortDirection,
}

impl OrderSort {
    pub const fn new(by: OrderSortField, direction: SortDirection) -> Self {
        OrderSort { by, direction }
    }

    /// Reads `sortBy` / `sortDir` request parameters.
    ///
    /// `sort_dir` is case-insensitive and anything other than `desc` sorts
    /// ascending. An unknown `sort_by` is rejected.
    pub fn parse(sort_by: &str, sort_dir: &str) -> Result<Self, ValidationError> {
        let by = match sort_by {
            "createdAt" | "created_at" => OrderSortField::CreatedAt,
            "total" | "totalCents" | "total_cents" => OrderSortField::Total,
            other => {
                return Err(ValidationError::Unsupported {
                    field: "sortBy".to_string(),
                    value: other.to_string(),
                });
            }
        };

        let direction = if sort_dir.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };

        Ok(OrderSort { by, direction })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
