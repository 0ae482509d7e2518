//! # Domain Types
//!
//! Entities persisted by spot-db and manipulated by spot-service.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Cart       │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  title          │   │  user_id (1:1)  │   │  user_id        │       │
//! │  │  price_cents    │   └────────┬────────┘   │  status (PAID)  │       │
//! │  │  stock (>= 0)   │            │ owns       │  total_cents    │       │
//! │  │  is_active      │   ┌────────▼────────┐   └────────┬────────┘       │
//! │  └────────▲────────┘   │    CartItem     │            │ owns           │
//! │           │            │  product_id ────┼──┐ ┌───────▼─────────┐      │
//! │           │            │  quantity >= 1  │  │ │   OrderItem     │      │
//! │           │            └─────────────────┘  │ │  product_id     │      │
//! │           └─────────────────────────────────┴─┤  unit_price     │      │
//! │                 shared, never deleted          │  (snapshot)     │      │
//! │                                                └─────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `OrderItem` copies the title, image and unit price of the product at the
//! instant of checkout. Later catalog changes never alter a placed order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// User Identity
// =============================================================================

/// Identity of the authenticated user, resolved by the caller.
///
/// Every service operation takes the user explicitly; nothing reads an
/// ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId(id)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Products are deactivated, never deleted, so order items can always
/// reference them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title.
    pub title: String,

    pub description: Option<String>,

    pub image_url: Option<String>,

    /// Live price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Whether the product can be added to carts (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active product with a fresh id.
    ///
    /// ## Example
    /// ```rust
    /// use spot_core::{Money, Product};
    ///
    /// let mug = Product::new("Mug", Money::from_cents(1000), 5);
    /// assert!(mug.is_active);
    /// assert!(mug.can_fulfil(5));
    /// assert!(!mug.can_fulfil(6));
    /// ```
    pub fn new(title: impl Into<String>, price: Money, stock: i64) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            image_url: None,
            price_cents: price.cents(),
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Returns the live price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether current stock covers `quantity`.
    #[inline]
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A user's cart. At most one per user, created on first `add_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user: &UserId) -> Self {
        let now = Utc::now();
        Cart {
            id: Uuid::new_v4().to_string(),
            user_id: user.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One line of a cart. `(cart_id, product_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(cart_id: impl Into<String>, product_id: impl Into<String>, quantity: i64) -> Self {
        let now = Utc::now();
        CartItem {
            id: Uuid::new_v4().to_string(),
            cart_id: cart_id.into(),
            product_id: product_id.into(),
            quantity,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order. Checkout always produces `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order. Created exactly once per successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// A paid order for `user` with the given total.
    pub fn paid(user: &UserId, total: Money) -> Self {
        Order {
            id: Uuid::new_v4().to_string(),
            user_id: user.as_str().to_string(),
            status: OrderStatus::Paid,
            total_cents: total.cents(),
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of an order.
/// Uses snapshot pattern to freeze product data at time of checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product title at time of checkout (frozen).
    pub title_snapshot: String,
    /// Product image at time of checkout (frozen).
    pub image_url_snapshot: Option<String>,
    /// Unit price in cents at time of checkout (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_status_serializes_uppercase() {
        let json = serde_json::to_string(&OrderStatus::Paid).unwrap();
        assert_eq!(json, "\"PAID\"");
    }

    #[test]
    fn test_paid_order_carries_total() {
        let user = UserId::new("user-1");
        let order = Order::paid(&user, Money::from_cents(2000));

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.user_id, "user-1");
        assert_eq!(order.total(), Money::from_cents(2000));
    }

    #[test]
    fn test_product_builder() {
        let product = Product::new("Lamp", Money::from_cents(4599), 2)
            .with_description("Desk lamp")
            .with_image_url("https://img.example/lamp.png");

        assert_eq!(product.price(), Money::from_cents(4599));
        assert_eq!(product.description.as_deref(), Some("Desk lamp"));
        assert!(product.image_url.is_some());
        assert!(uuid::Uuid::parse_str(&product.id).is_ok());
    }

    #[test]
    fn test_user_id_is_transparent() {
        let json = serde_json::to_string(&UserId::from("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }
}
