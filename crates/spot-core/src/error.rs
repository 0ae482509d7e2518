//! # Error Types
//!
//! Domain-specific error types for spot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  spot-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  spot-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  spot-service errors                                                   │
//! │  └── ShopError        - What callers see (taxonomy + error code)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                         DbError ────┴─► ShopError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product id does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but has been deactivated.
    #[error("Product is not available: {0}")]
    ProductInactive(String),

    /// Not enough stock to satisfy the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 10)
    ///      │
    ///      ▼
    /// Locked stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "Y", requested: 10, available: 3 }
    ///      │
    ///      ▼
    /// Nothing written: no order, stock and cart untouched
    /// ```
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// The user has no cart.
    #[error("Cart not found")]
    CartNotFound,

    /// Cart line is missing or belongs to another user's cart.
    #[error("Cart item not found: {0}")]
    CartItemNotFound(String),

    /// Order is missing or belongs to another user.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Checkout was called with an empty selection.
    #[error("No items selected for checkout")]
    NothingSelected,

    /// None of the selected line ids belong to the user's cart.
    #[error("No valid items found for checkout")]
    NoValidItems,

    /// Cart has reached the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rejected caller input, caught before a transaction opens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not one of the accepted options.
    #[error("{field} does not accept '{value}'")]
    Unsupported { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
