//! # Validation
//!
//! Bounds checks on caller input. Nothing here touches stock.
//!
//! ## Where Each Rule Lives
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Three places a request can fail                    │
//! │                                                                         │
//! │  Layer 1: spot-service entry point                                     │
//! │  ├── here: quantity, cart size, page bounds                            │
//! │  └── Fails fast with InvalidRequest, nothing locked yet                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Under the product lock (checkout module)                     │
//! │  └── Stock checks against freshly read rows                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity > 0)                          │
//! │  ├── UNIQUE (cart_id, product_id), UNIQUE (user_id)                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PAGE_SIZE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Example
/// ```rust
/// use spot_core::validation::validate_quantity;
///
/// assert!(validate_quantity(2).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates order history paging.
///
/// ## Rules
/// - `page` is zero-based and non-negative
/// - `size` is between 1 and MAX_PAGE_SIZE (100)
pub fn validate_page(page: i64, size: i64) -> ValidationResult<()> {
    if page < 0 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(ValidationError::OutOfRange {
            field: "size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that a cart with `current_items` distinct lines can take one more.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
