//! # Money
//!
//! Amounts are whole cents in an `i64`. Prices, line totals, subtotals and
//! order totals all use this one type.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  An order total must equal the sum of its lines exactly:               │
//! │                                                                         │
//! │    total == Σ (unit_price_snapshot × quantity)                         │
//! │                                                                         │
//! │  With cents that is plain integer arithmetic:                          │
//! │    1000 × 2 + 250 × 3 = 2750   (no rounding step exists to go wrong)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the wire a `Money` is the bare integer (`2750`), never a float.
//!
//! ```rust
//! use spot_core::money::Money;
//!
//! let lamp = Money::from_cents(1000);
//! let line = lamp.multiply_quantity(2);
//!
//! assert_eq!(line.cents(), 2000);
//! assert_eq!(line.to_string(), "$20.00");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// An amount of money in cents.
///
/// ```text
/// Product.price_cents ──┬──► CartLineView.unit_price (live)
///                       │         └──► CartView.subtotal
///                       │
///                       └──► OrderItem.unit_price_cents (snapshot)
///                                 └──► Order.total_cents
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Line total for `qty` units at this price.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// `$12.34` / `-$0.50`. For logs and error messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2750).to_string(), "$27.50");
        assert_eq!(Money::from_cents(7).to_string(), "$0.07");
        assert_eq!(Money::from_cents(-50).to_string(), "-$0.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_line_totals_add_up_exactly() {
        let lines = [
            Money::from_cents(1000).multiply_quantity(2),
            Money::from_cents(250) * 3,
        ];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total, Money::from_cents(2750));

        let mut running = Money::default();
        running += Money::from_cents(1);
        running += Money::from_cents(2);
        assert_eq!(running.cents(), 3);
    }

    #[test]
    fn test_empty_sum_is_zero() {
        let nothing: Money = std::iter::empty().sum();
        assert!(nothing.is_zero());
    }

    #[test]
    fn test_wire_format_is_integer_cents() {
        assert_eq!(serde_json::to_string(&Money::from_cents(2000)).unwrap(), "2000");
        let back: Money = serde_json::from_str("1999").unwrap();
        assert_eq!(back, Money::from_cents(1999));
    }
}
