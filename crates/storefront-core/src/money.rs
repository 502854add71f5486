//! # Money Module
//!
//! Provides the `Money` type for prices, line subtotals and order totals.
//!
//! ## Integer Amounts
//! Prices are stored in the smallest currency unit as `i64`, exactly as the
//! catalog stores them. Order totals are sums of `quantity × price`, so every
//! operation that can grow a value is overflow-checked: an order whose total
//! does not fit in `i64` is rejected instead of wrapping.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where Money is Used                                  │
//! │                                                                         │
//! │  products.price ──► CartItem.unit_price ──► CartItem.subtotal           │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                          order_total() ──► orders.total_price           │
//! │                                                                         │
//! │  order_products.price keeps the unit price frozen at commit time        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::from_minor(100);
//! let subtotal = price.checked_mul_qty(2).unwrap();
//! assert_eq!(subtotal.minor(), 200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use ts_rs::TS;

/// A monetary amount in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    #[inline]
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Zero amount.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the amount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the amount is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(50).checked_mul_qty(3), Some(Money::from_minor(150)));
    /// assert_eq!(Money::from_minor(i64::MAX).checked_mul_qty(2), None);
    /// ```
    #[inline]
    pub fn checked_mul_qty(self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Unchecked addition; use [`Money::checked_add`] for user-controlled sums.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
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
    fn test_from_minor() {
        let money = Money::from_minor(250);
        assert_eq!(money.minor(), 250);
        assert!(!money.is_zero());
        assert!(!money.is_negative());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(250).to_string(), "250");
        assert_eq!(Money::zero().to_string(), "0");
    }

    #[test]
    fn test_checked_arithmetic() {
        let price = Money::from_minor(100);
        assert_eq!(price.checked_mul_qty(2), Some(Money::from_minor(200)));
        assert_eq!(
            price.checked_add(Money::from_minor(50)),
            Some(Money::from_minor(150))
        );
        assert_eq!(Money::from_minor(i64::MAX).checked_add(price), None);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_minor(200), Money::from_minor(50)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_minor(250));
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_minor(250)).unwrap();
        assert_eq!(json, "250");
    }
}
