//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    A line of 3 × 10.00 is exactly 3000 cents, and a 10% discount        │
//! │    rounds half-up to a whole cent in one explicit place.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use barkeep_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1050); // 10.50
//!
//! // Line subtotal at insertion time
//! let subtotal = price.multiply_quantity(3); // 31.50
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the system (product price, line subtotal,
/// sale total, payment amount, account transaction) flows through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// This is the line subtotal computation: the price is snapshotted at
    /// insertion time, so the result never changes when the product price
    /// is edited later.
    ///
    /// ## Example
    /// ```rust
    /// use barkeep_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1000); // 10.00
    /// let subtotal = unit_price.multiply_quantity(3);
    /// assert_eq!(subtotal.cents(), 3000); // 30.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a whole-percent discount and returns the discounted amount,
    /// rounding half-up to a whole cent.
    ///
    /// ## Rounding
    /// Half-up rounding in integer math: `(remainder × (100 − pct) + 50) / 100`.
    /// Uses i128 to prevent overflow on large totals.
    ///
    /// ## Example
    /// ```rust
    /// use barkeep_core::money::Money;
    ///
    /// let total = Money::from_cents(10101); // 101.01
    /// // 10% off: 9090.9 cents → rounds half-up to 9091
    /// assert_eq!(total.apply_discount_percent(10).cents(), 9091);
    /// ```
    pub fn apply_discount_percent(&self, pct: i64) -> Money {
        let pct = pct.clamp(0, 100);
        let kept = (self.0 as i128 * (100 - pct) as i128 + 50) / 100;
        Money(kept as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For debugging and audit payloads; UI formatting is the frontend's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Sale Total
// =============================================================================

/// Computes a sale total from line subtotals and an optional whole-percent
/// discount.
///
/// This is THE total invariant: after every line mutation the stored
/// `total_cents` must equal the value returned here for the current set
/// of line subtotals.
pub fn sale_total(line_subtotals: impl IntoIterator<Item = Money>, discount: Option<i64>) -> Money {
    let sum: Money = line_subtotals.into_iter().sum();
    match discount {
        Some(pct) => sum.apply_discount_percent(pct),
        None => sum,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply_quantity(3).cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let total: Money = vec![Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 350);
    }

    #[test]
    fn test_discount_exact() {
        // 100.00 at 10% off = 90.00, no rounding needed
        let total = Money::from_cents(10000);
        assert_eq!(total.apply_discount_percent(10).cents(), 9000);
    }

    #[test]
    fn test_discount_rounds_half_up() {
        // 101.01 at 10% off keeps 90.909 → 90.91
        let total = Money::from_cents(10101);
        assert_eq!(total.apply_discount_percent(10).cents(), 9091);

        // 0.05 at 50% off keeps 2.5 cents → 3
        let total = Money::from_cents(5);
        assert_eq!(total.apply_discount_percent(50).cents(), 3);
    }

    #[test]
    fn test_discount_bounds() {
        let total = Money::from_cents(1234);
        assert_eq!(total.apply_discount_percent(0).cents(), 1234);
        assert_eq!(total.apply_discount_percent(100).cents(), 0);
        // Out-of-range percentages are clamped
        assert_eq!(total.apply_discount_percent(150).cents(), 0);
    }

    #[test]
    fn test_sale_total_no_discount() {
        let lines = vec![Money::from_cents(3000), Money::from_cents(450)];
        assert_eq!(sale_total(lines, None).cents(), 3450);
    }

    #[test]
    fn test_sale_total_with_discount() {
        // Scenario: one line {quantity: 3, price: 10.00} → total 30.00
        let lines = vec![Money::from_cents(1000).multiply_quantity(3)];
        assert_eq!(sale_total(lines.clone(), None).cents(), 3000);
        assert_eq!(sale_total(lines, Some(10)).cents(), 2700);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
