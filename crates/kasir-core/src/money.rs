//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floating point:                                                   │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 12.5% discount on Rp 19.999 as a float:                              │
//! │    2499.875 → displayed as 2.500, stored as 2499.875 → drift            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Every amount is an i64 count of the smallest currency unit           │
//! │    (1 rupiah for IDR, 1 cent for USD). Rounding happens in exactly      │
//! │    one place: `Money::percent_of`.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::money::Money;
//!
//! let price = Money::from_minor(10_000); // Rp 10.000
//!
//! let doubled = price * 2;
//! let total = price + Money::from_minor(500);
//! assert_eq!(doubled.minor(), 20_000);
//! assert_eq!(total.minor(), 10_500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percentage;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: cart totals are allowed to go negative when a fixed
///   discount exceeds the subtotal; the settlement check rejects them later
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Saturating arithmetic**: prices come from the backend, so operators
///   clamp at `i64::MIN`/`i64::MAX` instead of panicking or wrapping
/// - **Serialized as a bare integer**: the wire layer converts from the
///   backend's JSON numbers before a `Money` is ever built
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartLine.gross ──► CartLine.total ──► Cart.subtotal
///                                                             │
///                             Discount::amount_on(subtotal) ◄─┤
///                                                             ▼
///                     payment_amount ──► Cart.change ◄── Cart.total
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Floors the value at zero.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(-300).non_negative(), Money::zero());
    /// assert_eq!(Money::from_minor(300).non_negative().minor(), 300);
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(2_500);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 7_500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `rate` of this amount, rounded half away from zero to the
    /// nearest minor unit.
    ///
    /// ## Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  amount × bps / 10000, computed in i128                             │
    /// │                                                                     │
    /// │  19.999 × 12.50% = 2499.875   → 2500                                │
    /// │  20.000 × 10.00% = 2000.000   → 2000                                │
    /// │     -15 × 50.00% =   -7.5     →   -8   (symmetric with +15 → 8)     │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    /// use kasir_core::types::Percentage;
    ///
    /// let subtotal = Money::from_minor(20_000);
    /// let discount = subtotal.percent_of(Percentage::from_percent(10));
    /// assert_eq!(discount.minor(), 2_000);
    /// ```
    pub fn percent_of(&self, rate: Percentage) -> Money {
        let product = self.0 as i128 * rate.bps() as i128;
        let half = (Percentage::BPS_SCALE / 2) as i128;
        let scale = Percentage::BPS_SCALE as i128;

        let rounded = if product >= 0 {
            (product + half) / scale
        } else {
            (product - half) / scale
        };
        Money(i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays the raw minor-unit count.
///
/// ## Note
/// This is for logs. Use `kasir_client::config::format_money` for anything a
/// cashier or customer reads, since symbol and decimals are configuration.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

/// Multiplication by i64 (quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(18_000);
        assert_eq!(money.minor(), 18_000);
        assert_eq!(money.to_string(), "18000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((b - a).minor(), -500);
        assert_eq!((-a).minor(), -1000);
        let result: Money = a * 3;
        assert_eq!(result.minor(), 3000);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_minor(100), Money::from_minor(250), Money::from_minor(-50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.minor(), 300);

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_percent_of_exact() {
        let subtotal = Money::from_minor(20_000);
        assert_eq!(subtotal.percent_of(Percentage::from_percent(10)).minor(), 2_000);
        assert_eq!(subtotal.percent_of(Percentage::from_percent(100)).minor(), 20_000);
        assert_eq!(subtotal.percent_of(Percentage::zero()).minor(), 0);
    }

    #[test]
    fn test_percent_of_rounds_half_away_from_zero() {
        // 19.999 × 12.5% = 2499.875 → 2500
        let amount = Money::from_minor(19_999);
        assert_eq!(amount.percent_of(Percentage::from_bps(1250)).minor(), 2_500);

        // 15 × 50% = 7.5 → 8, and the negative mirror → -8
        assert_eq!(Money::from_minor(15).percent_of(Percentage::from_percent(50)).minor(), 8);
        assert_eq!(Money::from_minor(-15).percent_of(Percentage::from_percent(50)).minor(), -8);

        // 1 × 33.33% = 0.3333 → 0
        assert_eq!(Money::from_minor(1).percent_of(Percentage::from_bps(3333)).minor(), 0);
    }

    #[test]
    fn test_percent_of_large_amount_does_not_overflow() {
        let amount = Money::from_minor(i64::MAX / 2);
        let half = amount.percent_of(Percentage::from_percent(50));
        assert!(half.is_positive());
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_overflowing() {
        let max = Money::from_minor(i64::MAX);
        let min = Money::from_minor(i64::MIN);

        assert_eq!(max + Money::from_minor(1), max);
        assert_eq!(min - Money::from_minor(1), min);
        assert_eq!(-min, max);
        assert_eq!(min.abs(), max);
        assert_eq!(Money::from_minor(10_000).multiply_quantity(i64::MAX), max);
        assert_eq!(Money::from_minor(-10_000) * i64::MAX, min);

        let total: Money = [max, max, Money::from_minor(-5)].iter().sum();
        assert_eq!(total, Money::from_minor(i64::MAX - 5));
    }

    #[test]
    fn test_percent_of_clamps_above_range() {
        let amount = Money::from_minor(i64::MAX);
        assert_eq!(amount.percent_of(Percentage::from_bps(20_000)).minor(), i64::MAX);
        let amount = Money::from_minor(i64::MIN);
        assert_eq!(amount.percent_of(Percentage::from_bps(20_000)).minor(), i64::MIN);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_minor(-1).non_negative(), Money::zero());
        assert_eq!(Money::zero().non_negative(), Money::zero());
        assert_eq!(Money::from_minor(42).non_negative().minor(), 42);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_minor(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().minor(), 100);
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_minor(18_000)).unwrap();
        assert_eq!(json, "18000");
        let back: Money = serde_json::from_str("2000").unwrap();
        assert_eq!(back.minor(), 2_000);
    }
}
