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
//! │  In a pricing pipeline this compounds: a 20% discount on a tier price  │
//! │  on a converted currency would accumulate drift on every stage.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    All stage math is i64 cents; percentages are basis points; currency │
//! │    conversion uses micro-unit integer rates. Rounding happens at       │
//! │    exactly the points the rounding policy says it does.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pricekit_core::money::Money;
//!
//! let price = Money::from_cents(8_000);              // $80.00
//! let after = price.apply_percentage_discount(2_000); // 20% off
//! assert_eq!(after.cents(), 6_400);                   // $64.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values are legal intermediates (a fixed
///   discount larger than the running price) even though the pipeline clamps
///   final prices at zero
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Currency-agnostic**: the value does not know its currency; the
///   calculation result carries the currency code alongside it
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

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// Clamps negative amounts to zero.
    ///
    /// A fixed-amount discount larger than the running price must floor the
    /// final unit price at zero, never produce a payout.
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Computes `bps` basis points of this amount, rounding half up.
    ///
    /// ## Basis Points
    /// 1 bps = 0.01% = 1/10000. 2000 bps = 20%.
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(amount * bps + 5000) / 10000`.
    /// i128 intermediates prevent overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use pricekit_core::money::Money;
    ///
    /// let price = Money::from_cents(8_000);   // $80.00
    /// let cut = price.percentage(2_000);      // 20%
    /// assert_eq!(cut.cents(), 1_600);         // $16.00
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let part = (self.0 as i128 * bps as i128 + 5_000) / 10_000;
        Money(part as i64)
    }

    /// Subtracts `bps` basis points from this amount (percentage discount).
    ///
    /// ## Example
    /// ```rust
    /// use pricekit_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10_000);                // $100.00
    /// let discounted = subtotal.apply_percentage_discount(1_000); // 10% off
    /// assert_eq!(discounted.cents(), 9_000);                   // $90.00
    /// ```
    pub fn apply_percentage_discount(&self, bps: u32) -> Money {
        *self - self.percentage(bps)
    }

    /// Adds `bps` basis points to this amount (percentage surcharge, used by
    /// percentage attribute adjustments).
    pub fn add_percentage(&self, bps: u32) -> Money {
        *self + self.percentage(bps)
    }

    /// Multiplies money by a purchase quantity.
    ///
    /// ## Example
    /// ```rust
    /// use pricekit_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897);     // $8.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Converts this amount using an integer exchange rate in micro-units
    /// (1_000_000 = 1.0), rounding half up to the target cent.
    ///
    /// ## Example
    /// ```rust
    /// use pricekit_core::money::Money;
    ///
    /// let usd = Money::from_cents(10_000);       // $100.00
    /// let eur = usd.convert(920_000);            // rate 0.92
    /// assert_eq!(eur.cents(), 9_200);            // €92.00
    /// ```
    pub fn convert(&self, rate_micros: i64) -> Money {
        let converted = (self.0 as i128 * rate_micros as i128 + 500_000) / 1_000_000;
        Money(converted as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and the price-per-unit display string. Use frontend
/// formatting for actual UI display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Sum of an iterator of Money values.
impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
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
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-b).cents(), -500);
    }

    #[test]
    fn test_percentage_basic() {
        // $100.00 at 20% = $20.00
        let amount = Money::from_cents(10_000);
        assert_eq!(amount.percentage(2_000).cents(), 2_000);
    }

    #[test]
    fn test_percentage_with_rounding() {
        // $10.00 at 8.25% = $0.825 → rounds half up to $0.83
        let amount = Money::from_cents(1_000);
        assert_eq!(amount.percentage(825).cents(), 83);
    }

    #[test]
    fn test_percentage_discount_and_surcharge() {
        let price = Money::from_cents(8_000);
        assert_eq!(price.apply_percentage_discount(2_000).cents(), 6_400);
        assert_eq!(price.add_percentage(1_000).cents(), 8_800);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    }

    #[test]
    fn test_convert_identity() {
        let amount = Money::from_cents(12_345);
        assert_eq!(amount.convert(1_000_000), amount);
    }

    #[test]
    fn test_convert_rounds_half_up() {
        // 1 cent at rate 0.925 = 0.925 cents → 1 cent
        assert_eq!(Money::from_cents(1).convert(925_000).cents(), 1);
        // $100.00 at 0.92 = $92.00 exactly
        assert_eq!(Money::from_cents(10_000).convert(920_000).cents(), 9_200);
        // $0.05 at 0.925 = 4.625 cents → 5 cents
        assert_eq!(Money::from_cents(5).convert(925_000).cents(), 5);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-100).clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(100).clamp_non_negative().cents(), 100);
    }

    #[test]
    fn test_min_and_sum() {
        let a = Money::from_cents(800);
        let b = Money::from_cents(1_000);
        assert_eq!(a.min(b), a);

        let total: Money = vec![a, b].into_iter().sum();
        assert_eq!(total.cents(), 1_800);
    }
}
