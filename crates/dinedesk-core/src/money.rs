//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Menu prices like €19.50 and surcharges like €0.30 summed as floats:   │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1950 + 30 = 1980 cents, exactly                                      │
//! │                                                                         │
//! │  Customer-facing totals are rounded to one decimal (€0.10 steps) with  │
//! │  round-half-up, done once on integers via `round_to_tenth`.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dinedesk_core::money::Money;
//!
//! let price = Money::from_cents(1950); // €19.50
//! let doubled = price * 2;             // €39.00
//! assert_eq!(doubled.cents(), 3900);
//! assert_eq!(Money::from_cents(1234).round_to_tenth().cents(), 1230);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// MenuItem.price ──┬──► resolve_unit_price ──► CartLine × quantity ──► subtotal
///                  │                                                     │
/// Option.price ────┘                                   DiscountPolicy ◄──┘
///                                                             │
///                                                  Order.total ◄──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use dinedesk_core::money::Money;
    ///
    /// let price = Money::from_cents(1950); // €19.50
    /// assert_eq!(price.cents(), 1950);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole euros and cents.
    ///
    /// ## Example
    /// ```rust
    /// use dinedesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(19, 50).cents(), 1950);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-euro portion.
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative amounts to zero.
    ///
    /// Unit prices are never negative, even when a menu record carries a
    /// negative surcharge larger than its base price.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use dinedesk_core::money::Money;
    ///
    /// let line_total = Money::from_cents(1950).multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 5850);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Rounds to the nearest €0.10, halves away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use dinedesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(9994).round_to_tenth().cents(), 9990);
    /// assert_eq!(Money::from_cents(9995).round_to_tenth().cents(), 10000);
    /// assert_eq!(Money::from_cents(-15).round_to_tenth().cents(), -20);
    /// ```
    pub const fn round_to_tenth(&self) -> Self {
        if self.0 >= 0 {
            Money((self.0 + 5) / 10 * 10)
        } else {
            Money(-((-self.0 + 5) / 10 * 10))
        }
    }

    /// Returns `rate` of this amount, rounded half-up to the cent.
    ///
    /// ## Example
    /// ```rust
    /// use dinedesk_core::money::Money;
    /// use dinedesk_core::types::Rate;
    ///
    /// let share = Money::from_cents(1005).percentage(Rate::from_bps(1000));
    /// assert_eq!(share.cents(), 101); // €1.005 → €1.01
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        // Use i128 to prevent overflow on large amounts
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money::from_cents(round_half_away(scaled, 10_000) as i64)
    }

    /// Returns `rate` of this amount, rounded half-up to €0.10 in one step.
    ///
    /// Rounding once on the exact product avoids the double rounding of
    /// `percentage(..).round_to_tenth()` (€10.045 must become €10.00, not
    /// €10.10).
    ///
    /// ## Example
    /// ```rust
    /// use dinedesk_core::money::Money;
    /// use dinedesk_core::types::Rate;
    ///
    /// let savings = Money::from_cents(15000).percentage_to_tenth(Rate::from_bps(1000));
    /// assert_eq!(savings.cents(), 1500);
    /// ```
    pub fn percentage_to_tenth(&self, rate: Rate) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        // 10_000 bps per unit, 10 cents per tenth
        let tenths = round_half_away(scaled, 100_000);
        Money::from_cents((tenths * 10) as i64)
    }
}

/// Integer division rounding halves away from zero.
fn round_half_away(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. Localised formatting belongs to the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}€{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
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
        let money = Money::from_cents(1950);
        assert_eq!(money.cents(), 1950);
        assert_eq!(money.euros(), 19);
        assert_eq!(money.cents_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1950)), "€19.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "€0.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-€5.50");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 1500);
    }

    #[test]
    fn test_round_to_tenth_half_up() {
        assert_eq!(Money::from_cents(14).round_to_tenth().cents(), 10);
        assert_eq!(Money::from_cents(15).round_to_tenth().cents(), 20);
        assert_eq!(Money::from_cents(9990).round_to_tenth().cents(), 9990);
        assert_eq!(Money::from_cents(-14).round_to_tenth().cents(), -10);
    }

    #[test]
    fn test_percentage_to_tenth_rounds_once() {
        // €100.45 × 10% = €10.045 → €10.00 (single rounding)
        let savings = Money::from_cents(10045).percentage_to_tenth(Rate::from_bps(1000));
        assert_eq!(savings.cents(), 1000);

        // €100.50 × 10% = €10.05 → €10.10 (half-up)
        let savings = Money::from_cents(10050).percentage_to_tenth(Rate::from_bps(1000));
        assert_eq!(savings.cents(), 1010);
    }

    #[test]
    fn test_non_negative_clamp() {
        assert_eq!(Money::from_cents(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_cents(42).non_negative().cents(), 42);
    }
}
