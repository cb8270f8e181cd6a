//! # Money Module
//!
//! Provides the `Money` type for monetary values in the smallest currency
//! unit.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stacked discounts are computed against the REMAINING amount:           │
//! │                                                                         │
//! │    10000 ─15%─► 8500 ─10%─► 7650 ─2000─► 5650                          │
//! │                                                                         │
//! │  With floats every step can drift by a fraction of a unit, and the     │
//! │  drift compounds across steps. Integer minor units with one explicit   │
//! │  rounding per percentage step keep the breakdown and the total equal.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use maison_core::money::Money;
//! use maison_core::types::Percent;
//!
//! let order = Money::from_minor(10000);
//! let off = order.percentage(Percent::from_points(15));
//! assert_eq!(off.minor(), 1500);
//! assert_eq!((order - off).minor(), 8500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor currency units.
///
/// Signed so that intermediate results (losses, refunds) are representable;
/// discount amounts produced by the engine are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use maison_core::money::Money;
    ///
    /// let credit = Money::from_minor(3000);
    /// assert_eq!(credit.minor(), 3000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    #[inline]
    pub const fn minor(&self) -> i64 {
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

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `rate` of this amount, rounded half-up.
    ///
    /// Uses `(amount * bps + 5000) / 10000` with an i128 intermediate so
    /// large order totals cannot overflow. Results beyond the `i64` range
    /// saturate.
    ///
    /// ```rust
    /// use maison_core::money::Money;
    /// use maison_core::types::Percent;
    ///
    /// // 8.25% of 1000 = 82.5 → 83
    /// let part = Money::from_minor(1000).percentage(Percent::from_bps(825));
    /// assert_eq!(part.minor(), 83);
    /// ```
    pub fn percentage(&self, rate: Percent) -> Money {
        let part = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(part.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Clamps the value into `[floor, ceiling]`.
    #[inline]
    pub fn clamp_between(self, floor: Money, ceiling: Money) -> Money {
        if self < floor {
            floor
        } else if self > ceiling {
            ceiling
        } else {
            self
        }
    }

    /// Subtraction that never goes below zero.
    #[inline]
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_mul(self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain minor units with thousands separators, e.g. `12,500`.
///
/// Debug-oriented; the frontend formats currency for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-{}", grouped)
        } else {
            f.write_str(&grouped)
        }
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

/// Multiplication by a count (bottles, millilitres).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
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
    fn test_display() {
        assert_eq!(Money::from_minor(0).to_string(), "0");
        assert_eq!(Money::from_minor(999).to_string(), "999");
        assert_eq!(Money::from_minor(1000).to_string(), "1,000");
        assert_eq!(Money::from_minor(1234567).to_string(), "1,234,567");
        assert_eq!(Money::from_minor(-12500).to_string(), "-12,500");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(400);

        assert_eq!((a + b).minor(), 1400);
        assert_eq!((a - b).minor(), 600);
        assert_eq!((a * 3).minor(), 3000);
        assert_eq!(b.saturating_sub(a), Money::zero());

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.minor(), 1800);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let amount = Money::from_minor(10000);
        assert_eq!(amount.percentage(Percent::from_points(15)).minor(), 1500);

        // 8500 × 12.5% = 1062.5 → 1063
        let remaining = Money::from_minor(8500);
        assert_eq!(remaining.percentage(Percent::from_bps(1250)).minor(), 1063);
    }

    #[test]
    fn test_percentage_large_amount_no_overflow() {
        let huge = Money::from_minor(i64::MAX / 2);
        let half = huge.percentage(Percent::from_points(50));
        assert!(half.is_positive());
    }

    #[test]
    fn test_percentage_above_full_saturates() {
        let huge = Money::from_minor(i64::MAX / 2);
        assert_eq!(huge.percentage(Percent::from_bps(u32::MAX)), Money::from_minor(i64::MAX));

        let debt = Money::from_minor(i64::MIN / 2);
        assert_eq!(debt.percentage(Percent::from_bps(u32::MAX)), Money::from_minor(i64::MIN));
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!(max.checked_add(Money::from_minor(1)), None);
        assert_eq!(max.checked_mul(2), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);
        assert_eq!(Money::from_minor(40).checked_mul(3), Some(Money::from_minor(120)));
        assert_eq!(Money::from_minor(i64::MIN).saturating_sub(max), Money::zero());
    }

    #[test]
    fn test_clamp_between() {
        let floor = Money::zero();
        let ceiling = Money::from_minor(500);
        assert_eq!(Money::from_minor(-5).clamp_between(floor, ceiling), floor);
        assert_eq!(Money::from_minor(900).clamp_between(floor, ceiling), ceiling);
        assert_eq!(Money::from_minor(250).clamp_between(floor, ceiling).minor(), 250);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_minor(1).is_positive());
        assert!(Money::from_minor(-1).is_negative());
    }
}
