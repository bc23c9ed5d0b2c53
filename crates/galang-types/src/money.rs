use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Monetary value in integer minor units (e.g. whole rupiah).
///
/// All ledger arithmetic happens on `Amount` — floats never enter a money
/// path. Ratios against a target are expressed in basis points so that
/// classification boundaries are exact.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero value.
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from minor units.
    pub const fn new(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// The raw minor-unit value.
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns `true` if strictly greater than zero.
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if exactly zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition; fails on overflow.
    pub fn checked_add(self, other: Amount) -> Result<Amount, TypeError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(TypeError::AmountOverflow)
    }

    /// Checked subtraction; fails on overflow.
    pub fn checked_sub(self, other: Amount) -> Result<Amount, TypeError> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(TypeError::AmountOverflow)
    }

    /// This amount as a fraction of `target`, in basis points
    /// (10_000 == 100%). A zero or negative target yields 0.
    pub fn basis_points_of(&self, target: Amount) -> u32 {
        if target.0 <= 0 || self.0 <= 0 {
            return 0;
        }
        let bp = (self.0 as i128 * 10_000) / target.0 as i128;
        bp.min(u32::MAX as i128) as u32
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, other: Amount) -> Amount {
        Amount(self.0 - other.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_detects_overflow() {
        let max = Amount::new(i64::MAX);
        assert_eq!(max.checked_add(Amount::new(1)), Err(TypeError::AmountOverflow));
        assert_eq!(Amount::new(1).checked_add(Amount::new(2)), Ok(Amount::new(3)));
    }

    #[test]
    fn basis_points_exact_at_target() {
        let target = Amount::new(1_000_000);
        assert_eq!(target.basis_points_of(target), 10_000);
    }

    #[test]
    fn basis_points_just_below_target() {
        let target = Amount::new(1_000_000);
        let raised = Amount::new(999_900);
        assert_eq!(raised.basis_points_of(target), 9_999);
    }

    #[test]
    fn basis_points_zero_target_is_zero() {
        assert_eq!(Amount::new(500).basis_points_of(Amount::ZERO), 0);
    }

    #[test]
    fn basis_points_over_target_exceed_ten_thousand() {
        let target = Amount::new(100);
        assert_eq!(Amount::new(250).basis_points_of(target), 25_000);
    }

    #[test]
    fn sum_of_amounts() {
        let total: Amount = [10, 20, 30].iter().map(|&v| Amount::new(v)).sum();
        assert_eq!(total, Amount::new(60));
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&Amount::new(50_000)).unwrap();
        assert_eq!(json, "50000");
    }
}
