//! Dollar amounts using decimal arithmetic.
//!
//! The store sells in a single currency, so `Money` is a thin wrapper around
//! [`Decimal`] whose main job is consistent `$12.50` formatting in the admin
//! panel and the storefront.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A dollar amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_cents() {
        assert_eq!(Money::new(Decimal::new(12, 0)).to_string(), "$12.00");
        assert_eq!(Money::new(Decimal::new(1_999, 2)).to_string(), "$19.99");
        assert_eq!(Money::new(Decimal::new(5, 1)).to_string(), "$0.50");
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Money::new(Decimal::new(10_005, 3)).to_string(), "$10.00");
        assert_eq!(Money::new(Decimal::new(10_006, 3)).to_string(), "$10.01");
    }

    #[test]
    fn test_sum() {
        let total: Money = [Decimal::new(250, 2), Decimal::new(1_000, 2)]
            .into_iter()
            .map(Money::new)
            .sum();
        assert_eq!(total.to_string(), "$12.50");
        assert!(total.is_positive());
        assert!(!Money::ZERO.is_positive());
    }
}
