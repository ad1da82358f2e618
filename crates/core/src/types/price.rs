//! Money arithmetic on `Decimal`.
//!
//! Amounts are stored as `NUMERIC(12,2)` and travel over the wire as JSON
//! numbers. Every amount the API computes is rounded to two places, midpoint
//! away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Largest difference at which a client-submitted amount still matches the
/// computed one.
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest amount a `NUMERIC(12,2)` column holds: 9 999 999 999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Round an amount to two decimal places.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true when two amounts differ by no more than [`MONEY_TOLERANCE`].
#[must_use]
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b)
        .is_some_and(|diff| diff.abs() <= MONEY_TOLERANCE)
}

/// Round `amount` to cents if it fits in a stored amount column.
#[must_use]
pub fn fit_money(amount: Decimal) -> Option<Decimal> {
    let rounded = round_money(amount);
    (rounded.abs() <= MAX_MONEY).then_some(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_is_one_cent() {
        assert_eq!(MONEY_TOLERANCE, Decimal::new(1, 2));
    }

    #[test]
    fn test_round_money_midpoint_away_from_zero() {
        assert_eq!(round_money(Decimal::new(10_005, 3)), Decimal::new(1001, 2));
        assert_eq!(round_money(Decimal::new(10_004, 3)), Decimal::new(1000, 2));
    }

    #[test]
    fn test_money_eq() {
        assert!(money_eq(Decimal::new(10_000, 2), Decimal::new(10_001, 2)));
        assert!(money_eq(Decimal::new(10_001, 2), Decimal::new(10_000, 2)));
        assert!(!money_eq(Decimal::new(10_000, 2), Decimal::new(10_002, 2)));
        assert!(!money_eq(Decimal::MAX, Decimal::MIN));
    }

    #[test]
    fn test_fit_money() {
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
        assert_eq!(fit_money(MAX_MONEY), Some(MAX_MONEY));
        assert_eq!(fit_money(Decimal::new(12_345, 3)), Some(Decimal::new(1235, 2)));
        assert_eq!(fit_money(MAX_MONEY + Decimal::new(1, 2)), None);
    }
}
