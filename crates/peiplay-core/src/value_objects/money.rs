//! Decimal rounding helpers for TWD amounts and ratings

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to cents, halves away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round an average rating to one decimal place
pub fn round_rating(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec("10.005")), dec("10.01"));
        assert_eq!(round_money(dec("10.004")), dec("10.00"));
        assert_eq!(round_money(dec("7")), dec("7"));
    }

    #[test]
    fn test_round_rating() {
        assert_eq!(round_rating(dec("4.25")), dec("4.3"));
        assert_eq!(round_rating(dec("3.333")), dec("3.3"));
    }
}
