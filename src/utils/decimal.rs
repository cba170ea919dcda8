//! Decimal arithmetic utilities for prices, sizes and PnL.

use crate::models::OrderSide;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Round down to a size precision (the exchange's `szDecimals`).
pub fn round_down_to_decimals(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, rust_decimal::RoundingStrategy::ToZero)
}

/// Signed relative change from `from` to `to` as a fraction (0.01 = 1%).
pub fn relative_change(from: Decimal, to: Decimal) -> Decimal {
    safe_div(to.saturating_sub(from), from)
}

/// Safe division that returns zero if divisor is zero or the quotient is out of range.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Unrealized PnL of a position of `size` opened at `entry_price`, saturating
/// at the `Decimal` bounds.
pub fn calculate_pnl(entry_price: Decimal, current_price: Decimal, size: Decimal, side: OrderSide) -> Decimal {
    let diff = current_price.saturating_sub(entry_price);
    match side {
        OrderSide::Buy => size.saturating_mul(diff),
        OrderSide::Sell => size.saturating_mul(-diff),
    }
}

/// Size so that hitting the stop loses `risk_percent` of the balance.
/// `None` when the inputs overflow.
pub fn position_size_for_risk(
    account_balance: Decimal,
    risk_percent: Decimal,
    entry_price: Decimal,
    stop_loss_price: Decimal,
) -> Option<Decimal> {
    if entry_price.is_zero() || stop_loss_price.is_zero() {
        return Some(Decimal::ZERO);
    }
    let risk_amount = account_balance.checked_mul(risk_percent)?.checked_div(dec!(100))?;
    let distance = entry_price.checked_sub(stop_loss_price)?.abs();
    if distance.is_zero() {
        return Some(Decimal::ZERO);
    }
    risk_amount.checked_div(distance)
}

/// Lossy conversion for the signing SDK, which takes `f64`.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_down_to_decimals() {
        assert_eq!(round_down_to_decimals(dec!(1.5679), 3), dec!(1.567));
        assert_eq!(round_down_to_decimals(dec!(0.00999), 2), dec!(0.00));
    }

    #[test]
    fn test_relative_change() {
        assert_eq!(relative_change(dec!(100), dec!(99)), dec!(-0.01));
        assert_eq!(relative_change(Decimal::ZERO, dec!(99)), Decimal::ZERO);
    }

    #[test]
    fn test_pnl_by_side() {
        assert_eq!(calculate_pnl(dec!(45000), dec!(46500), dec!(0.5), OrderSide::Buy), dec!(750));
        assert_eq!(calculate_pnl(dec!(3200), dec!(3150), dec!(2), OrderSide::Sell), dec!(100));
    }

    #[test]
    fn test_position_size_for_risk() {
        // 2% of 10k = 200 risk, 100 distance to the stop
        assert_eq!(position_size_for_risk(dec!(10000), dec!(2), dec!(1000), dec!(900)), Some(dec!(2)));
        assert_eq!(position_size_for_risk(dec!(10000), dec!(2), dec!(1000), dec!(1000)), Some(Decimal::ZERO));
        assert_eq!(position_size_for_risk(dec!(10000), dec!(2), dec!(1000), Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(position_size_for_risk(Decimal::MAX, dec!(50), dec!(1000), dec!(900)), None);
    }

    #[test]
    fn test_pnl_saturates() {
        assert_eq!(calculate_pnl(dec!(1), Decimal::MAX, Decimal::MAX, OrderSide::Buy), Decimal::MAX);
        assert_eq!(calculate_pnl(dec!(1), Decimal::MAX, Decimal::MAX, OrderSide::Sell), Decimal::MIN);
    }

    #[test]
    fn test_relative_change_out_of_range() {
        assert_eq!(relative_change(dec!(0.0001), Decimal::MAX), Decimal::ZERO);
        assert_eq!(relative_change(Decimal::MIN, Decimal::MAX), dec!(-1));
        assert_eq!(safe_div(dec!(1), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_float_conversion() {
        assert_eq!(to_f64(dec!(0.5)), 0.5);
        assert_eq!(to_f64(dec!(45000.25)), 45000.25);
    }
}
