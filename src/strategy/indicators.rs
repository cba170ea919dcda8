//! Technical indicators over candle closes and volumes.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::utils::decimal::safe_div;

/// Default RSI lookback.
pub const RSI_PERIOD: usize = 14;

/// Simple moving average of the last `period` values.
///
/// Returns `None` when there are fewer than `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<Decimal>() / Decimal::from(period))
}

/// Relative strength index from simple averages of the last `period` moves.
///
/// Needs `period + 1` values. A window with no losses reads 100; a flat
/// window reads 50.
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((Decimal::ZERO, Decimal::ZERO), |(g, l), delta| {
            if delta > Decimal::ZERO {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let n = Decimal::from(period);
    let avg_gain = gains / n;
    let avg_loss = losses / n;

    if avg_loss.is_zero() {
        return Some(if avg_gain.is_zero() { dec!(50) } else { dec!(100) });
    }

    let rs = safe_div(avg_gain, avg_loss);
    Some(dec!(100) - dec!(100) / (Decimal::ONE + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from(*v)).collect()
    }

    #[test]
    fn test_sma() {
        let values = series(&[1, 2, 3, 4, 5]);
        assert_eq!(sma(&values, 5), Some(dec!(3)));
        assert_eq!(sma(&values, 2), Some(dec!(4.5)));
        assert_eq!(sma(&values, 6), None);
        assert_eq!(sma(&values, 0), None);
    }

    #[test]
    fn test_rsi_extremes() {
        let rising = series(&(1..=15).collect::<Vec<_>>());
        assert_eq!(rsi(&rising, RSI_PERIOD), Some(dec!(100)));

        let flat = vec![dec!(10); 15];
        assert_eq!(rsi(&flat, RSI_PERIOD), Some(dec!(50)));

        let falling = series(&(1..=15).rev().collect::<Vec<_>>());
        assert_eq!(rsi(&falling, RSI_PERIOD), Some(dec!(0)));

        assert_eq!(rsi(&rising[..14], RSI_PERIOD), None);
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // Alternating +1 / -1 gives equal average gain and loss
        let closes: Vec<Decimal> = (0..15).map(|i| if i % 2 == 0 { dec!(10) } else { dec!(11) }).collect();
        assert_eq!(rsi(&closes, RSI_PERIOD), Some(dec!(50)));
    }
}
