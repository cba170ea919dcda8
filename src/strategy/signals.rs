//! Signal evaluation for user strategies.
//!
//! - Real-time momentum: live mid against the last candle close
//! - Moving-average cross with volume and RSI filters
//! - Take profit / stop loss exits on an open position
//! - Entry confirmation against the live price

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::indicators::{rsi, sma, RSI_PERIOD};
use crate::models::{Candle, EntrySignal, OrderSide, Position, SizeType, Strategy, StrategyConfig};
use crate::utils::decimal::{position_size_for_risk, relative_change, round_down_to_decimals};

/// Volume must exceed its average over this many candles for an MA cross entry.
const VOLUME_SMA_PERIOD: usize = 20;

/// Maximum live-price deviation from the intended entry rate (2%).
const MAX_ENTRY_DEVIATION: Decimal = dec!(0.02);

const RSI_OVERBOUGHT: Decimal = dec!(70);
const RSI_OVERSOLD: Decimal = dec!(30);
const RSI_EXIT_LONG: Decimal = dec!(80);
const RSI_EXIT_SHORT: Decimal = dec!(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    EnterLong,
    EnterShort,
    ExitLong,
    ExitShort,
}

impl SignalAction {
    pub fn is_entry(&self) -> bool {
        matches!(self, SignalAction::EnterLong | SignalAction::EnterShort)
    }

    /// Side of the order that acts on this signal.
    pub fn order_side(&self) -> OrderSide {
        match self {
            SignalAction::EnterLong | SignalAction::ExitShort => OrderSide::Buy,
            SignalAction::EnterShort | SignalAction::ExitLong => OrderSide::Sell,
        }
    }

    fn exit_for(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => SignalAction::ExitLong,
            OrderSide::Sell => SignalAction::ExitShort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub action: SignalAction,
    /// Short tag such as `momentum_long` or `take_profit`
    pub reason: String,
    /// Price the signal was evaluated at
    pub price: Decimal,
}

impl Signal {
    fn new(action: SignalAction, reason: &str, price: Decimal) -> Self {
        Self {
            action,
            reason: reason.to_string(),
            price,
        }
    }
}

/// Evaluate one strategy. With an open position only exits are considered,
/// otherwise only entries.
///
/// `best_price` is the most favourable price seen since the position opened
/// and drives the trailing stop.
pub fn evaluate(
    strategy: &Strategy,
    candles: &[Candle],
    live_price: Decimal,
    position: Option<&Position>,
    best_price: Option<Decimal>,
) -> Option<Signal> {
    if live_price <= Decimal::ZERO {
        return None;
    }

    match position {
        Some(position) => custom_exit(&strategy.config, position, live_price, best_price)
            .or_else(|| signal_exit(&strategy.config.entry_signal, candles, live_price, position.side)),
        None => signal_entry(&strategy.config.entry_signal, candles, live_price),
    }
}

fn signal_entry(signal: &EntrySignal, candles: &[Candle], live_price: Decimal) -> Option<Signal> {
    match signal {
        EntrySignal::None => None,
        EntrySignal::Momentum { threshold } => {
            momentum_entry(candles.last()?.close, live_price, *threshold)
        }
        EntrySignal::MaCross {
            fast_period,
            slow_period,
        } => ma_cross_entry(candles, *fast_period, *slow_period),
    }
}

fn signal_exit(
    signal: &EntrySignal,
    candles: &[Candle],
    live_price: Decimal,
    side: OrderSide,
) -> Option<Signal> {
    let exit = match signal {
        EntrySignal::None => None,
        EntrySignal::Momentum { threshold } => {
            momentum_exit(candles.last()?.close, live_price, *threshold)
        }
        EntrySignal::MaCross {
            fast_period,
            slow_period,
        } => ma_cross_exit(candles, *fast_period, *slow_period, side),
    }?;

    (exit.action == SignalAction::exit_for(side)).then_some(exit)
}

/// Enter long when the live price is more than `threshold` above the last
/// close, short when more than `threshold` below.
pub fn momentum_entry(last_close: Decimal, live_price: Decimal, threshold: Decimal) -> Option<Signal> {
    if last_close <= Decimal::ZERO {
        return None;
    }
    let change = relative_change(last_close, live_price);

    if change > threshold {
        Some(Signal::new(SignalAction::EnterLong, "momentum_long", live_price))
    } else if change < -threshold {
        Some(Signal::new(SignalAction::EnterShort, "momentum_short", live_price))
    } else {
        None
    }
}

/// Exit at half the entry threshold against the position.
pub fn momentum_exit(last_close: Decimal, live_price: Decimal, threshold: Decimal) -> Option<Signal> {
    if last_close <= Decimal::ZERO {
        return None;
    }
    let change = relative_change(last_close, live_price);
    let half = threshold / dec!(2);

    if change < -half {
        Some(Signal::new(SignalAction::ExitLong, "momentum_exit_long", live_price))
    } else if change > half {
        Some(Signal::new(SignalAction::ExitShort, "momentum_exit_short", live_price))
    } else {
        None
    }
}

/// Fast/slow SMA state on the last and the previous candle.
struct Cross {
    up: bool,
    down: bool,
}

fn cross(closes: &[Decimal], fast: usize, slow: usize) -> Option<Cross> {
    let prev = &closes[..closes.len().checked_sub(1)?];
    let (fast_now, slow_now) = (sma(closes, fast)?, sma(closes, slow)?);
    let (fast_prev, slow_prev) = (sma(prev, fast)?, sma(prev, slow)?);

    Some(Cross {
        up: fast_now > slow_now && fast_prev <= slow_prev,
        down: fast_now < slow_now && fast_prev >= slow_prev,
    })
}

/// Fast SMA crossing the slow one, confirmed by above-average volume and an RSI filter.
pub fn ma_cross_entry(candles: &[Candle], fast: usize, slow: usize) -> Option<Signal> {
    let last = candles.last()?;
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();

    let cross = cross(&closes, fast, slow)?;
    let rsi = rsi(&closes, RSI_PERIOD)?;
    let volume_ok = last.volume > sma(&volumes, VOLUME_SMA_PERIOD)?;

    if cross.up && volume_ok && rsi < RSI_OVERBOUGHT {
        Some(Signal::new(SignalAction::EnterLong, "ma_cross_long", last.close))
    } else if cross.down && volume_ok && rsi > RSI_OVERSOLD {
        Some(Signal::new(SignalAction::EnterShort, "ma_cross_short", last.close))
    } else {
        None
    }
}

/// Reverse cross or an RSI extreme against the open side.
pub fn ma_cross_exit(candles: &[Candle], fast: usize, slow: usize, side: OrderSide) -> Option<Signal> {
    let last = candles.last()?;
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();

    let cross = cross(&closes, fast, slow)?;
    let rsi = rsi(&closes, RSI_PERIOD)?;

    match side {
        OrderSide::Buy if cross.down || rsi > RSI_EXIT_LONG => {
            Some(Signal::new(SignalAction::ExitLong, "ma_cross_exit_long", last.close))
        }
        OrderSide::Sell if cross.up || rsi < RSI_EXIT_SHORT => {
            Some(Signal::new(SignalAction::ExitShort, "ma_cross_exit_short", last.close))
        }
        _ => None,
    }
}

/// Take profit / stop loss on the position's profit in percent of entry,
/// then the trailing stop on the giveback from `best_price`.
pub fn custom_exit(
    config: &StrategyConfig,
    position: &Position,
    live_price: Decimal,
    best_price: Option<Decimal>,
) -> Option<Signal> {
    if position.entry_price <= Decimal::ZERO {
        return None;
    }
    let change = relative_change(position.entry_price, live_price).saturating_mul(dec!(100));
    let profit_percent = match position.side {
        OrderSide::Buy => change,
        OrderSide::Sell => -change,
    };
    let action = SignalAction::exit_for(position.side);

    if config.take_profit_enabled && profit_percent >= config.take_profit_percent {
        return Some(Signal::new(action, "take_profit", live_price));
    }
    if config.stop_loss_enabled && profit_percent <= -config.stop_loss_percent {
        return Some(Signal::new(action, "stop_loss", live_price));
    }

    let best = best_price.filter(|p| *p > Decimal::ZERO)?;
    if !config.trailing_stop_enabled || config.trailing_stop_percent <= Decimal::ZERO {
        return None;
    }
    let retrace = relative_change(best, live_price).saturating_mul(dec!(100));
    let giveback = match position.side {
        OrderSide::Buy => -retrace,
        OrderSide::Sell => retrace,
    };
    (giveback >= config.trailing_stop_percent).then(|| Signal::new(action, "trailing_stop", live_price))
}

/// Most favourable price since entry: the high for a long, the low for a short.
///
/// Tracking starts from the entry price.
pub fn best_price(position: &Position, previous: Option<Decimal>, live_price: Decimal) -> Decimal {
    let best = previous.unwrap_or(position.entry_price);
    if best <= Decimal::ZERO {
        return live_price;
    }
    match position.side {
        OrderSide::Buy => best.max(live_price),
        OrderSide::Sell => best.min(live_price),
    }
}

/// Whether an entry at `rate` is still valid given the live price.
///
/// Without a usable live price the entry proceeds unconfirmed.
pub fn confirm_entry(rate: Decimal, live_price: Decimal) -> bool {
    if live_price <= Decimal::ZERO || rate <= Decimal::ZERO {
        return true;
    }
    ((live_price - rate) / rate).abs() < MAX_ENTRY_DEVIATION
}

/// Order size for a new entry, capped at `max_position_size` and rounded down to 4 places.
///
/// Settings that push the arithmetic out of `Decimal` range size to zero.
pub fn entry_size(config: &StrategyConfig, account_value: Decimal, price: Decimal) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let size = match config.entry_size_type {
        SizeType::Fixed => Some(config.entry_size_value),
        SizeType::Percentage => account_value
            .checked_mul(config.entry_size_value)
            .and_then(|v| v.checked_div(dec!(100)))
            .and_then(|v| v.checked_div(price)),
        SizeType::RiskBased => config
            .stop_loss_percent
            .checked_div(dec!(100))
            .and_then(|pct| Decimal::ONE.checked_sub(pct))
            .and_then(|factor| price.checked_mul(factor))
            .and_then(|stop| position_size_for_risk(account_value, config.max_risk_per_trade, price, stop)),
    };

    match size {
        Some(size) => round_down_to_decimals(size.min(config.max_position_size), 4).max(Decimal::ZERO),
        None => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candles(closes: &[Decimal], last_volume: Decimal) -> Vec<Candle> {
        let n = closes.len();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| Candle {
                coin: "BTC".into(),
                timestamp: Utc::now(),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: if i + 1 == n { last_volume } else { dec!(10) },
            })
            .collect()
    }

    /// Twenty falling closes 100..81 and then `last`.
    fn falling_then(last: Decimal) -> Vec<Decimal> {
        let mut closes: Vec<Decimal> = (0..20).map(|i| Decimal::from(100 - i)).collect();
        closes.push(last);
        closes
    }

    /// Twenty rising closes 100..119 and then `last`.
    fn rising_then(last: Decimal) -> Vec<Decimal> {
        let mut closes: Vec<Decimal> = (0..20).map(|i| Decimal::from(100 + i)).collect();
        closes.push(last);
        closes
    }

    fn strategy(signal: EntrySignal) -> Strategy {
        Strategy::new(
            "test",
            "BTC",
            StrategyConfig {
                entry_signal: signal,
                ..StrategyConfig::default()
            },
        )
    }

    #[test]
    fn test_momentum_thresholds() {
        let t = dec!(0.01);
        assert_eq!(momentum_entry(dec!(100), dec!(101.5), t).unwrap().action, SignalAction::EnterLong);
        assert_eq!(momentum_entry(dec!(100), dec!(98.9), t).unwrap().action, SignalAction::EnterShort);
        assert!(momentum_entry(dec!(100), dec!(101), t).is_none());

        assert_eq!(momentum_exit(dec!(100), dec!(99.4), t).unwrap().action, SignalAction::ExitLong);
        assert_eq!(momentum_exit(dec!(100), dec!(100.6), t).unwrap().action, SignalAction::ExitShort);
        assert!(momentum_exit(dec!(100), dec!(100.4), t).is_none());
    }

    #[test]
    fn test_ma_cross_long_entry() {
        let series = candles(&falling_then(dec!(90)), dec!(50));
        let signal = ma_cross_entry(&series, 2, 3).unwrap();
        assert_eq!(signal.action, SignalAction::EnterLong);
        assert_eq!(signal.price, dec!(90));
    }

    #[test]
    fn test_ma_cross_needs_volume() {
        let series = candles(&falling_then(dec!(90)), dec!(10));
        assert!(ma_cross_entry(&series, 2, 3).is_none());
    }

    #[test]
    fn test_ma_cross_short_entry_and_long_exit() {
        let series = candles(&rising_then(dec!(110)), dec!(50));
        assert_eq!(ma_cross_entry(&series, 2, 3).unwrap().action, SignalAction::EnterShort);
        assert_eq!(
            ma_cross_exit(&series, 2, 3, OrderSide::Buy).unwrap().action,
            SignalAction::ExitLong
        );
        assert!(ma_cross_exit(&series, 2, 3, OrderSide::Sell).is_none());
    }

    #[test]
    fn test_ma_cross_short_history() {
        let series = candles(&[dec!(1), dec!(2)], dec!(5));
        assert!(ma_cross_entry(&series, 2, 3).is_none());
    }

    #[test]
    fn test_take_profit_and_stop_loss() {
        let config = StrategyConfig {
            take_profit_enabled: true,
            stop_loss_enabled: true,
            ..StrategyConfig::default()
        };
        let long = Position::new("BTC", OrderSide::Buy, dec!(1), dec!(100), dec!(100), dec!(0));
        let short = Position::new("BTC", OrderSide::Sell, dec!(1), dec!(100), dec!(100), dec!(0));

        let tp = custom_exit(&config, &long, dec!(105), None).unwrap();
        assert_eq!((tp.action, tp.reason.as_str()), (SignalAction::ExitLong, "take_profit"));

        let sl = custom_exit(&config, &long, dec!(98), None).unwrap();
        assert_eq!(sl.reason, "stop_loss");

        let short_tp = custom_exit(&config, &short, dec!(95), None).unwrap();
        assert_eq!(short_tp.action, SignalAction::ExitShort);
        assert!(custom_exit(&config, &short, dec!(101), None).is_none());

        assert!(custom_exit(&StrategyConfig::default(), &long, dec!(150), None).is_none());
    }

    #[test]
    fn test_evaluate_prefers_exits_with_position() {
        let s = strategy(EntrySignal::Momentum { threshold: dec!(0.01) });
        let series = candles(&[dec!(100)], dec!(10));
        let long = Position::new("BTC", OrderSide::Buy, dec!(1), dec!(100), dec!(99), dec!(-1));

        assert_eq!(evaluate(&s, &series, dec!(102), None, None).unwrap().action, SignalAction::EnterLong);
        assert_eq!(evaluate(&s, &series, dec!(99), Some(&long), None).unwrap().action, SignalAction::ExitLong);
        // Rising price does not exit a long
        assert!(evaluate(&s, &series, dec!(102), Some(&long), None).is_none());
        assert!(evaluate(&s, &series, Decimal::ZERO, None, None).is_none());
    }

    #[test]
    fn test_trailing_stop_gives_back_from_best_price() {
        let config = StrategyConfig {
            trailing_stop_enabled: true,
            trailing_stop_percent: dec!(2),
            ..StrategyConfig::default()
        };
        let long = Position::new("ETH", OrderSide::Buy, dec!(1), dec!(100), dec!(100), dec!(0));
        let short = Position::new("ETH", OrderSide::Sell, dec!(1), dec!(100), dec!(100), dec!(0));

        // Still in profit, but 2.7% off the high
        let exit = custom_exit(&config, &long, dec!(107), Some(dec!(110))).unwrap();
        assert_eq!((exit.action, exit.reason.as_str()), (SignalAction::ExitLong, "trailing_stop"));
        assert!(custom_exit(&config, &long, dec!(108.5), Some(dec!(110))).is_none());
        assert!(custom_exit(&config, &long, dec!(107), None).is_none());

        let exit = custom_exit(&config, &short, dec!(92), Some(dec!(90))).unwrap();
        assert_eq!(exit.action, SignalAction::ExitShort);
        assert!(custom_exit(&config, &short, dec!(91), Some(dec!(90))).is_none());

        let disabled = StrategyConfig::default();
        assert!(custom_exit(&disabled, &long, dec!(101), Some(dec!(110))).is_none());
    }

    #[test]
    fn test_best_price_tracks_favourable_side() {
        let long = Position::new("ETH", OrderSide::Buy, dec!(1), dec!(100), dec!(100), dec!(0));
        let short = Position::new("ETH", OrderSide::Sell, dec!(1), dec!(100), dec!(100), dec!(0));

        assert_eq!(best_price(&long, None, dec!(98)), dec!(100));
        assert_eq!(best_price(&long, Some(dec!(110)), dec!(105)), dec!(110));
        assert_eq!(best_price(&long, Some(dec!(110)), dec!(112)), dec!(112));
        assert_eq!(best_price(&short, None, dec!(95)), dec!(95));
        assert_eq!(best_price(&short, Some(dec!(95)), dec!(97)), dec!(95));
    }

    #[test]
    fn test_confirm_entry() {
        assert!(confirm_entry(dec!(100), dec!(101.9)));
        assert!(!confirm_entry(dec!(100), dec!(102)));
        assert!(!confirm_entry(dec!(100), dec!(97)));
        assert!(confirm_entry(dec!(100), Decimal::ZERO));
    }

    #[test]
    fn test_entry_size() {
        let mut config = StrategyConfig::default();
        assert_eq!(entry_size(&config, dec!(10000), dec!(100)), dec!(0.1));

        config.entry_size_type = SizeType::Percentage;
        config.entry_size_value = dec!(0.5);
        assert_eq!(entry_size(&config, dec!(10000), dec!(100)), dec!(0.5));

        config.entry_size_type = SizeType::RiskBased;
        config.max_position_size = dec!(100);
        // 2% of 10000 at risk over a 2% stop from 100 (distance 2)
        assert_eq!(entry_size(&config, dec!(10000), dec!(100)), dec!(100));
        config.max_position_size = dec!(1);
        assert_eq!(entry_size(&config, dec!(10000), dec!(100)), dec!(1));
    }

    #[test]
    fn test_entry_size_out_of_range_settings() {
        let mut config = StrategyConfig {
            entry_size_type: SizeType::Percentage,
            entry_size_value: Decimal::MAX,
            ..StrategyConfig::default()
        };
        assert_eq!(entry_size(&config, dec!(10000), dec!(100)), Decimal::ZERO);

        config.entry_size_type = SizeType::RiskBased;
        config.stop_loss_percent = Decimal::MAX;
        assert_eq!(entry_size(&config, dec!(10000), dec!(100)), Decimal::ZERO);
    }
}
