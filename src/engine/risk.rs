//! Order validation, per-order risk limits and daily loss tracking.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::TradingConfig;
use crate::error::{Error, Result};
use crate::models::{OrderRequest, OrderType, TimeInForce};

/// Check order parameters. An empty list means the order is well formed.
pub fn validate_order(request: &OrderRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if request.coin.trim().is_empty() {
        errors.push("Coin symbol is required".to_string());
    }
    if request.sz <= Decimal::ZERO {
        errors.push("Order size must be greater than 0".to_string());
    }
    if let Some(price) = request.limit_px {
        if price <= Decimal::ZERO {
            errors.push("Price must be greater than 0".to_string());
        }
    }
    if request.order_type == OrderType::Limit && request.limit_px.is_none() {
        errors.push("Limit orders require a price".to_string());
    }
    if request.time_in_force == TimeInForce::Fok {
        errors.push("Fill-or-kill is not supported; use Gtc, Ioc or Alo".to_string());
    }

    errors
}

/// Realized losses for the current UTC day.
#[derive(Debug, Clone)]
pub struct DailyLossTracker {
    limit: Decimal,
    loss: Decimal,
    day: NaiveDate,
}

impl DailyLossTracker {
    pub fn new(limit: Decimal) -> Self {
        Self::starting_at(limit, Utc::now())
    }

    pub fn starting_at(limit: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            limit,
            loss: Decimal::ZERO,
            day: now.date_naive(),
        }
    }

    /// Start a fresh day once `now` crosses midnight UTC.
    pub fn roll(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.day {
            if !self.loss.is_zero() {
                info!(day = %self.day, loss = %self.loss, "Daily loss reset");
            }
            self.day = today;
            self.loss = Decimal::ZERO;
        }
    }

    /// Add a closed trade's PnL; only losses count.
    pub fn record_pnl(&mut self, pnl: Decimal) {
        if pnl < Decimal::ZERO {
            self.loss = self.loss.saturating_sub(pnl);
        }
    }

    pub fn loss(&self) -> Decimal {
        self.loss
    }

    pub fn limit(&self) -> Decimal {
        self.limit
    }

    pub fn limit_reached(&self) -> bool {
        self.loss >= self.limit
    }
}

/// Reject orders whose notional exceeds `max_position_value`, or any new
/// order once the daily loss limit is reached. Reduce-only orders only shrink
/// exposure and always pass.
///
/// Market orders are sized against `reference_price` (the last known mid);
/// without one the notional check is skipped.
pub fn check_risk_limits(
    request: &OrderRequest,
    reference_price: Option<Decimal>,
    limits: &TradingConfig,
    daily: &DailyLossTracker,
) -> Result<()> {
    if request.reduce_only {
        return Ok(());
    }

    if daily.limit_reached() {
        warn!(loss = %daily.loss(), limit = %daily.limit(), "Daily loss limit reached");
        return Err(Error::RiskLimit(format!(
            "daily loss {} reached the limit of {}",
            daily.loss(),
            daily.limit()
        )));
    }

    let price = match request.order_type {
        OrderType::Limit => request.limit_px,
        OrderType::Market => reference_price,
    };

    if let Some(price) = price {
        let notional = request.sz.checked_mul(price).ok_or_else(|| {
            Error::RiskLimit(format!(
                "order value of {} {} at {} is out of range",
                request.sz, request.coin, price
            ))
        })?;
        if notional > limits.max_position_value {
            warn!(
                coin = %request.coin,
                %notional,
                max = %limits.max_position_value,
                "Order value exceeds max position value"
            );
            return Err(Error::RiskLimit(format!(
                "order value {} exceeds max position value {}",
                notional, limits.max_position_value
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn limits() -> TradingConfig {
        TradingConfig {
            max_position_value: dec!(10000),
            daily_loss_limit: dec!(1000),
            ..TradingConfig::default()
        }
    }

    #[test]
    fn test_validate_order_errors() {
        assert!(validate_order(&OrderRequest::limit("BTC", true, dec!(0.1), dec!(45000))).is_empty());
        assert!(validate_order(&OrderRequest::market("BTC", true, dec!(0.1))).is_empty());

        let mut bad = OrderRequest::limit("", true, dec!(0), dec!(-1));
        bad.time_in_force = TimeInForce::Fok;
        let errors = validate_order(&bad);
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], "Coin symbol is required");

        let mut no_price = OrderRequest::limit("ETH", false, dec!(1), dec!(1));
        no_price.limit_px = None;
        assert_eq!(validate_order(&no_price), vec!["Limit orders require a price".to_string()]);
    }

    #[test]
    fn test_notional_limit() {
        let daily = DailyLossTracker::new(dec!(1000));
        let ok = OrderRequest::limit("BTC", true, dec!(0.2), dec!(45000));
        assert!(check_risk_limits(&ok, None, &limits(), &daily).is_ok());

        let too_big = OrderRequest::limit("BTC", true, dec!(0.3), dec!(45000));
        assert!(matches!(
            check_risk_limits(&too_big, None, &limits(), &daily),
            Err(Error::RiskLimit(_))
        ));
    }

    #[test]
    fn test_market_orders_use_reference_price() {
        let daily = DailyLossTracker::new(dec!(1000));
        let order = OrderRequest::market("ETH", true, dec!(5));
        assert!(check_risk_limits(&order, None, &limits(), &daily).is_ok());
        assert!(check_risk_limits(&order, Some(dec!(1000)), &limits(), &daily).is_ok());
        assert!(check_risk_limits(&order, Some(dec!(3200)), &limits(), &daily).is_err());
    }

    #[test]
    fn test_oversized_notional_is_rejected_not_overflowed() {
        let daily = DailyLossTracker::new(dec!(1000));
        let huge = OrderRequest::limit("BTC", true, Decimal::MAX, dec!(2));
        let err = check_risk_limits(&huge, None, &limits(), &daily).unwrap_err();
        assert!(matches!(err, Error::RiskLimit(msg) if msg.contains("out of range")));
    }

    #[test]
    fn test_reduce_only_exits_bypass_limits() {
        let mut daily = DailyLossTracker::new(dec!(1000));
        let exit = OrderRequest::market("BTC", false, dec!(1)).reduce_only();
        assert!(check_risk_limits(&exit, Some(dec!(43000)), &limits(), &daily).is_ok());

        daily.record_pnl(dec!(-1500));
        assert!(check_risk_limits(&exit, Some(dec!(43000)), &limits(), &daily).is_ok());
        let entry = OrderRequest::market("BTC", true, dec!(0.01));
        assert!(check_risk_limits(&entry, Some(dec!(43000)), &limits(), &daily).is_err());
    }

    #[test]
    fn test_daily_loss_blocks_and_resets() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap();
        let mut daily = DailyLossTracker::starting_at(dec!(1000), start);
        daily.record_pnl(dec!(500));
        daily.record_pnl(dec!(-600));
        daily.record_pnl(dec!(-400));
        assert_eq!(daily.loss(), dec!(1000));
        assert!(daily.limit_reached());

        let small = OrderRequest::limit("SOL", true, dec!(1), dec!(100));
        assert!(check_risk_limits(&small, None, &limits(), &daily).is_err());

        daily.roll(start + chrono::Duration::minutes(30));
        assert!(daily.limit_reached());
        daily.roll(start + chrono::Duration::hours(2));
        assert_eq!(daily.loss(), Decimal::ZERO);
        assert!(check_risk_limits(&small, None, &limits(), &daily).is_ok());
    }
}
