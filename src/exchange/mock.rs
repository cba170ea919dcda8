//! Mock exchange producing randomized placeholder data.
//!
//! Used when no wallet credentials are configured, as the fallback when a
//! live account read fails, and for fully offline runs. Shapes are fixed;
//! prices and sizes are jittered around per-coin base prices.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::debug;

use super::traits::{AccountGateway, MarketDataSource};
use crate::error::Result;
use crate::models::{
    Account, Candle, CandleInterval, MarginSummary, MarketData, Order, OrderBook, OrderBookLevel,
    OrderRequest, OrderSide, Portfolio, Position, MAX_CANDLES,
};

/// Address reported by the mock account.
pub const MOCK_ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

const MOCK_COINS: [&str; 4] = ["BTC", "ETH", "SOL", "AVAX"];

/// Reference price a coin's mock data is generated around.
pub fn base_price(coin: &str) -> Decimal {
    match coin {
        "BTC" => dec!(45000),
        "ETH" => dec!(3200),
        "SOL" => dec!(100),
        "AVAX" => dec!(35),
        _ => dec!(100),
    }
}

/// Uniform random decimal in `[low, high)`, rounded to `dp` places.
fn uniform(rng: &mut impl Rng, low: f64, high: f64, dp: u32) -> Decimal {
    let value: f64 = rng.random_range(low..high);
    Decimal::from_f64(value).unwrap_or_default().round_dp(dp)
}

/// Stateless generator of mock account and market data.
#[derive(Debug, Clone, Default)]
pub struct MockExchange;

impl MockExchange {
    pub fn new() -> Self {
        Self
    }

    pub fn mock_portfolio() -> Portfolio {
        let positions = vec![
            Position::new("BTC", OrderSide::Buy, dec!(0.5), dec!(45000), dec!(46500), dec!(750)),
            Position::new("ETH", OrderSide::Buy, dec!(2.0), dec!(3200), dec!(3150), dec!(-100)),
        ];

        Portfolio {
            account_value: dec!(50000),
            available_balance: dec!(25000),
            margin_used: dec!(20000),
            total_pnl: dec!(1250),
            daily_pnl: dec!(350),
            positions,
            ..Portfolio::default()
        }
    }

    pub fn mock_account() -> Account {
        let summary = MarginSummary {
            account_value: dec!(50000),
            total_ntl_pos: dec!(28800),
            total_raw_usd: dec!(21200),
            total_margin_used: dec!(20000),
        };
        Account {
            address: MOCK_ADDRESS.to_string(),
            account_value: dec!(50000),
            margin_summary: summary.clone(),
            cross_margin_summary: summary,
            withdrawable: dec!(25000),
        }
    }

    /// Pending order with a random exchange id in `1_000_000..=9_999_999`.
    pub fn mock_order(request: &OrderRequest) -> Order {
        let oid = rand::rng().random_range(1_000_000..=9_999_999u64);
        Order::pending(request, Some(oid))
    }

    fn mock_orders(count: usize) -> Vec<Order> {
        let mut rng = rand::rng();
        (0..count)
            .map(|_| {
                let coin = MOCK_COINS[rng.random_range(0..MOCK_COINS.len())];
                let is_buy = rng.random_bool(0.5);
                let size = uniform(&mut rng, 0.1, 2.0, 4);
                let price = uniform(&mut rng, 100.0, 50000.0, 2);
                Self::mock_order(&OrderRequest::limit(coin, is_buy, size, price))
            })
            .collect()
    }

    pub fn mock_market_data(coin: &str) -> MarketData {
        let mut rng = rand::rng();
        let price = (base_price(coin) * uniform(&mut rng, 0.95, 1.05, 6)).round_dp(4);

        MarketData {
            coin: coin.to_string(),
            price,
            bid: (price * dec!(0.999)).round_dp(4),
            ask: (price * dec!(1.001)).round_dp(4),
            volume_24h: uniform(&mut rng, 100_000.0, 1_000_000.0, 2),
            change_24h: uniform(&mut rng, -5.0, 5.0, 2),
            timestamp: Utc::now(),
        }
    }

    /// Random walk of `limit` candles ending at the current interval.
    pub fn mock_candles(coin: &str, interval: CandleInterval, limit: usize) -> Vec<Candle> {
        let mut rng = rand::rng();
        let limit = limit.min(MAX_CANDLES);
        let step = Duration::milliseconds(interval.millis());
        let start = Utc::now() - Duration::milliseconds(interval.span_millis(limit));
        let mut price = base_price(coin);

        (0..limit)
            .map(|i| {
                let open = price;
                let close = (open * uniform(&mut rng, 0.98, 1.02, 6)).round_dp(4);
                let high = (open.max(close) * uniform(&mut rng, 1.0, 1.01, 6)).round_dp(4);
                let low = (open.min(close) * uniform(&mut rng, 0.99, 1.0, 6)).round_dp(4);
                price = close;

                Candle {
                    coin: coin.to_string(),
                    timestamp: start + step * i as i32,
                    open,
                    high,
                    low,
                    close,
                    volume: uniform(&mut rng, 1000.0, 10000.0, 2),
                }
            })
            .collect()
    }

    /// Levels 0.1% apart on each side of the base price.
    pub fn mock_order_book(coin: &str, depth: usize) -> OrderBook {
        let mut rng = rand::rng();
        let base = base_price(coin);
        let mut level = |offset: Decimal| OrderBookLevel {
            price: (base * offset).round_dp(4),
            size: uniform(&mut rng, 0.1, 5.0, 4),
        };

        let bids = (1..=depth)
            .map(|i| level(Decimal::ONE - Decimal::from(i) * dec!(0.001)))
            .collect();
        let asks = (1..=depth)
            .map(|i| level(Decimal::ONE + Decimal::from(i) * dec!(0.001)))
            .collect();

        OrderBook::sorted(coin, bids, asks, depth)
    }
}

#[async_trait]
impl AccountGateway for MockExchange {
    async fn portfolio(&self) -> Result<Portfolio> {
        Ok(Self::mock_portfolio())
    }

    async fn account(&self) -> Result<Account> {
        Ok(Self::mock_account())
    }

    async fn open_orders(&self) -> Result<Vec<Order>> {
        Ok(Self::mock_orders(5))
    }

    async fn order_history(&self, limit: usize) -> Result<Vec<Order>> {
        Ok(Self::mock_orders(limit))
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<Order> {
        let order = Self::mock_order(request);
        debug!(coin = %order.coin, oid = ?order.oid, "Mock order placed");
        Ok(order)
    }

    async fn cancel_order(&self, coin: &str, oid: u64) -> Result<bool> {
        debug!(coin, oid, "Mock order cancelled");
        Ok(true)
    }
}

#[async_trait]
impl MarketDataSource for MockExchange {
    async fn market_data(&self, coin: &str) -> Result<MarketData> {
        Ok(Self::mock_market_data(coin))
    }

    async fn candles(&self, coin: &str, interval: CandleInterval, limit: usize) -> Result<Vec<Candle>> {
        Ok(Self::mock_candles(coin, interval, limit))
    }

    async fn order_book(&self, coin: &str, depth: usize) -> Result<OrderBook> {
        Ok(Self::mock_order_book(coin, depth))
    }

    async fn all_mids(&self) -> Result<HashMap<String, Decimal>> {
        Ok(MOCK_COINS
            .iter()
            .map(|coin| (coin.to_string(), Self::mock_market_data(coin).price))
            .collect())
    }

    async fn available_coins(&self) -> Result<Vec<String>> {
        Ok(MOCK_COINS.iter().map(|c| c.to_string()).collect())
    }
}
