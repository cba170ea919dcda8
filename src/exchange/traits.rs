//! Seams between exchange access and the service, engine and HTTP layers.
//!
//! - [`MarketDataSource`]: public prices, candles and books
//! - [`AccountGateway`]: wallet state plus order placement
//! - [`OrderGateway`]: signed order actions only
//!
//! The live Hyperliquid path, the mock data path and the service that picks
//! between them all implement these, so the engine never knows which one it
//! is talking to.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::Result;
use crate::models::{Account, Candle, CandleInterval, MarketData, Order, OrderBook, OrderRequest, Portfolio};

/// Source of public market data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Price, synthetic bid/ask and 24h stats for one coin.
    async fn market_data(&self, coin: &str) -> Result<MarketData>;

    /// The most recent `limit` candles, oldest first.
    async fn candles(&self, coin: &str, interval: CandleInterval, limit: usize) -> Result<Vec<Candle>>;

    /// Sorted two-sided book cut to `depth` levels per side.
    async fn order_book(&self, coin: &str, depth: usize) -> Result<OrderBook>;

    /// Mid price of every listed coin.
    async fn all_mids(&self) -> Result<HashMap<String, Decimal>>;

    /// Names of all tradeable coins.
    async fn available_coins(&self) -> Result<Vec<String>>;
}

/// Wallet state and order entry for one account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn portfolio(&self) -> Result<Portfolio>;

    async fn account(&self) -> Result<Account>;

    /// Orders resting on the book.
    async fn open_orders(&self) -> Result<Vec<Order>>;

    /// Recent orders, newest first.
    async fn order_history(&self, limit: usize) -> Result<Vec<Order>>;

    async fn place_order(&self, request: &OrderRequest) -> Result<Order>;

    /// `true` when the exchange accepted the cancel.
    async fn cancel_order(&self, coin: &str, oid: u64) -> Result<bool>;
}

/// Signed order actions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn place_order(&self, request: &OrderRequest) -> Result<Order>;

    async fn cancel_order(&self, coin: &str, oid: u64) -> Result<bool>;
}
