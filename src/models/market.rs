//! Market data DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of a coin's price and 24h activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub coin: String,
    pub price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    #[serde(default)]
    pub volume_24h: Decimal,
    /// 24h change in percent
    #[serde(default)]
    pub change_24h: Decimal,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub coin: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Decimal,
}

/// Most candles returned for one request.
pub const MAX_CANDLES: usize = 5000;

/// Candle intervals offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandleInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    #[default]
    OneHour,
    FourHours,
    OneDay,
}

impl CandleInterval {
    /// Parse an interval string; anything unrecognised falls back to one hour.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "1m" => CandleInterval::OneMinute,
            "5m" => CandleInterval::FiveMinutes,
            "15m" => CandleInterval::FifteenMinutes,
            "1h" => CandleInterval::OneHour,
            "4h" => CandleInterval::FourHours,
            "1d" => CandleInterval::OneDay,
            _ => CandleInterval::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::OneDay => "1d",
        }
    }

    /// Interval length in milliseconds.
    pub fn millis(&self) -> i64 {
        const MINUTE: i64 = 60 * 1000;
        match self {
            CandleInterval::OneMinute => MINUTE,
            CandleInterval::FiveMinutes => 5 * MINUTE,
            CandleInterval::FifteenMinutes => 15 * MINUTE,
            CandleInterval::OneHour => 60 * MINUTE,
            CandleInterval::FourHours => 4 * 60 * MINUTE,
            CandleInterval::OneDay => 24 * 60 * MINUTE,
        }
    }

    /// Length of `count` intervals in milliseconds, with `count` capped at [`MAX_CANDLES`].
    pub fn span_millis(&self, count: usize) -> i64 {
        self.millis() * count.min(MAX_CANDLES) as i64
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One price level of the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Two-sided L2 order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub coin: String,
    #[serde(default)]
    pub bids: Vec<OrderBookLevel>,
    #[serde(default)]
    pub asks: Vec<OrderBookLevel>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl OrderBook {
    /// Build a book with bids sorted high to low and asks low to high, each cut to `depth`.
    pub fn sorted(
        coin: impl Into<String>,
        mut bids: Vec<OrderBookLevel>,
        mut asks: Vec<OrderBookLevel>,
        depth: usize,
    ) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        bids.truncate(depth);
        asks.truncate(depth);
        Self {
            coin: coin.into(),
            bids,
            asks,
            timestamp: Utc::now(),
        }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }
}

/// Tradeable coin listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub symbol: String,
    pub name: String,
}

/// Curated coin list shown by default.
pub fn featured_coins() -> Vec<CoinInfo> {
    [
        ("BTC", "Bitcoin"),
        ("ETH", "Ethereum"),
        ("SOL", "Solana"),
        ("AVAX", "Avalanche"),
        ("MATIC", "Polygon"),
        ("LINK", "Chainlink"),
        ("UNI", "Uniswap"),
        ("AAVE", "Aave"),
    ]
    .into_iter()
    .map(|(symbol, name)| CoinInfo {
        symbol: symbol.to_string(),
        name: name.to_string(),
    })
    .collect()
}
