//! Public market data built from the `info` endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::debug;

use super::client::HyperliquidClient;
use super::types::{CandleSnapshot, L2BookSnapshot};
use crate::error::{Error, Result};
use crate::exchange::traits::MarketDataSource;
use crate::models::{Candle, CandleInterval, MarketData, OrderBook, OrderBookLevel, MAX_CANDLES};

/// Synthetic half-spread applied around the mid (0.1%).
const HALF_SPREAD: Decimal = dec!(0.001);

#[async_trait]
impl MarketDataSource for HyperliquidClient {
    async fn market_data(&self, coin: &str) -> Result<MarketData> {
        let mids = self.all_mids().await?;
        let price = mids.get(coin).copied().unwrap_or_default();
        if price <= Decimal::ZERO {
            return Err(Error::UnknownCoin(coin.to_string()));
        }

        // Volume and change are best effort; a failed context fetch still yields a price.
        let (volume_24h, change_24h) = match self.get_assets().await {
            Ok(assets) => assets
                .iter()
                .find(|a| a.name == coin)
                .map(|a| (a.volume_24h, a.change_24h_percent()))
                .unwrap_or_default(),
            Err(e) => {
                debug!(coin, error = %e, "Asset contexts unavailable");
                (Decimal::ZERO, Decimal::ZERO)
            }
        };

        Ok(market_data_from_mid(coin, price, volume_24h, change_24h))
    }

    async fn candles(&self, coin: &str, interval: CandleInterval, limit: usize) -> Result<Vec<Candle>> {
        let limit = limit.min(MAX_CANDLES);
        let end_time = Utc::now().timestamp_millis();
        let start_time = end_time.saturating_sub(interval.span_millis(limit));

        let raw = self.candle_snapshot(coin, interval, start_time, end_time).await?;
        let mut candles: Vec<Candle> = raw.into_iter().map(|c| candle_from_snapshot(coin, c)).collect();

        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        Ok(candles)
    }

    async fn order_book(&self, coin: &str, depth: usize) -> Result<OrderBook> {
        let snapshot = self.l2_book(coin).await?;
        Ok(order_book_from_snapshot(coin, snapshot, depth))
    }

    async fn all_mids(&self) -> Result<HashMap<String, Decimal>> {
        HyperliquidClient::all_mids(self).await
    }

    async fn available_coins(&self) -> Result<Vec<String>> {
        HyperliquidClient::available_coins(self).await
    }
}

/// Market snapshot with bid/ask at 0.1% either side of the mid.
pub(crate) fn market_data_from_mid(
    coin: &str,
    price: Decimal,
    volume_24h: Decimal,
    change_24h: Decimal,
) -> MarketData {
    let spread = price * HALF_SPREAD;
    MarketData {
        coin: coin.to_string(),
        price,
        bid: price - spread,
        ask: price + spread,
        volume_24h,
        change_24h,
        timestamp: Utc::now(),
    }
}

fn candle_from_snapshot(coin: &str, c: CandleSnapshot) -> Candle {
    Candle {
        coin: coin.to_string(),
        timestamp: DateTime::from_timestamp_millis(c.t).unwrap_or_default(),
        open: c.o,
        high: c.h,
        low: c.l,
        close: c.c,
        volume: c.v.unwrap_or_default(),
    }
}

fn order_book_from_snapshot(coin: &str, snapshot: L2BookSnapshot, depth: usize) -> OrderBook {
    let mut sides = snapshot.levels.into_iter().map(|side| {
        side.into_iter()
            .map(|l| OrderBookLevel { price: l.px, size: l.sz })
            .collect::<Vec<_>>()
    });
    let bids = sides.next().unwrap_or_default();
    let asks = sides.next().unwrap_or_default();

    OrderBook::sorted(coin, bids, asks, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::hyperliquid::types::L2Level;

    #[test]
    fn test_synthetic_spread() {
        let data = market_data_from_mid("BTC", dec!(45000), dec!(1000), dec!(1.5));
        assert_eq!(data.bid, dec!(44955));
        assert_eq!(data.ask, dec!(45045));
    }

    #[test]
    fn test_book_conversion_handles_missing_side() {
        let level = |px, sz| L2Level { px, sz, n: 1 };
        let snapshot = L2BookSnapshot {
            coin: "ETH".into(),
            time: 0,
            levels: vec![vec![level(dec!(3199), dec!(1)), level(dec!(3200), dec!(2))]],
        };
        let book = order_book_from_snapshot("ETH", snapshot, 20);
        assert_eq!(book.best_bid(), Some(dec!(3200)));
        assert!(book.asks.is_empty());
    }
}
