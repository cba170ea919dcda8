//! Hyperliquid REST API client.
//!
//! Wraps the public `info` endpoint:
//! - Mid prices, universe metadata and asset contexts
//! - L2 order books and candles
//! - Per-user clearinghouse state, open orders and order history

use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::types::*;
use super::api_url;
use crate::error::{Error, Result};
use crate::models::{CandleInterval, Environment};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Hyperliquid API client for market and account queries.
#[derive(Debug, Clone)]
pub struct HyperliquidClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
}

impl HyperliquidClient {
    /// Create a new Hyperliquid client for the given network.
    pub fn new(environment: Environment) -> Result<Self> {
        Self::with_base_url(api_url(environment), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new Hyperliquid client with a custom base URL.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_attempts: 1,
        })
    }

    /// Retry transport failures and 5xx/429 answers up to `attempts` times in total.
    pub fn with_retries(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST an info request and decode the JSON body. Info queries are
    /// read-only, so retryable failures are retried with linear backoff.
    async fn post_info<T: DeserializeOwned>(&self, request: &InfoRequest) -> Result<T> {
        let mut attempt = 1;
        loop {
            match self.send_info(request).await {
                Err(e) if attempt < self.max_attempts && is_retryable(&e) => {
                    warn!(attempt, max_attempts = self.max_attempts, error = %e, "Info request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn send_info<T: DeserializeOwned>(&self, request: &InfoRequest) -> Result<T> {
        let url = format!("{}/info", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Get mid prices for every listed coin.
    #[instrument(skip(self), name = "hl_all_mids")]
    pub async fn all_mids(&self) -> Result<HashMap<String, Decimal>> {
        let raw: AllMidsResponse = self.post_info(&InfoRequest::AllMids).await?;
        let mids = parse_mids(raw);
        debug!(count = mids.len(), "Fetched mid prices");
        Ok(mids)
    }

    /// Get perpetuals universe metadata.
    #[instrument(skip(self), name = "hl_meta")]
    pub async fn meta(&self) -> Result<Meta> {
        let meta: Meta = self.post_info(&InfoRequest::Meta).await?;
        debug!("Fetched {} assets from Hyperliquid", meta.universe.len());
        Ok(meta)
    }

    /// Get metadata and asset contexts for all perpetuals.
    /// Returns funding rates, prices, open interest, and volume.
    #[instrument(skip(self), name = "hl_meta_and_asset_ctxs")]
    pub async fn get_meta_and_asset_ctxs(&self) -> Result<(Meta, Vec<AssetCtx>)> {
        let data: MetaAndAssetCtxsResponse =
            self.post_info(&InfoRequest::MetaAndAssetCtxs).await?;

        debug!("Fetched {} asset contexts from Hyperliquid", data.1.len());
        Ok(data)
    }

    /// Get all assets with their current market data.
    /// Combines metadata with asset contexts into a convenient format.
    #[instrument(skip(self), name = "hl_get_assets")]
    pub async fn get_assets(&self) -> Result<Vec<HyperliquidAsset>> {
        let (meta, ctxs) = self.get_meta_and_asset_ctxs().await?;

        if meta.universe.len() != ctxs.len() {
            return Err(Error::Exchange(format!(
                "Mismatch between universe ({}) and contexts ({})",
                meta.universe.len(),
                ctxs.len()
            )));
        }

        let assets: Vec<HyperliquidAsset> = meta
            .universe
            .into_iter()
            .zip(ctxs)
            .map(|(m, c)| HyperliquidAsset {
                name: m.name,
                sz_decimals: m.sz_decimals,
                max_leverage: m.max_leverage,
                funding_rate: c.funding,
                open_interest: c.open_interest,
                oracle_price: c.oracle_px,
                mark_price: c.mark_px,
                prev_day_price: c.prev_day_px,
                volume_24h: c.day_ntl_vlm,
            })
            .collect();

        info!("Fetched {} Hyperliquid perpetual assets", assets.len());
        Ok(assets)
    }

    /// Names of all tradeable (not delisted) perpetuals.
    #[instrument(skip(self), name = "hl_available_coins")]
    pub async fn available_coins(&self) -> Result<Vec<String>> {
        let meta = self.meta().await?;
        Ok(meta
            .universe
            .into_iter()
            .filter(|a| !a.is_delisted)
            .map(|a| a.name)
            .collect())
    }

    /// Get the L2 order book snapshot for a coin.
    #[instrument(skip(self), name = "hl_l2_book")]
    pub async fn l2_book(&self, coin: &str) -> Result<L2BookSnapshot> {
        let request = InfoRequest::L2Book {
            coin: coin.to_string(),
        };
        self.post_info(&request).await
    }

    /// Get candles between `start_time` and `end_time` (ms since epoch).
    #[instrument(skip(self), name = "hl_candle_snapshot")]
    pub async fn candle_snapshot(
        &self,
        coin: &str,
        interval: CandleInterval,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<CandleSnapshot>> {
        let request = InfoRequest::CandleSnapshot {
            req: CandleSnapshotRequest {
                coin: coin.to_string(),
                interval: interval.as_str().to_string(),
                start_time,
                end_time,
            },
        };

        let candles: Vec<CandleSnapshot> = self.post_info(&request).await?;
        debug!(coin, count = candles.len(), "Fetched candles");
        Ok(candles)
    }

    /// Get margin summary and open positions for a wallet.
    #[instrument(skip(self), name = "hl_clearinghouse_state")]
    pub async fn clearinghouse_state(&self, user: &str) -> Result<ClearinghouseState> {
        let request = InfoRequest::ClearinghouseState {
            user: user.to_string(),
        };
        let state: ClearinghouseState = self.post_info(&request).await?;
        debug!(
            account_value = %state.margin_summary.account_value,
            positions = state.asset_positions.len(),
            "Fetched clearinghouse state"
        );
        Ok(state)
    }

    #[instrument(skip(self), name = "hl_open_orders")]
    pub async fn open_orders(&self, user: &str) -> Result<Vec<OpenOrder>> {
        let request = InfoRequest::OpenOrders {
            user: user.to_string(),
        };
        self.post_info(&request).await
    }

    #[instrument(skip(self), name = "hl_historical_orders")]
    pub async fn historical_orders(&self, user: &str) -> Result<Vec<HistoricalOrder>> {
        let request = InfoRequest::HistoricalOrders {
            user: user.to_string(),
        };
        self.post_info(&request).await
    }
}

fn is_retryable(err: &Error) -> bool {
    match err {
        Error::Http(_) => true,
        Error::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_base_url_is_trimmed() {
        let client =
            HyperliquidClient::with_base_url("http://localhost:9000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_mids_and_book() {
        let client = HyperliquidClient::new(Environment::Mainnet).unwrap();
        let mids = client.all_mids().await.unwrap();
        assert!(mids.get("BTC").is_some_and(|px| *px > dec!(0)));

        let book = client.l2_book("BTC").await.unwrap();
        assert_eq!(book.levels.len(), 2);
        println!("BTC mid ${}, {} bid levels", mids["BTC"], book.levels[0].len());
    }
}
