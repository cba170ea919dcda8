//! Type definitions for Hyperliquid API requests and responses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request type for Hyperliquid info endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum InfoRequest {
    /// Get all mid prices.
    #[serde(rename = "allMids")]
    AllMids,

    /// Get perpetuals universe metadata.
    #[serde(rename = "meta")]
    Meta,

    /// Get metadata and asset contexts (funding rates, prices, OI).
    #[serde(rename = "metaAndAssetCtxs")]
    MetaAndAssetCtxs,

    /// Get L2 order book snapshot.
    #[serde(rename = "l2Book")]
    L2Book { coin: String },

    /// Get OHLCV candles for a time window.
    #[serde(rename = "candleSnapshot")]
    CandleSnapshot { req: CandleSnapshotRequest },

    /// Get margin summary and positions of a user.
    #[serde(rename = "clearinghouseState")]
    ClearinghouseState { user: String },

    /// Get resting orders of a user.
    #[serde(rename = "openOrders")]
    OpenOrders { user: String },

    /// Get recent orders of a user with their final status.
    #[serde(rename = "historicalOrders")]
    HistoricalOrders { user: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleSnapshotRequest {
    pub coin: String,
    pub interval: String,
    /// Milliseconds since epoch
    pub start_time: i64,
    pub end_time: i64,
}

/// Response from allMids: coin -> mid price as string.
pub type AllMidsResponse = HashMap<String, String>;

/// Response from metaAndAssetCtxs endpoint.
/// Returns a tuple of (Meta, Vec<AssetCtx>).
pub type MetaAndAssetCtxsResponse = (Meta, Vec<AssetCtx>);

/// Universe metadata for perpetuals.
#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub universe: Vec<AssetMeta>,
}

/// Metadata for a single asset in the universe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    /// Asset name (e.g., "BTC", "ETH")
    pub name: String,
    /// Size decimal precision
    pub sz_decimals: u32,
    /// Maximum allowed leverage
    pub max_leverage: u32,
    /// Whether only isolated margin is allowed
    #[serde(default)]
    pub only_isolated: bool,
    /// Delisted assets stay in the universe with this flag
    #[serde(default)]
    pub is_delisted: bool,
}

/// Real-time context for an asset (prices, funding, volume).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCtx {
    /// Current funding rate (hourly)
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub funding: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub open_interest: Decimal,
    /// Price 24h ago
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub prev_day_px: Decimal,
    /// Daily notional volume
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub day_ntl_vlm: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub oracle_px: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub mark_px: Decimal,
    /// Null for inactive coins
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub mid_px: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub premium: Option<Decimal>,
}

/// Asset metadata joined with its live context.
#[derive(Debug, Clone, Serialize)]
pub struct HyperliquidAsset {
    pub name: String,
    pub sz_decimals: u32,
    pub max_leverage: u32,
    /// Hourly funding rate
    pub funding_rate: Decimal,
    pub open_interest: Decimal,
    pub oracle_price: Decimal,
    pub mark_price: Decimal,
    pub prev_day_price: Decimal,
    /// 24h notional volume
    pub volume_24h: Decimal,
}

impl HyperliquidAsset {
    /// 24h change in percent; zero when there is no previous price.
    pub fn change_24h_percent(&self) -> Decimal {
        if self.prev_day_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.mark_price - self.prev_day_price) / self.prev_day_price * Decimal::ONE_HUNDRED
    }
}

/// Raw L2 book: `levels[0]` are bids, `levels[1]` asks.
#[derive(Debug, Clone, Deserialize)]
pub struct L2BookSnapshot {
    pub coin: String,
    #[serde(default)]
    pub time: i64,
    pub levels: Vec<Vec<L2Level>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct L2Level {
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub px: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub sz: Decimal,
    /// Number of orders at this level
    #[serde(default)]
    pub n: u32,
}

/// Candle as returned by candleSnapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CandleSnapshot {
    /// Open time (ms)
    pub t: i64,
    /// Close time (ms)
    #[serde(rename = "T", default)]
    pub close_time: i64,
    #[serde(rename = "s", default)]
    pub coin: String,
    #[serde(rename = "i", default)]
    pub interval: String,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub o: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub h: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub l: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub c: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub v: Option<Decimal>,
    /// Number of trades
    #[serde(default)]
    pub n: u64,
}

/// Margin summary block of the clearinghouse state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMarginSummary {
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub account_value: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub total_ntl_pos: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub total_raw_usd: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub total_margin_used: Decimal,
}

/// Response from clearinghouseState.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearinghouseState {
    pub margin_summary: WireMarginSummary,
    #[serde(default)]
    pub cross_margin_summary: WireMarginSummary,
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub withdrawable: Option<Decimal>,
    #[serde(default)]
    pub asset_positions: Vec<AssetPosition>,
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetPosition {
    pub position: WirePosition,
    /// "oneWay" for perpetuals
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePosition {
    pub coin: String,
    /// Signed size: positive long, negative short
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub szi: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub entry_px: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub position_value: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub unrealized_pnl: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub liquidation_px: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub margin_used: Option<Decimal>,
}

/// Resting order from openOrders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub coin: String,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub limit_px: Decimal,
    pub oid: u64,
    /// "B" bid or "A" ask
    pub side: String,
    /// Remaining size
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub sz: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub orig_sz: Option<Decimal>,
    /// Milliseconds since epoch
    pub timestamp: i64,
}

/// Entry of historicalOrders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalOrder {
    pub order: HistoricalOrderDetail,
    /// open, filled, canceled, rejected, marginCanceled, ...
    pub status: String,
    #[serde(default)]
    pub status_timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalOrderDetail {
    pub coin: String,
    pub side: String,
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub limit_px: Decimal,
    /// Remaining size
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub sz: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_str_option_null")]
    pub orig_sz: Option<Decimal>,
    pub oid: u64,
    pub timestamp: i64,
    /// "Limit", "Market", "Stop Market", ...
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub tif: Option<String>,
    #[serde(default)]
    pub reduce_only: bool,
}

// WebSocket messages

/// Subscription request sent over the WebSocket.
#[derive(Debug, Clone, Serialize)]
pub struct WsSubscribe {
    pub method: &'static str,
    pub subscription: WsSubscription,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WsSubscription {
    #[serde(rename = "allMids")]
    AllMids,
}

impl WsSubscribe {
    pub fn all_mids() -> Self {
        Self {
            method: "subscribe",
            subscription: WsSubscription::AllMids,
        }
    }
}

/// Inbound WebSocket frame, routed on `channel`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "channel", content = "data")]
pub enum WsMessage {
    #[serde(rename = "allMids")]
    AllMids(WsAllMids),
    #[serde(rename = "subscriptionResponse")]
    SubscriptionResponse(serde_json::Value),
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "error")]
    Error(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsAllMids {
    pub mids: HashMap<String, String>,
}

/// Parse a coin -> price-string map, dropping entries that are not numbers.
pub fn parse_mids(raw: HashMap<String, String>) -> HashMap<String, Decimal> {
    raw.into_iter()
        .filter_map(|(coin, px)| px.parse::<Decimal>().ok().map(|px| (coin, px)))
        .collect()
}

// Custom deserializers for Hyperliquid's string-encoded decimals

fn deserialize_decimal_str<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    s.parse::<Decimal>().map_err(serde::de::Error::custom)
}

/// Deserializer that handles both null JSON values and missing fields.
fn deserialize_decimal_str_option_null<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Option<String>> = Option::deserialize(deserializer)?;
    match opt {
        Some(Some(s)) if !s.is_empty() => s
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
