//! REST handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::engine::EngineStats;
use crate::error::Error;
use crate::exchange::{AccountGateway, MarketDataSource};
use crate::models::{
    featured_coins, Account, ApiCredentials, ApiResponse, Candle, CandleInterval, CoinInfo,
    MarketData, Order, OrderBook, OrderRequest, Portfolio, Strategy, UserSettings, MAX_CANDLES,
};
use crate::persistence::AccountSnapshot;
use crate::service::ApiStatus;
use crate::utils::validate::{is_valid_private_key, is_valid_wallet_address};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

const ORDER_BOOK_DEPTH: usize = 20;
const MAX_ORDER_HISTORY: usize = 1000;

fn ok<T>(message: &str, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(message, data)))
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hypertrader 1.5 API is running" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": Utc::now().to_rfc3339() }))
}

pub async fn portfolio(State(state): State<AppState>) -> ApiResult<Portfolio> {
    ok("Portfolio retrieved successfully", state.service.portfolio().await?)
}

pub async fn account(State(state): State<AppState>) -> ApiResult<Account> {
    ok("Account info retrieved successfully", state.service.account().await?)
}

pub async fn market_data(State(state): State<AppState>, Path(coin): Path<String>) -> ApiResult<MarketData> {
    let data = state.service.market_data(&coin.to_uppercase()).await?;
    ok("Market data retrieved successfully", data)
}

#[derive(Debug, Deserialize)]
pub struct CandleQuery {
    interval: Option<String>,
    limit: Option<usize>,
}

pub async fn candlesticks(
    State(state): State<AppState>,
    Path(coin): Path<String>,
    Query(query): Query<CandleQuery>,
) -> ApiResult<Vec<Candle>> {
    let interval = query
        .interval
        .as_deref()
        .map(CandleInterval::parse_or_default)
        .unwrap_or_default();
    let candles = state
        .service
        .candles(
            &coin.to_uppercase(),
            interval,
            query.limit.unwrap_or(100).min(MAX_CANDLES),
        )
        .await?;
    ok("Candlestick data retrieved successfully", candles)
}

pub async fn order_book(State(state): State<AppState>, Path(coin): Path<String>) -> ApiResult<OrderBook> {
    let book = state
        .service
        .order_book(&coin.to_uppercase(), ORDER_BOOK_DEPTH)
        .await?;
    ok("Order book retrieved successfully", book)
}

pub async fn place_order(
    State(state): State<AppState>,
    Json(mut request): Json<OrderRequest>,
) -> ApiResult<Order> {
    request.coin = request.coin.to_uppercase();
    let order = state.engine.place_order(request).await?;
    ok("Order placed successfully", order)
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path((coin, oid)): Path<(String, u64)>,
) -> ApiResult<u64> {
    if state.engine.cancel_exchange_order(&coin.to_uppercase(), oid).await? {
        ok("Order cancelled successfully", oid)
    } else {
        Ok(Json(ApiResponse::failed(
            "Failed to cancel order",
            format!("exchange refused to cancel order {oid}"),
        )))
    }
}

pub async fn open_orders(State(state): State<AppState>) -> ApiResult<Vec<Order>> {
    ok("Open orders retrieved successfully", state.service.open_orders().await?)
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

pub async fn order_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<Order>> {
    let orders = state
        .service
        .order_history(query.limit.unwrap_or(50).min(MAX_ORDER_HISTORY))
        .await?;
    ok("Order history retrieved successfully", orders)
}

pub async fn list_strategies(State(state): State<AppState>) -> ApiResult<Vec<Strategy>> {
    ok("Strategies retrieved successfully", state.store.get_strategies()?)
}

pub async fn create_strategy(
    State(state): State<AppState>,
    Json(mut strategy): Json<Strategy>,
) -> ApiResult<Strategy> {
    strategy.coin = strategy.coin.to_uppercase();
    state.engine.add_strategy(strategy.clone()).await?;
    ok("Strategy created successfully", strategy)
}

/// Replace a strategy, keeping its id and creation time.
pub async fn update_strategy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut strategy): Json<Strategy>,
) -> ApiResult<Strategy> {
    let existing = state
        .store
        .get_strategy(&id)?
        .ok_or_else(|| Error::NotFound("Strategy".to_string()))?;

    strategy.id = id;
    strategy.coin = strategy.coin.to_uppercase();
    strategy.created_at = existing.created_at;
    strategy.updated_at = Utc::now();
    state.engine.add_strategy(strategy.clone()).await?;
    ok("Strategy updated successfully", strategy)
}

pub async fn delete_strategy(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<String> {
    if !state.store.delete_strategy(&id)? {
        return Err(Error::NotFound("Strategy".to_string()).into());
    }
    state.engine.remove_strategy(&id).await;
    ok("Strategy deleted successfully", id)
}

pub async fn get_settings(State(state): State<AppState>) -> ApiResult<UserSettings> {
    let settings = state.store.load_settings()?;
    ok("Settings retrieved successfully", settings.masked())
}

/// Persist settings. A masked or blank private key keeps the stored one, and
/// changed credentials reconnect the service.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(mut settings): Json<UserSettings>,
) -> ApiResult<UserSettings> {
    let stored = state.store.load_settings()?;
    settings.api_credentials.merge_secret_from(&stored.api_credentials);
    check_credentials(&settings.api_credentials)?;
    settings.id = stored.id;
    settings.created_at = stored.created_at;
    settings.updated_at = Utc::now();

    let (new, old) = (&settings.api_credentials, &stored.api_credentials);
    let credentials_changed = new.wallet_address != old.wallet_address
        || new.private_key != old.private_key
        || new.environment != old.environment;

    if credentials_changed {
        let configured = state.service.reconfigure(settings.api_credentials.clone()).await;
        settings.api_credentials.is_configured = configured;
    }
    state.store.save_settings(&settings)?;

    ok("Settings updated successfully", settings.masked())
}

fn check_credentials(credentials: &ApiCredentials) -> Result<(), Error> {
    if let Some(address) = credentials.wallet_address.as_deref() {
        if !is_valid_wallet_address(address) {
            return Err(Error::InvalidSettings(
                "wallet address must be 0x followed by 40 hex characters".to_string(),
            ));
        }
    }
    if let Some(key) = credentials.private_key.as_deref() {
        if !is_valid_private_key(key) {
            return Err(Error::InvalidSettings("private key must be 64 hex characters".to_string()));
        }
    }
    Ok(())
}

pub async fn api_status(State(state): State<AppState>) -> ApiResult<ApiStatus> {
    ok("API status retrieved successfully", state.service.api_status().await)
}

pub async fn engine_stats(State(state): State<AppState>) -> ApiResult<EngineStats> {
    ok("Engine stats retrieved successfully", state.engine.stats().await)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    days: Option<u32>,
}

pub async fn account_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<AccountSnapshot>> {
    let history = state.store.get_account_history(query.days.unwrap_or(7))?;
    ok("Account history retrieved successfully", history)
}

pub async fn featured() -> ApiResult<Vec<CoinInfo>> {
    ok("Available coins retrieved successfully", featured_coins())
}

pub async fn all_coins(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    ok("All coins retrieved successfully", state.service.available_coins().await?)
}
