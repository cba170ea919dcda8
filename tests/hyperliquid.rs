//! Hyperliquid client and live account against a stubbed `info` endpoint.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hypertrader::exchange::{AccountGateway, HyperliquidClient, LiveAccount, MarketDataSource, OrderGateway};
use hypertrader::models::{CandleInterval, Order, OrderRequest, OrderSide, OrderStatus};
use hypertrader::Error;

const WALLET: &str = "0x1234567890abcdef1234567890abcdef12345678";

/// Order gateway for read-only tests.
struct NoOrders;

#[async_trait]
impl OrderGateway for NoOrders {
    async fn place_order(&self, _request: &OrderRequest) -> hypertrader::Result<Order> {
        Err(Error::NotConfigured)
    }

    async fn cancel_order(&self, _coin: &str, _oid: u64) -> hypertrader::Result<bool> {
        Ok(false)
    }
}

async fn stub(server: &MockServer, request: Value, response: Value) {
    Mock::given(method("POST"))
        .and(path("/info"))
        .and(body_partial_json(request))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> HyperliquidClient {
    HyperliquidClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
}

fn asset_ctx(mark: &str, prev: &str, volume: &str) -> Value {
    json!({
        "funding": "0.0000125",
        "openInterest": "1000",
        "prevDayPx": prev,
        "dayNtlVlm": volume,
        "oraclePx": mark,
        "markPx": mark,
        "midPx": mark,
        "premium": null
    })
}

#[tokio::test]
async fn test_market_data_from_mids_and_contexts() {
    let server = MockServer::start().await;
    stub(&server, json!({ "type": "allMids" }), json!({ "BTC": "50000", "ETH": "3000.5" })).await;
    stub(
        &server,
        json!({ "type": "metaAndAssetCtxs" }),
        json!([
            { "universe": [
                { "name": "BTC", "szDecimals": 5, "maxLeverage": 50 },
                { "name": "ETH", "szDecimals": 4, "maxLeverage": 25 }
            ] },
            [asset_ctx("50000", "48000", "1250000000"), asset_ctx("3000", "3000", "500000")]
        ]),
    )
    .await;

    let data = client(&server).market_data("BTC").await.unwrap();
    assert_eq!(data.price, dec!(50000));
    assert_eq!(data.bid, dec!(49950));
    assert_eq!(data.ask, dec!(50050));
    assert_eq!(data.volume_24h, dec!(1250000000));
    assert!(data.change_24h > dec!(4));
}

#[tokio::test]
async fn test_market_data_survives_missing_contexts() {
    let server = MockServer::start().await;
    stub(&server, json!({ "type": "allMids" }), json!({ "SOL": "150" })).await;
    Mock::given(method("POST"))
        .and(path("/info"))
        .and(body_partial_json(json!({ "type": "metaAndAssetCtxs" })))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad request"))
        .mount(&server)
        .await;

    let data = client(&server).market_data("SOL").await.unwrap();
    assert_eq!(data.price, dec!(150));
    assert_eq!(data.volume_24h, dec!(0));
}

#[tokio::test]
async fn test_unknown_coin() {
    let server = MockServer::start().await;
    stub(&server, json!({ "type": "allMids" }), json!({ "BTC": "50000" })).await;

    let err = client(&server).market_data("NOPE").await.unwrap_err();
    assert!(matches!(err, Error::UnknownCoin(coin) if coin == "NOPE"));
}

#[tokio::test]
async fn test_order_book_sorted_and_cut() {
    let server = MockServer::start().await;
    stub(
        &server,
        json!({ "type": "l2Book", "coin": "ETH" }),
        json!({
            "coin": "ETH",
            "time": 1_700_000_000_000i64,
            "levels": [
                [ { "px": "2999", "sz": "1", "n": 1 }, { "px": "3000", "sz": "2", "n": 3 }, { "px": "2998", "sz": "5", "n": 2 } ],
                [ { "px": "3002", "sz": "1", "n": 1 }, { "px": "3001", "sz": "4", "n": 2 } ]
            ]
        }),
    )
    .await;

    let book = client(&server).order_book("ETH", 2).await.unwrap();
    assert_eq!(book.bids.len(), 2);
    assert_eq!(book.best_bid(), Some(dec!(3000)));
    assert_eq!(book.bids[1].price, dec!(2999));
    assert_eq!(book.best_ask(), Some(dec!(3001)));
}

#[tokio::test]
async fn test_candles_keep_most_recent() {
    let server = MockServer::start().await;
    let candles: Vec<Value> = (0..5)
        .map(|i| {
            let close = (100 + i).to_string();
            json!({
                "t": 1_700_000_000_000i64 + i * 3_600_000,
                "T": 1_700_000_000_000i64 + (i + 1) * 3_600_000 - 1,
                "s": "BTC", "i": "1h",
                "o": "100", "h": "110", "l": "90", "c": close, "v": "12.5", "n": 40
            })
        })
        .collect();
    stub(
        &server,
        json!({ "type": "candleSnapshot", "req": { "coin": "BTC", "interval": "1h" } }),
        Value::Array(candles),
    )
    .await;

    let candles = client(&server)
        .candles("BTC", CandleInterval::OneHour, 3)
        .await
        .unwrap();
    assert_eq!(candles.len(), 3);
    assert_eq!(candles[0].close, dec!(102));
    assert_eq!(candles[2].close, dec!(104));
    assert_eq!(candles[2].volume, dec!(12.5));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    stub(&server, json!({ "type": "allMids" }), json!({ "BTC": "50000" })).await;

    let mids = client(&server).with_retries(3).all_mids().await.unwrap();
    assert_eq!(mids["BTC"], dec!(50000));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid user"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).with_retries(3).all_mids().await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 400, ref body } if body == "invalid user"));
}

#[tokio::test]
async fn test_live_portfolio_and_account() {
    let server = MockServer::start().await;
    let summary = json!({
        "accountValue": "12500.5",
        "totalNtlPos": "8000",
        "totalRawUsd": "4500.5",
        "totalMarginUsed": "1600"
    });
    stub(
        &server,
        json!({ "type": "clearinghouseState", "user": WALLET }),
        json!({
            "marginSummary": summary,
            "crossMarginSummary": summary,
            "withdrawable": "10900.5",
            "assetPositions": [
                { "type": "oneWay", "position": {
                    "coin": "ETH", "szi": "-2", "entryPx": "3100", "positionValue": "6000",
                    "unrealizedPnl": "200", "liquidationPx": "4500", "marginUsed": "1200"
                } },
                { "type": "oneWay", "position": {
                    "coin": "SOL", "szi": "0", "entryPx": null, "positionValue": "0",
                    "unrealizedPnl": "0", "liquidationPx": null, "marginUsed": "0"
                } }
            ],
            "time": 1_700_000_000_000i64
        }),
    )
    .await;

    let live = LiveAccount::new(client(&server), Arc::new(NoOrders), WALLET);

    let portfolio = live.portfolio().await.unwrap();
    assert_eq!(portfolio.account_value, dec!(12500.5));
    assert_eq!(portfolio.available_balance, dec!(10900.5));
    assert_eq!(portfolio.positions.len(), 1);
    let eth = &portfolio.positions[0];
    assert_eq!(eth.side, OrderSide::Sell);
    assert_eq!(eth.size, dec!(2));
    assert_eq!(eth.current_price, dec!(3000));
    assert_eq!(portfolio.total_pnl, dec!(200));

    let account = live.account().await.unwrap();
    assert_eq!(account.address, WALLET);
    assert_eq!(account.withdrawable, dec!(10900.5));
}

#[tokio::test]
async fn test_live_order_history_newest_first() {
    let server = MockServer::start().await;
    let entry = |oid: u64, status: &str, at: i64| {
        json!({
            "order": {
                "coin": "BTC", "side": "B", "limitPx": "50000", "sz": "0", "origSz": "0.1",
                "oid": oid, "timestamp": at - 1000, "orderType": "Limit", "tif": "Gtc",
                "reduceOnly": false
            },
            "status": status,
            "statusTimestamp": at
        })
    };
    stub(
        &server,
        json!({ "type": "historicalOrders", "user": WALLET }),
        json!([
            entry(1, "filled", 1_700_000_001_000),
            entry(3, "canceled", 1_700_000_003_000),
            entry(2, "filled", 1_700_000_002_000)
        ]),
    )
    .await;

    let live = LiveAccount::new(client(&server), Arc::new(NoOrders), WALLET);
    let history = live.order_history(2).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].oid, Some(3));
    assert_eq!(history[0].status, OrderStatus::Cancelled);
    assert_eq!(history[1].oid, Some(2));
    assert_eq!(history[1].filled_size, dec!(0.1));
}

#[tokio::test]
async fn test_live_open_orders_are_pending() {
    let server = MockServer::start().await;
    stub(
        &server,
        json!({ "type": "openOrders", "user": WALLET }),
        json!([
            { "coin": "ETH", "limitPx": "2900", "oid": 77, "side": "B", "sz": "0.5",
              "origSz": "1", "timestamp": 1_700_000_000_000i64 }
        ]),
    )
    .await;

    let live = LiveAccount::new(client(&server), Arc::new(NoOrders), WALLET);
    let open = live.open_orders().await.unwrap();

    assert_eq!(open.len(), 1);
    assert_eq!(open[0].status, OrderStatus::Pending);
    assert_eq!(open[0].size, dec!(1));
    assert_eq!(open[0].remaining_size, dec!(0.5));
    assert!(!live.cancel_order("ETH", 77).await.unwrap());
}
