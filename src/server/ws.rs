//! `/api/ws`: per-socket market and portfolio push.
//!
//! Clients send `{"type":"subscribe_market","coin":"BTC"}` or
//! `{"type":"subscribe_portfolio"}`; each subscription starts its own push
//! loop that runs until the socket closes. Engine events are forwarded to
//! every socket as `engine_event` messages.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::AppState;
use crate::engine::EngineEvent;
use crate::exchange::{AccountGateway, MarketDataSource};

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    SubscribeMarket {
        #[serde(default = "default_coin")]
        coin: String,
    },
    SubscribePortfolio,
}

fn default_coin() -> String {
    "BTC".to_string()
}

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("WebSocket client connected");
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut tasks: Vec<JoinHandle<()>> = vec![tokio::spawn(forward_engine_events(
        state.engine.subscribe(),
        tx.clone(),
    ))];

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::SubscribeMarket { coin }) => {
                    let coin = coin.to_uppercase();
                    debug!(%coin, "Market subscription");
                    tasks.push(tokio::spawn(push_market(state.clone(), coin, tx.clone())));
                }
                Ok(ClientMessage::SubscribePortfolio) => {
                    debug!("Portfolio subscription");
                    tasks.push(tokio::spawn(push_portfolio(state.clone(), tx.clone())));
                }
                Err(e) => debug!(error = %e, "Ignoring unrecognised client message"),
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!(error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    for task in tasks {
        task.abort();
    }
    writer.abort();
    info!("WebSocket client disconnected");
}

async fn push_market(state: AppState, coin: String, tx: mpsc::Sender<String>) {
    let mut interval = tokio::time::interval(state.market_push);
    loop {
        interval.tick().await;
        let data = match state.service.market_data(&coin).await {
            Ok(data) => data,
            Err(e) => {
                warn!(%coin, error = %e, "Market push stopped");
                break;
            }
        };
        let msg = json!({ "type": "market_update", "coin": coin, "data": data });
        if tx.send(msg.to_string()).await.is_err() {
            break;
        }
    }
}

async fn push_portfolio(state: AppState, tx: mpsc::Sender<String>) {
    let mut interval = tokio::time::interval(state.portfolio_push);
    loop {
        interval.tick().await;
        let portfolio = match state.service.portfolio().await {
            Ok(portfolio) => portfolio,
            Err(e) => {
                warn!(error = %e, "Portfolio push stopped");
                break;
            }
        };
        let msg = json!({ "type": "portfolio_update", "data": portfolio });
        if tx.send(msg.to_string()).await.is_err() {
            break;
        }
    }
}

async fn forward_engine_events(
    mut events: broadcast::Receiver<EngineEvent>,
    tx: mpsc::Sender<String>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let msg = json!({ "type": "engine_event", "event": event });
                if tx.send(msg.to_string()).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(skipped = n, "WebSocket client lagged behind engine events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
