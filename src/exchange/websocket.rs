//! Hyperliquid WebSocket client for real-time mid prices.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::hyperliquid::{parse_mids, ws_url, WsMessage, WsSubscribe};
use crate::models::Environment;

/// WebSocket event types.
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// Mid price snapshot for every coin
    AllMids(HashMap<String, Decimal>),
    /// Connection established
    Connected,
    /// Connection lost
    Disconnected,
}

/// Hyperliquid WebSocket client.
pub struct HyperliquidWebSocket {
    url: String,
}

impl HyperliquidWebSocket {
    /// Create a new WebSocket client.
    pub fn new(environment: Environment) -> Self {
        Self::with_url(ws_url(environment))
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    /// Subscribe to mid prices for all coins.
    pub async fn subscribe_all_mids(&self, tx: mpsc::Sender<WsEvent>) -> Result<()> {
        let subscription = serde_json::to_string(&WsSubscribe::all_mids())?;
        self.connect_and_handle(subscription, tx, parse_event).await
    }

    /// Generic WebSocket connection handler.
    async fn connect_and_handle<F>(
        &self,
        subscription: String,
        tx: mpsc::Sender<WsEvent>,
        parser: F,
    ) -> Result<()>
    where
        F: Fn(&str) -> Vec<WsEvent> + Send + 'static,
    {
        info!("Connecting to WebSocket: {}", self.url);

        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .context("Failed to connect to WebSocket")?;

        let (mut write, mut read) = ws_stream.split();

        write
            .send(Message::Text(subscription.into()))
            .await
            .context("Failed to send subscription")?;

        // Notify connection established
        let _ = tx.send(WsEvent::Connected).await;

        // Handle incoming messages
        tokio::spawn(async move {
            // Keep the write half alive so the socket is not half-closed
            let _write = write;

            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        for event in parser(text.as_str()) {
                            if tx.send(event).await.is_err() {
                                warn!("Event receiver dropped");
                                return;
                            }
                        }
                    }
                    Ok(Message::Ping(_data)) => {
                        debug!("Received ping, sending pong");
                        // Pong is handled automatically by tungstenite
                    }
                    Ok(Message::Close(_)) => {
                        info!("WebSocket closed by server");
                        let _ = tx.send(WsEvent::Disconnected).await;
                        return;
                    }
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        let _ = tx.send(WsEvent::Disconnected).await;
                        return;
                    }
                    _ => {}
                }
            }

            let _ = tx.send(WsEvent::Disconnected).await;
        });

        Ok(())
    }
}

fn parse_event(text: &str) -> Vec<WsEvent> {
    match serde_json::from_str::<WsMessage>(text) {
        Ok(WsMessage::AllMids(data)) => vec![WsEvent::AllMids(parse_mids(data.mids))],
        Ok(WsMessage::SubscriptionResponse(_)) => {
            debug!("Subscription acknowledged");
            vec![]
        }
        Ok(WsMessage::Error(err)) => {
            warn!("WebSocket error message: {}", err);
            vec![]
        }
        Ok(WsMessage::Pong) | Err(_) => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_all_mids_event() {
        let events = parse_event(r#"{"channel":"allMids","data":{"mids":{"BTC":"45000.5"}}}"#);
        assert_eq!(events.len(), 1);
        match &events[0] {
            WsEvent::AllMids(mids) => assert_eq!(mids.get("BTC"), Some(&dec!(45000.5))),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_ignores_acks_and_garbage() {
        assert!(parse_event(r#"{"channel":"subscriptionResponse","data":{"method":"subscribe"}}"#).is_empty());
        assert!(parse_event("not json").is_empty());
    }
}
