//! Exchange integrations.
//!
//! ## Hyperliquid
//! REST `info` queries, signed orders through the Rust SDK and a WebSocket
//! mid-price feed.
//!
//! ## Mock
//! Randomized placeholder data used when no wallet is configured or the
//! exchange is unreachable.

pub mod hyperliquid;
pub mod mock;
mod traits;
mod websocket;

pub use hyperliquid::{HyperliquidClient, LiveAccount, SdkOrderGateway};
pub use mock::MockExchange;
pub use traits::*;
pub use websocket::{HyperliquidWebSocket, WsEvent};
