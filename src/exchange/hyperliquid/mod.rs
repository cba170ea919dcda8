//! Hyperliquid exchange integration.
//!
//! - `client`: REST `info` queries (prices, books, candles, user state)
//! - `market`: public market data behind [`MarketDataSource`](crate::exchange::MarketDataSource)
//! - `gateway`: signed orders and cancels through the Rust SDK
//! - `live`: account gateway for a configured wallet
//!
//! Prices and sizes arrive as decimal strings and are parsed into `Decimal`
//! at the wire boundary.

mod client;
mod gateway;
mod live;
mod market;
mod types;

pub use client::HyperliquidClient;
pub use gateway::SdkOrderGateway;
pub use live::LiveAccount;
pub use types::*;

use crate::models::Environment;

/// Base URL for Hyperliquid mainnet API.
pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";
/// Base URL for Hyperliquid testnet API.
pub const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";

const MAINNET_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";
const TESTNET_WS_URL: &str = "wss://api.hyperliquid-testnet.xyz/ws";

pub fn api_url(environment: Environment) -> &'static str {
    match environment {
        Environment::Mainnet => MAINNET_API_URL,
        Environment::Testnet => TESTNET_API_URL,
    }
}

pub fn ws_url(environment: Environment) -> &'static str {
    match environment {
        Environment::Mainnet => MAINNET_WS_URL,
        Environment::Testnet => TESTNET_WS_URL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_urls() {
        assert_eq!(api_url(Environment::Mainnet), "https://api.hyperliquid.xyz");
        assert_eq!(api_url(Environment::Testnet), "https://api.hyperliquid-testnet.xyz");
        assert!(ws_url(Environment::Testnet).ends_with("/ws"));
    }
}
