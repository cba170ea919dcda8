//! Configuration management for hypertrader.
//!
//! Loads settings from an optional `config` file, `HYPERTRADER__*` environment
//! variables and the legacy `HYPERLIQUID_*` credential variables.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{ApiCredentials, Environment};
use crate::utils::validate::{is_valid_private_key, is_valid_wallet_address};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hyperliquid wallet and connection settings
    #[serde(default)]
    pub hyperliquid: HyperliquidConfig,
    /// HTTP server binding
    #[serde(default)]
    pub server: ServerConfig,
    /// SQLite storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// Order sizing and risk limits
    #[serde(default)]
    pub trading: TradingConfig,
    /// Refresh and push intervals
    #[serde(default)]
    pub polling: PollingConfig,
    /// Exchange read caching
    #[serde(default)]
    pub cache: CacheConfig,
    /// Local monitor
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperliquidConfig {
    /// Main wallet address (public)
    #[serde(default)]
    pub wallet_address: String,
    /// API wallet private key used for signing
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub environment: Environment,
    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Serve mock market data instead of calling the public API
    #[serde(default)]
    pub offline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file; `:memory:` keeps everything in RAM
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Days of orders, trades and account snapshots kept by cleanup
    #[serde(default = "default_history_retention_days")]
    pub history_retention_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Size used by the monitor when a strategy signals an entry
    #[serde(default = "default_order_size")]
    pub default_order_size: Decimal,
    /// Largest notional (size x price) accepted for a single order, in USD
    #[serde(default = "default_max_position_value")]
    pub max_position_value: Decimal,
    /// Realized loss in USD after which no new orders are accepted for the day
    #[serde(default = "default_daily_loss_limit")]
    pub daily_loss_limit: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Monitor refresh interval
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// WebSocket `market_update` interval
    #[serde(default = "default_market_push_secs")]
    pub market_push_secs: u64,
    /// WebSocket `portfolio_update` interval
    #[serde(default = "default_portfolio_push_secs")]
    pub portfolio_push_secs: u64,
    /// Trading engine cycle
    #[serde(default = "default_engine_tick_secs")]
    pub engine_tick_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Portfolio and account reads
    #[serde(default = "default_account_ttl_secs")]
    pub account_ttl_secs: u64,
    /// Per-coin market data
    #[serde(default = "default_market_ttl_secs")]
    pub market_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_watched_coins")]
    pub watched_coins: Vec<String>,
}

// Default value functions
fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_db_path() -> String {
    "data/hypertrader.db".to_string()
}

fn default_history_retention_days() -> u32 {
    30
}

fn default_order_size() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

fn default_max_position_value() -> Decimal {
    Decimal::from(10_000)
}

fn default_daily_loss_limit() -> Decimal {
    Decimal::from(1_000)
}

fn default_refresh_secs() -> u64 {
    5
}

fn default_market_push_secs() -> u64 {
    5
}

fn default_portfolio_push_secs() -> u64 {
    10
}

fn default_engine_tick_secs() -> u64 {
    1
}

fn default_account_ttl_secs() -> u64 {
    5
}

fn default_market_ttl_secs() -> u64 {
    2
}

fn default_watched_coins() -> Vec<String> {
    ["BTC", "ETH", "SOL"].iter().map(|c| c.to_string()).collect()
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("HYPERTRADER"))
            .build()
            .context("Failed to build configuration")?;

        let mut config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.apply_legacy_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay the plain `HYPERLIQUID_*` variables used by earlier deployments.
    fn apply_legacy_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(address) = non_empty("HYPERLIQUID_WALLET_ADDRESS") {
            self.hyperliquid.wallet_address = address;
        }
        if let Some(key) = non_empty("HYPERLIQUID_PRIVATE_KEY").or_else(|| non_empty("HYPERLIQUID_API_SECRET")) {
            self.hyperliquid.private_key = key;
        }
        if let Some(env) = non_empty("HYPERLIQUID_ENV") {
            self.hyperliquid.environment = Environment::parse_lenient(&env);
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.hyperliquid.timeout_secs > 0, "timeout_secs must be positive");

        anyhow::ensure!(
            self.trading.default_order_size > Decimal::ZERO,
            "default_order_size must be positive"
        );

        anyhow::ensure!(
            self.trading.max_position_value > Decimal::ZERO
                && self.trading.daily_loss_limit > Decimal::ZERO,
            "max_position_value and daily_loss_limit must be positive"
        );

        anyhow::ensure!(
            self.polling.refresh_secs > 0
                && self.polling.market_push_secs > 0
                && self.polling.portfolio_push_secs > 0
                && self.polling.engine_tick_secs > 0,
            "polling intervals must be at least one second"
        );

        let wallet = self.hyperliquid.wallet_address.trim();
        anyhow::ensure!(
            wallet.is_empty() || is_valid_wallet_address(wallet),
            "wallet_address must be 0x followed by 40 hex characters"
        );

        let key = self.hyperliquid.private_key.trim();
        anyhow::ensure!(
            key.is_empty() || is_valid_private_key(key),
            "private_key must be 64 hex characters"
        );

        anyhow::ensure!(
            self.storage.history_retention_days > 0,
            "history_retention_days must be positive"
        );

        Ok(())
    }

    /// Credentials from the `hyperliquid` section; blank values count as missing.
    pub fn credentials(&self) -> ApiCredentials {
        ApiCredentials::new(
            Some(self.hyperliquid.wallet_address.clone()),
            Some(self.hyperliquid.private_key.clone()),
            self.hyperliquid.environment,
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.hyperliquid.timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hyperliquid: HyperliquidConfig::default(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            trading: TradingConfig::default(),
            polling: PollingConfig::default(),
            cache: CacheConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Default for HyperliquidConfig {
    fn default() -> Self {
        Self {
            wallet_address: String::new(),
            private_key: String::new(),
            environment: Environment::default(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            offline: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            history_retention_days: default_history_retention_days(),
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            default_order_size: default_order_size(),
            max_position_value: default_max_position_value(),
            daily_loss_limit: default_daily_loss_limit(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
            market_push_secs: default_market_push_secs(),
            portfolio_push_secs: default_portfolio_push_secs(),
            engine_tick_secs: default_engine_tick_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            account_ttl_secs: default_account_ttl_secs(),
            market_ttl_secs: default_market_ttl_secs(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            watched_coins: default_watched_coins(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8001");
        assert_eq!(config.hyperliquid.environment, Environment::Testnet);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config = Config::default();
        config.polling.engine_tick_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_loss_limit_is_rejected() {
        let mut config = Config::default();
        config.trading.daily_loss_limit = dec!(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_legacy_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HYPERLIQUID_WALLET_ADDRESS", "0xabc"),
            ("HYPERLIQUID_PRIVATE_KEY", ""),
            ("HYPERLIQUID_API_SECRET", "secret"),
            ("HYPERLIQUID_ENV", "Mainnet"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_legacy_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.hyperliquid.wallet_address, "0xabc");
        assert_eq!(config.hyperliquid.private_key, "secret");
        assert_eq!(config.hyperliquid.environment, Environment::Mainnet);
        assert!(config.credentials().is_configured);
    }

    #[test]
    fn test_malformed_wallet_fails_validation() {
        let mut config = Config::default();
        config.hyperliquid.wallet_address = "0xabc".to_string();
        assert!(config.validate().is_err());

        config.hyperliquid.wallet_address = "0x1234567890abcdef1234567890abcdef12345678".to_string();
        config.hyperliquid.private_key = "ab".repeat(32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_credentials_are_unconfigured() {
        let creds = Config::default().credentials();
        assert!(!creds.is_configured);
        assert!(creds.wallet_address.is_none());
    }
}
