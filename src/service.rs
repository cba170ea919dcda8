//! Hyperliquid service: picks between the live account and mock data.
//!
//! Account reads fall back to mock data when the wallet is not configured or
//! a live call fails. Order actions only use mock data when no wallet is
//! configured; for a configured wallet their errors propagate. Market reads
//! always go to the public mainnet API whatever network the wallet trades on
//! (or to the mock source when running offline).

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::cache::TtlCache;
use crate::config::{CacheConfig, Config};
use crate::error::Result;
use crate::exchange::hyperliquid::api_url;
use crate::exchange::{
    AccountGateway, HyperliquidClient, LiveAccount, MarketDataSource, MockExchange, SdkOrderGateway,
};
use crate::models::{
    Account, ApiCredentials, Candle, CandleInterval, Environment, MarketData, Order, OrderBook,
    OrderRequest, Portfolio,
};

/// Connection report for the settings page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiStatus {
    pub is_configured: bool,
    pub environment: Environment,
    pub wallet_address: Option<String>,
    /// `None` when no wallet is configured
    pub test_result: Option<String>,
}

/// Network that public prices, candles and books are read from.
pub const MARKET_DATA_ENVIRONMENT: Environment = Environment::Mainnet;

pub struct HyperliquidService {
    market: Arc<dyn MarketDataSource>,
    /// `None` when market data is not read from Hyperliquid
    market_environment: Option<Environment>,
    mock: MockExchange,
    live: RwLock<Option<Arc<dyn AccountGateway>>>,
    credentials: RwLock<ApiCredentials>,
    portfolio_cache: TtlCache<(), Portfolio>,
    account_cache: TtlCache<(), Account>,
    market_cache: TtlCache<String, MarketData>,
    account_ttl: Duration,
    market_ttl: Duration,
    timeout: Duration,
    retries: u32,
}

impl HyperliquidService {
    /// Build from configuration, connecting the live account when credentials are set.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.request_timeout();
        let (market, market_environment): (Arc<dyn MarketDataSource>, _) = if config.hyperliquid.offline {
            info!("Offline mode: serving mock market data");
            (Arc::new(MockExchange::new()), None)
        } else {
            let client = HyperliquidClient::with_base_url(api_url(MARKET_DATA_ENVIRONMENT), timeout)?
                .with_retries(config.hyperliquid.retry_attempts);
            (Arc::new(client), Some(MARKET_DATA_ENVIRONMENT))
        };

        let mut service = Self::with_parts(market, None, ApiCredentials::default(), &config.cache)
            .with_client_settings(timeout, config.hyperliquid.retry_attempts);
        service.market_environment = market_environment;
        service.reconfigure(config.credentials()).await;
        Ok(service)
    }

    /// Assemble from ready-made parts. `credentials.is_configured` is taken as given.
    pub fn with_parts(
        market: Arc<dyn MarketDataSource>,
        live: Option<Arc<dyn AccountGateway>>,
        credentials: ApiCredentials,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            market,
            market_environment: None,
            mock: MockExchange::new(),
            live: RwLock::new(live),
            credentials: RwLock::new(credentials),
            portfolio_cache: TtlCache::new(),
            account_cache: TtlCache::new(),
            market_cache: TtlCache::new(),
            account_ttl: Duration::from_secs(cache.account_ttl_secs),
            market_ttl: Duration::from_secs(cache.market_ttl_secs),
            timeout: Duration::from_secs(30),
            retries: 1,
        }
    }

    fn with_client_settings(mut self, timeout: Duration, retries: u32) -> Self {
        self.timeout = timeout;
        self.retries = retries;
        self
    }

    /// Swap in new credentials and rebuild the live account.
    ///
    /// Returns whether the service ended up configured. A signing client that
    /// fails to build leaves the service on mock data.
    pub async fn reconfigure(&self, credentials: ApiCredentials) -> bool {
        let live = match self.connect_live(&credentials).await {
            Ok(live) => live,
            Err(e) => {
                warn!(error = %e, "Failed to initialize Hyperliquid client, using mock data");
                None
            }
        };

        let configured = live.is_some();
        *self.live.write().await = live;
        *self.credentials.write().await = ApiCredentials {
            is_configured: configured,
            ..credentials
        };

        self.portfolio_cache.clear().await;
        self.account_cache.clear().await;

        info!(configured, "Hyperliquid service configured");
        configured
    }

    async fn connect_live(&self, credentials: &ApiCredentials) -> Result<Option<Arc<dyn AccountGateway>>> {
        let (Some(wallet), Some(key)) = (&credentials.wallet_address, &credentials.private_key) else {
            return Ok(None);
        };

        let orders = SdkOrderGateway::connect(key, credentials.environment).await?;
        let info = HyperliquidClient::with_base_url(api_url(credentials.environment), self.timeout)?
            .with_retries(self.retries);
        Ok(Some(Arc::new(LiveAccount::new(info, Arc::new(orders), wallet.clone()))))
    }

    pub async fn is_configured(&self) -> bool {
        self.live.read().await.is_some()
    }

    pub async fn credentials(&self) -> ApiCredentials {
        self.credentials.read().await.clone()
    }

    /// Network the configured wallet trades on.
    pub async fn environment(&self) -> Environment {
        self.credentials.read().await.environment
    }

    /// Network the market data comes from, which a live price feed must match.
    pub fn market_environment(&self) -> Option<Environment> {
        self.market_environment
    }

    async fn live(&self) -> Option<Arc<dyn AccountGateway>> {
        self.live.read().await.clone()
    }

    /// Configured flag, environment and the result of a live account read.
    #[instrument(skip(self))]
    pub async fn api_status(&self) -> ApiStatus {
        let credentials = self.credentials().await;
        let test_result = match self.live().await {
            Some(live) => Some(match live.account().await {
                Ok(_) => "Connected successfully".to_string(),
                Err(e) => format!("Connection failed: {e}"),
            }),
            None => None,
        };

        ApiStatus {
            is_configured: test_result.is_some(),
            environment: credentials.environment,
            wallet_address: credentials.wallet_address,
            test_result,
        }
    }
}

#[async_trait]
impl AccountGateway for HyperliquidService {
    async fn portfolio(&self) -> Result<Portfolio> {
        let Some(live) = self.live().await else {
            return self.mock.portfolio().await;
        };
        if let Some(cached) = self.portfolio_cache.get(&(), self.account_ttl).await {
            return Ok(cached);
        }

        match live.portfolio().await {
            Ok(portfolio) => {
                self.portfolio_cache.insert((), portfolio.clone()).await;
                Ok(portfolio)
            }
            Err(e) => {
                warn!(error = %e, "Live portfolio read failed, using mock data");
                self.mock.portfolio().await
            }
        }
    }

    async fn account(&self) -> Result<Account> {
        let Some(live) = self.live().await else {
            return self.mock.account().await;
        };
        if let Some(cached) = self.account_cache.get(&(), self.account_ttl).await {
            return Ok(cached);
        }

        match live.account().await {
            Ok(account) => {
                self.account_cache.insert((), account.clone()).await;
                Ok(account)
            }
            Err(e) => {
                warn!(error = %e, "Live account read failed, using mock data");
                self.mock.account().await
            }
        }
    }

    async fn open_orders(&self) -> Result<Vec<Order>> {
        match self.live().await {
            Some(live) => match live.open_orders().await {
                Ok(orders) => Ok(orders),
                Err(e) => {
                    warn!(error = %e, "Live open orders read failed, using mock data");
                    self.mock.open_orders().await
                }
            },
            None => self.mock.open_orders().await,
        }
    }

    async fn order_history(&self, limit: usize) -> Result<Vec<Order>> {
        match self.live().await {
            Some(live) => match live.order_history(limit).await {
                Ok(orders) => Ok(orders),
                Err(e) => {
                    warn!(error = %e, "Live order history read failed, using mock data");
                    self.mock.order_history(limit).await
                }
            },
            None => self.mock.order_history(limit).await,
        }
    }

    #[instrument(skip(self, request), fields(coin = %request.coin))]
    async fn place_order(&self, request: &OrderRequest) -> Result<Order> {
        match self.live().await {
            Some(live) => {
                let order = live.place_order(request).await?;
                self.portfolio_cache.clear().await;
                self.account_cache.clear().await;
                Ok(order)
            }
            None => self.mock.place_order(request).await,
        }
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, coin: &str, oid: u64) -> Result<bool> {
        match self.live().await {
            Some(live) => live.cancel_order(coin, oid).await,
            None => self.mock.cancel_order(coin, oid).await,
        }
    }
}

#[async_trait]
impl MarketDataSource for HyperliquidService {
    async fn market_data(&self, coin: &str) -> Result<MarketData> {
        let key = coin.to_string();
        if let Some(cached) = self.market_cache.get(&key, self.market_ttl).await {
            return Ok(cached);
        }
        let data = self.market.market_data(coin).await?;
        self.market_cache.insert(key, data.clone()).await;
        Ok(data)
    }

    /// Failures are logged and reported as an empty series.
    async fn candles(&self, coin: &str, interval: CandleInterval, limit: usize) -> Result<Vec<Candle>> {
        match self.market.candles(coin, interval, limit).await {
            Ok(candles) => Ok(candles),
            Err(e) => {
                warn!(coin, interval = interval.as_str(), error = %e, "Candle fetch failed");
                Ok(Vec::new())
            }
        }
    }

    async fn order_book(&self, coin: &str, depth: usize) -> Result<OrderBook> {
        self.market.order_book(coin, depth).await
    }

    async fn all_mids(&self) -> Result<HashMap<String, Decimal>> {
        self.market.all_mids().await
    }

    async fn available_coins(&self) -> Result<Vec<String>> {
        self.market.available_coins().await
    }
}
