//! Trading engine.
//!
//! Coordinates order entry and strategy execution:
//! - Validation and risk limits ahead of every order
//! - Tracking of orders placed through the engine until they leave the book
//! - Strategy lifecycle and signal evaluation on each tick
//! - Daily loss circuit breaker that pauses all strategies

mod risk;

pub use risk::{check_risk_limits, validate_order, DailyLossTracker};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{Config, TradingConfig};
use crate::error::{Error, Result};
use crate::exchange::{AccountGateway, MarketDataSource};
use crate::models::{
    CandleInterval, EntrySignal, Order, OrderRequest, OrderStatus, Portfolio, Position,
    Strategy, StrategyType, Trade,
};
use crate::persistence::Store;
use crate::strategy::{self, Signal};
use crate::utils::decimal::calculate_pnl;

/// Candles fetched per strategy evaluation.
const CANDLE_LOOKBACK: usize = 50;

/// Pause after a failed tick.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

const EVENT_CAPACITY: usize = 256;

/// Notifications published by the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    OrderPlaced { order: Order },
    OrderFilled { order: Order },
    OrderCancelled { order: Order },
    Signal {
        strategy_id: String,
        coin: String,
        signal: Signal,
    },
    StrategyPaused { strategy_id: String, reason: String },
}

/// Snapshot of engine state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub is_running: bool,
    pub active_orders: usize,
    pub active_strategies: usize,
    pub total_strategies: usize,
    pub current_daily_loss: Decimal,
    pub daily_loss_limit: Decimal,
}

struct EngineState {
    active_orders: HashMap<String, Order>,
    strategies: HashMap<String, Strategy>,
    /// Best price since entry per strategy with an open position
    best_prices: HashMap<String, Decimal>,
    daily: DailyLossTracker,
}

pub struct TradingEngine {
    account: Arc<dyn AccountGateway>,
    market: Arc<dyn MarketDataSource>,
    store: Arc<Store>,
    limits: TradingConfig,
    tick_interval: Duration,
    state: RwLock<EngineState>,
    prices: RwLock<HashMap<String, Decimal>>,
    running: AtomicBool,
    events: broadcast::Sender<EngineEvent>,
}

impl TradingEngine {
    pub fn new(
        account: Arc<dyn AccountGateway>,
        market: Arc<dyn MarketDataSource>,
        store: Arc<Store>,
        config: &Config,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            account,
            market,
            store,
            limits: config.trading.clone(),
            tick_interval: Duration::from_secs(config.polling.engine_tick_secs),
            state: RwLock::new(EngineState {
                active_orders: HashMap::new(),
                strategies: HashMap::new(),
                best_prices: HashMap::new(),
                daily: DailyLossTracker::new(config.trading.daily_loss_limit),
            }),
            prices: RwLock::new(HashMap::new()),
            running: AtomicBool::new(false),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: EngineEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    /// Load persisted strategies into the engine.
    pub async fn load_strategies(&self) -> Result<usize> {
        let strategies = self.store.get_strategies()?;
        let mut state = self.state.write().await;
        for strategy in strategies {
            state.strategies.insert(strategy.id.clone(), strategy);
        }
        info!(count = state.strategies.len(), "Strategies loaded");
        Ok(state.strategies.len())
    }

    /// Merge live mid prices (from the WebSocket feed or a poll).
    pub async fn update_prices(&self, mids: HashMap<String, Decimal>) {
        self.prices.write().await.extend(mids);
    }

    pub async fn last_price(&self, coin: &str) -> Option<Decimal> {
        self.prices.read().await.get(coin).copied()
    }

    /// Record a closed trade's PnL against today's loss budget.
    pub async fn record_realized_pnl(&self, pnl: Decimal) {
        let mut state = self.state.write().await;
        state.daily.roll(Utc::now());
        state.daily.record_pnl(pnl);
    }

    /// Validate, risk-check and submit an order; open orders are tracked until filled.
    #[instrument(skip(self, request), fields(coin = %request.coin))]
    pub async fn place_order(&self, request: OrderRequest) -> Result<Order> {
        let errors = validate_order(&request);
        if !errors.is_empty() {
            warn!(?errors, "Order validation failed");
            return Err(Error::InvalidOrder(errors));
        }

        let reference = self.last_price(&request.coin).await;
        {
            let mut state = self.state.write().await;
            state.daily.roll(Utc::now());
            check_risk_limits(&request, reference, &self.limits, &state.daily)?;
        }

        let order = self.account.place_order(&request).await?;
        self.store.save_order(&order)?;

        if order.status.is_open() {
            self.state
                .write()
                .await
                .active_orders
                .insert(order.id.clone(), order.clone());
        }

        info!(id = %order.id, oid = ?order.oid, status = order.status.as_str(), "Order placed");
        self.publish(EngineEvent::OrderPlaced { order: order.clone() });
        if order.status == OrderStatus::Filled {
            self.publish(EngineEvent::OrderFilled { order: order.clone() });
        }
        Ok(order)
    }

    /// Cancel an order the engine is tracking. `Ok(false)` when the exchange refused.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &str) -> Result<bool> {
        let order = self
            .state
            .read()
            .await
            .active_orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Order {order_id}")))?;
        let oid = order
            .oid
            .ok_or_else(|| Error::NotFound(format!("Exchange id for order {order_id}")))?;

        self.cancel_exchange_order(&order.coin, oid).await
    }

    /// Cancel by exchange order id, whether or not the engine placed it.
    ///
    /// On success a tracked order is dropped from the active set, otherwise
    /// the stored copy (if any) is marked cancelled.
    #[instrument(skip(self))]
    pub async fn cancel_exchange_order(&self, coin: &str, oid: u64) -> Result<bool> {
        if !self.account.cancel_order(coin, oid).await? {
            warn!(coin, oid, "Cancel refused by exchange");
            return Ok(false);
        }

        let tracked = {
            let mut state = self.state.write().await;
            let id = state
                .active_orders
                .iter()
                .find(|(_, o)| o.oid == Some(oid))
                .map(|(id, _)| id.clone());
            id.and_then(|id| state.active_orders.remove(&id))
        };

        match tracked {
            Some(mut order) => {
                order.cancel();
                self.store.save_order(&order)?;
                self.publish(EngineEvent::OrderCancelled { order });
            }
            None => {
                self.store.mark_order_cancelled(oid)?;
            }
        }

        info!(coin, oid, "Order cancelled");
        Ok(true)
    }

    pub async fn active_orders(&self) -> Vec<Order> {
        self.state.read().await.active_orders.values().cloned().collect()
    }

    pub async fn order_status(&self, order_id: &str) -> Option<OrderStatus> {
        self.state
            .read()
            .await
            .active_orders
            .get(order_id)
            .map(|o| o.status)
    }

    pub async fn strategies(&self) -> Vec<Strategy> {
        self.state.read().await.strategies.values().cloned().collect()
    }

    pub async fn add_strategy(&self, strategy: Strategy) -> Result<()> {
        self.store.save_strategy(&strategy)?;
        info!(id = %strategy.id, name = %strategy.name, "Strategy added");
        self.state
            .write()
            .await
            .strategies
            .insert(strategy.id.clone(), strategy);
        Ok(())
    }

    /// Stop evaluating a strategy. The stored record is kept.
    pub async fn remove_strategy(&self, strategy_id: &str) -> bool {
        let mut state = self.state.write().await;
        state.best_prices.remove(strategy_id);
        let removed = state.strategies.remove(strategy_id).is_some();
        if removed {
            info!(strategy_id, "Strategy removed");
        }
        removed
    }

    pub async fn start_strategy(&self, strategy_id: &str) -> Result<Strategy> {
        self.update_strategy(strategy_id, Strategy::start).await
    }

    pub async fn stop_strategy(&self, strategy_id: &str) -> Result<Strategy> {
        self.update_strategy(strategy_id, Strategy::stop).await
    }

    pub async fn pause_strategy(&self, strategy_id: &str) -> Result<Strategy> {
        self.update_strategy(strategy_id, Strategy::pause).await
    }

    async fn update_strategy(&self, strategy_id: &str, change: fn(&mut Strategy)) -> Result<Strategy> {
        let mut state = self.state.write().await;
        let strategy = state
            .strategies
            .get_mut(strategy_id)
            .ok_or_else(|| Error::NotFound(format!("Strategy {strategy_id}")))?;

        change(strategy);
        self.store.save_strategy(strategy)?;
        info!(strategy_id, status = strategy.status.as_str(), "Strategy updated");
        Ok(strategy.clone())
    }

    pub async fn stats(&self) -> EngineStats {
        let state = self.state.read().await;
        EngineStats {
            is_running: self.running.load(Ordering::SeqCst),
            active_orders: state.active_orders.len(),
            active_strategies: state.strategies.values().filter(|s| s.is_active()).count(),
            total_strategies: state.strategies.len(),
            current_daily_loss: state.daily.loss(),
            daily_loss_limit: state.daily.limit(),
        }
    }

    /// Run one engine cycle: reconcile orders, enforce the daily loss limit,
    /// then evaluate active strategies.
    pub async fn tick(&self) -> Result<()> {
        self.reconcile_orders().await?;
        self.check_daily_loss().await;
        self.process_strategies().await?;
        Ok(())
    }

    /// Loop `tick()` until `shutdown` is set.
    pub async fn run(self: Arc<Self>, shutdown: Arc<AtomicBool>) {
        self.running.store(true, Ordering::SeqCst);
        info!(interval = ?self.tick_interval, "Trading engine started");

        while !shutdown.load(Ordering::SeqCst) {
            let delay = match self.tick().await {
                Ok(()) => self.tick_interval,
                Err(e) => {
                    error!(error = %e, "Engine tick failed");
                    ERROR_BACKOFF
                }
            };
            tokio::time::sleep(delay).await;
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Trading engine stopped");
    }

    /// Orders that left the book while still pending are taken as filled.
    async fn reconcile_orders(&self) -> Result<()> {
        if self.state.read().await.active_orders.is_empty() {
            return Ok(());
        }

        let open: HashSet<u64> = self
            .account
            .open_orders()
            .await?
            .into_iter()
            .filter_map(|o| o.oid)
            .collect();

        let closed: Vec<Order> = {
            let mut state = self.state.write().await;
            let gone: Vec<String> = state
                .active_orders
                .iter()
                .filter(|(_, o)| o.oid.is_none_or(|oid| !open.contains(&oid)))
                .map(|(id, _)| id.clone())
                .collect();
            gone.iter()
                .filter_map(|id| state.active_orders.remove(id))
                .collect()
        };

        for mut order in closed {
            if order.status == OrderStatus::Pending {
                // Market orders carry no price of their own
                let price = match order.price {
                    Some(price) => price,
                    None => self.last_price(&order.coin).await.unwrap_or(order.average_fill_price),
                };
                order.fill(price);
            }
            if let Err(e) = self.store.save_order(&order) {
                error!(id = %order.id, error = %e, "Failed to persist reconciled order");
            }
            debug!(id = %order.id, status = order.status.as_str(), "Order left the book");
            if order.status == OrderStatus::Filled {
                self.publish(EngineEvent::OrderFilled { order });
            }
        }
        Ok(())
    }

    async fn check_daily_loss(&self) {
        let paused: Vec<Strategy> = {
            let mut state = self.state.write().await;
            state.daily.roll(Utc::now());
            if !state.daily.limit_reached() {
                return;
            }

            let mut paused = Vec::new();
            for strategy in state.strategies.values_mut().filter(|s| s.is_active()) {
                strategy.pause();
                paused.push(strategy.clone());
            }
            paused
        };

        if paused.is_empty() {
            return;
        }
        warn!(count = paused.len(), "Daily loss limit reached, pausing all strategies");
        for strategy in paused {
            if let Err(e) = self.store.save_strategy(&strategy) {
                error!(id = %strategy.id, error = %e, "Failed to persist paused strategy");
            }
            self.publish(EngineEvent::StrategyPaused {
                strategy_id: strategy.id,
                reason: "daily loss limit reached".to_string(),
            });
        }
    }

    async fn process_strategies(&self) -> Result<()> {
        let strategies: Vec<Strategy> = self
            .state
            .read()
            .await
            .strategies
            .values()
            .filter(|s| s.is_active() && has_rules(s))
            .cloned()
            .collect();
        if strategies.is_empty() {
            return Ok(());
        }

        let portfolio = self.account.portfolio().await?;
        for strategy in strategies {
            if let Err(e) = self.process_strategy(&strategy, &portfolio).await {
                warn!(strategy = %strategy.name, error = %e, "Strategy evaluation failed");
            }
        }
        Ok(())
    }

    async fn process_strategy(&self, strategy: &Strategy, portfolio: &Portfolio) -> Result<()> {
        let interval = CandleInterval::parse_or_default(&strategy.config.timeframe);
        let candles = self.market.candles(&strategy.coin, interval, CANDLE_LOOKBACK).await?;

        let live_price = match self.last_price(&strategy.coin).await {
            Some(price) => price,
            None => self.market.market_data(&strategy.coin).await?.price,
        };

        let position = portfolio.position(&strategy.coin);
        let best_price = self.track_best_price(&strategy.id, position, live_price).await;
        let Some(signal) = strategy::evaluate(strategy, &candles, live_price, position, best_price) else {
            return Ok(());
        };

        info!(
            strategy = %strategy.name,
            coin = %strategy.coin,
            action = ?signal.action,
            reason = %signal.reason,
            price = %signal.price,
            "Strategy signal"
        );
        self.publish(EngineEvent::Signal {
            strategy_id: strategy.id.clone(),
            coin: strategy.coin.clone(),
            signal: signal.clone(),
        });

        if strategy.strategy_type == StrategyType::Automated {
            self.act_on_signal(strategy, &signal, live_price, portfolio, position).await?;
        }
        Ok(())
    }

    /// Fold `live_price` into the strategy's best price; forgotten once flat.
    async fn track_best_price(
        &self,
        strategy_id: &str,
        position: Option<&Position>,
        live_price: Decimal,
    ) -> Option<Decimal> {
        let mut state = self.state.write().await;
        let Some(position) = position else {
            state.best_prices.remove(strategy_id);
            return None;
        };
        let best = strategy::best_price(position, state.best_prices.get(strategy_id).copied(), live_price);
        state.best_prices.insert(strategy_id.to_string(), best);
        Some(best)
    }

    async fn act_on_signal(
        &self,
        strategy: &Strategy,
        signal: &Signal,
        live_price: Decimal,
        portfolio: &Portfolio,
        position: Option<&Position>,
    ) -> Result<()> {
        let is_buy = signal.action.order_side().is_buy();

        if signal.action.is_entry() {
            if !strategy::confirm_entry(signal.price, live_price) {
                info!(strategy = %strategy.name, "Entry rejected: price moved too far");
                return Ok(());
            }
            let size = strategy::entry_size(&strategy.config, portfolio.account_value, live_price);
            if size.is_zero() {
                return Ok(());
            }
            self.place_order(OrderRequest::market(&strategy.coin, is_buy, size)).await?;
            return Ok(());
        }

        let Some(position) = position else {
            return Ok(());
        };
        let request = OrderRequest::market(&strategy.coin, is_buy, position.size).reduce_only();
        let order = self.place_order(request).await?;

        let pnl = calculate_pnl(position.entry_price, live_price, position.size, position.side);
        self.record_realized_pnl(pnl).await;
        self.store.record_trade(&Trade {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            coin: strategy.coin.clone(),
            side: order.side,
            size: position.size,
            price: live_price,
            fee: Decimal::ZERO,
            strategy_id: Some(strategy.id.clone()),
            timestamp: Utc::now(),
        })?;

        let mut state = self.state.write().await;
        if let Some(stored) = state.strategies.get_mut(&strategy.id) {
            stored.performance.update_trade(pnl);
            stored.updated_at = Utc::now();
            self.store.save_strategy(stored)?;
        }
        Ok(())
    }
}

/// Strategies with neither an entry signal nor exit rules have nothing to evaluate.
fn has_rules(strategy: &Strategy) -> bool {
    strategy.config.entry_signal != EntrySignal::None
        || strategy.config.take_profit_enabled
        || strategy.config.stop_loss_enabled
        || strategy.config.trailing_stop_enabled
}
