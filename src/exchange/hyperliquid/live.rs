//! Live account view: clearinghouse reads plus a signing order gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::client::HyperliquidClient;
use super::types::{ClearinghouseState, HistoricalOrder, OpenOrder, WireMarginSummary};
use crate::error::Result;
use crate::exchange::traits::{AccountGateway, OrderGateway};
use crate::models::{
    Account, MarginSummary, Order, OrderRequest, OrderSide, OrderStatus, OrderType, Portfolio,
    Position, TimeInForce,
};
use crate::utils::decimal::safe_div;

/// Account gateway for one configured wallet.
pub struct LiveAccount {
    info: HyperliquidClient,
    orders: Arc<dyn OrderGateway>,
    wallet_address: String,
}

impl LiveAccount {
    pub fn new(info: HyperliquidClient, orders: Arc<dyn OrderGateway>, wallet_address: impl Into<String>) -> Self {
        Self {
            info,
            orders,
            wallet_address: wallet_address.into(),
        }
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }
}

#[async_trait]
impl AccountGateway for LiveAccount {
    #[instrument(skip(self), name = "live_portfolio")]
    async fn portfolio(&self) -> Result<Portfolio> {
        let state = self.info.clearinghouse_state(&self.wallet_address).await?;
        let portfolio = portfolio_from_state(state);
        debug!(
            positions = portfolio.positions.len(),
            account_value = %portfolio.account_value,
            "Loaded live portfolio"
        );
        Ok(portfolio)
    }

    #[instrument(skip(self), name = "live_account")]
    async fn account(&self) -> Result<Account> {
        let state = self.info.clearinghouse_state(&self.wallet_address).await?;
        Ok(account_from_state(&self.wallet_address, state))
    }

    async fn open_orders(&self) -> Result<Vec<Order>> {
        let orders = self.info.open_orders(&self.wallet_address).await?;
        Ok(orders.into_iter().map(order_from_open).collect())
    }

    async fn order_history(&self, limit: usize) -> Result<Vec<Order>> {
        let mut history = self.info.historical_orders(&self.wallet_address).await?;
        history.sort_by(|a, b| b.status_timestamp.cmp(&a.status_timestamp));
        history.truncate(limit);
        Ok(history.into_iter().map(order_from_historical).collect())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<Order> {
        self.orders.place_order(request).await
    }

    async fn cancel_order(&self, coin: &str, oid: u64) -> Result<bool> {
        self.orders.cancel_order(coin, oid).await
    }
}

fn margin_summary(wire: &WireMarginSummary) -> MarginSummary {
    MarginSummary {
        account_value: wire.account_value,
        total_ntl_pos: wire.total_ntl_pos,
        total_raw_usd: wire.total_raw_usd,
        total_margin_used: wire.total_margin_used,
    }
}

/// Positions with zero size are skipped; current price is position value over size.
pub(crate) fn portfolio_from_state(state: ClearinghouseState) -> Portfolio {
    let positions: Vec<Position> = state
        .asset_positions
        .into_iter()
        .map(|p| p.position)
        .filter(|p| !p.szi.is_zero())
        .map(|p| {
            let size = p.szi.abs();
            let side = if p.szi > Decimal::ZERO {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            };
            Position::new(
                p.coin,
                side,
                size,
                p.entry_px.unwrap_or_default(),
                safe_div(p.position_value, size),
                p.unrealized_pnl,
            )
        })
        .collect();

    let total_pnl: Decimal = positions.iter().map(|p| p.unrealized_pnl).sum();

    Portfolio {
        account_value: state.margin_summary.account_value,
        available_balance: state.withdrawable.unwrap_or_default(),
        margin_used: state.margin_summary.total_margin_used,
        total_pnl,
        positions,
        ..Portfolio::default()
    }
}

pub(crate) fn account_from_state(address: &str, state: ClearinghouseState) -> Account {
    Account {
        address: address.to_string(),
        account_value: state.margin_summary.account_value,
        margin_summary: margin_summary(&state.margin_summary),
        cross_margin_summary: margin_summary(&state.cross_margin_summary),
        withdrawable: state.withdrawable.unwrap_or_default(),
    }
}

fn timestamp(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

/// Resting orders are always reported as pending limit orders.
fn order_from_open(o: OpenOrder) -> Order {
    let size = o.orig_sz.unwrap_or(o.sz);
    let created_at = timestamp(o.timestamp);
    Order {
        id: Uuid::new_v4().to_string(),
        oid: Some(o.oid),
        coin: o.coin,
        side: OrderSide::from_exchange_code(&o.side),
        size,
        price: Some(o.limit_px),
        order_type: OrderType::Limit,
        status: OrderStatus::Pending,
        filled_size: size - o.sz,
        remaining_size: o.sz,
        average_fill_price: Decimal::ZERO,
        time_in_force: TimeInForce::Gtc,
        reduce_only: false,
        created_at,
        updated_at: created_at,
    }
}

fn order_from_historical(h: HistoricalOrder) -> Order {
    let detail = h.order;
    let size = detail.orig_sz.unwrap_or(detail.sz);
    let order_type = match detail.order_type.as_deref() {
        Some(t) if t.contains("Market") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let time_in_force = match detail.tif.as_deref() {
        Some("Ioc") => TimeInForce::Ioc,
        Some("Alo") => TimeInForce::Alo,
        _ => TimeInForce::Gtc,
    };

    Order {
        id: Uuid::new_v4().to_string(),
        oid: Some(detail.oid),
        coin: detail.coin,
        side: OrderSide::from_exchange_code(&detail.side),
        size,
        price: Some(detail.limit_px),
        order_type,
        status: OrderStatus::from_exchange(&h.status),
        filled_size: size - detail.sz,
        remaining_size: detail.sz,
        average_fill_price: Decimal::ZERO,
        time_in_force,
        reduce_only: detail.reduce_only,
        created_at: timestamp(detail.timestamp),
        updated_at: timestamp(h.status_timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::hyperliquid::types::{AssetPosition, HistoricalOrderDetail, WirePosition};
    use rust_decimal_macros::dec;

    fn wire_position(coin: &str, szi: Decimal, value: Decimal, upnl: Decimal) -> AssetPosition {
        AssetPosition {
            kind: "oneWay".into(),
            position: WirePosition {
                coin: coin.into(),
                szi,
                entry_px: Some(dec!(100)),
                position_value: value,
                unrealized_pnl: upnl,
                liquidation_px: None,
                margin_used: None,
            },
        }
    }

    fn state(positions: Vec<AssetPosition>) -> ClearinghouseState {
        let summary = WireMarginSummary {
            account_value: dec!(10000),
            total_ntl_pos: dec!(5000),
            total_raw_usd: dec!(5000),
            total_margin_used: dec!(1000),
        };
        ClearinghouseState {
            margin_summary: summary.clone(),
            cross_margin_summary: summary,
            withdrawable: Some(dec!(9000)),
            asset_positions: positions,
            time: 0,
        }
    }

    #[test]
    fn test_portfolio_mapping() {
        let portfolio = portfolio_from_state(state(vec![
            wire_position("BTC", dec!(-0.5), dec!(23000), dec!(-50)),
            wire_position("ETH", dec!(0), dec!(0), dec!(0)),
            wire_position("SOL", dec!(10), dec!(1050), dec!(50)),
        ]));

        assert_eq!(portfolio.positions.len(), 2);
        let btc = portfolio.position("BTC").unwrap();
        assert_eq!(btc.side, OrderSide::Sell);
        assert_eq!(btc.size, dec!(0.5));
        assert_eq!(btc.current_price, dec!(46000));
        assert_eq!(portfolio.total_pnl, dec!(0));
        assert_eq!(portfolio.available_balance, dec!(9000));
        assert_eq!(portfolio.margin_used, dec!(1000));
    }

    #[test]
    fn test_account_mapping() {
        let account = account_from_state("0xabc", state(vec![]));
        assert_eq!(account.address, "0xabc");
        assert_eq!(account.margin_used(), dec!(1000));
        assert_eq!(account.withdrawable, dec!(9000));
    }

    #[test]
    fn test_historical_order_mapping() {
        let order = order_from_historical(HistoricalOrder {
            order: HistoricalOrderDetail {
                coin: "ETH".into(),
                side: "A".into(),
                limit_px: dec!(3200),
                sz: dec!(0),
                orig_sz: Some(dec!(1.5)),
                oid: 12,
                timestamp: 1_700_000_000_000,
                order_type: Some("Market".into()),
                tif: Some("Ioc".into()),
                reduce_only: true,
            },
            status: "filled".into(),
            status_timestamp: 1_700_000_001_000,
        });

        assert_eq!(order.side, OrderSide::Sell);
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_size, dec!(1.5));
        assert_eq!(order.time_in_force, TimeInForce::Ioc);
    }
}
