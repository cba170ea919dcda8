//! Order, order request and trade DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn from_is_buy(is_buy: bool) -> Self {
        if is_buy {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }

    /// Map the exchange's one-letter side code ("B" bid, "A" ask).
    pub fn from_exchange_code(code: &str) -> Self {
        if code == "B" {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Filled,
    PartiallyFilled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Filled => "filled",
            OrderStatus::PartiallyFilled => "partially_filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "filled" => Some(OrderStatus::Filled),
            "partially_filled" => Some(OrderStatus::PartiallyFilled),
            "cancelled" => Some(OrderStatus::Cancelled),
            "rejected" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }

    /// Map a status string from the exchange's historical orders feed.
    pub fn from_exchange(s: &str) -> Self {
        match s {
            "open" | "triggered" => OrderStatus::Pending,
            "filled" => OrderStatus::Filled,
            "rejected" => OrderStatus::Rejected,
            // canceled, marginCanceled, reduceOnlyCanceled, selfTradeCanceled, ...
            _ => OrderStatus::Cancelled,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }
}

/// Time in force for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    #[default]
    Gtc, // Good Till Cancel
    Ioc, // Immediate or Cancel
    Alo, // Add Liquidity Only (post only)
    Fok, // Fill or Kill, not offered by the exchange
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "Gtc",
            TimeInForce::Ioc => "Ioc",
            TimeInForce::Alo => "Alo",
            TimeInForce::Fok => "Fok",
        }
    }
}

/// Incoming order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub coin: String,
    pub is_buy: bool,
    /// Size
    pub sz: Decimal,
    /// Price for limit orders
    #[serde(default)]
    pub limit_px: Option<Decimal>,
    pub order_type: OrderType,
    #[serde(default)]
    pub time_in_force: TimeInForce,
    #[serde(default)]
    pub reduce_only: bool,
}

impl OrderRequest {
    pub fn market(coin: impl Into<String>, is_buy: bool, sz: Decimal) -> Self {
        Self {
            coin: coin.into(),
            is_buy,
            sz,
            limit_px: None,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Ioc,
            reduce_only: false,
        }
    }

    pub fn limit(coin: impl Into<String>, is_buy: bool, sz: Decimal, limit_px: Decimal) -> Self {
        Self {
            coin: coin.into(),
            is_buy,
            sz,
            limit_px: Some(limit_px),
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Gtc,
            reduce_only: false,
        }
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    pub fn side(&self) -> OrderSide {
        OrderSide::from_is_buy(self.is_buy)
    }
}

/// Order as tracked by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default = "new_id")]
    pub id: String,
    /// Hyperliquid order ID
    #[serde(default)]
    pub oid: Option<u64>,
    pub coin: String,
    pub side: OrderSide,
    pub size: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(default)]
    pub filled_size: Decimal,
    #[serde(default)]
    pub remaining_size: Decimal,
    #[serde(default)]
    pub average_fill_price: Decimal,
    #[serde(default)]
    pub time_in_force: TimeInForce,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A freshly submitted order with nothing filled yet.
    pub fn pending(request: &OrderRequest, oid: Option<u64>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            oid,
            coin: request.coin.clone(),
            side: request.side(),
            size: request.sz,
            price: request.limit_px,
            order_type: request.order_type,
            status: OrderStatus::Pending,
            filled_size: Decimal::ZERO,
            remaining_size: request.sz,
            average_fill_price: Decimal::ZERO,
            time_in_force: request.time_in_force,
            reduce_only: request.reduce_only,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a complete fill at `avg_price`.
    pub fn fill(&mut self, avg_price: Decimal) {
        self.filled_size = self.size;
        self.remaining_size = Decimal::ZERO;
        self.average_fill_price = avg_price;
        self.status = OrderStatus::Filled;
        self.updated_at = Utc::now();
    }

    /// Record a partial fill; the order stays open.
    pub fn partial_fill(&mut self, filled: Decimal, avg_price: Decimal) {
        self.filled_size = filled.min(self.size);
        self.remaining_size = self.size - self.filled_size;
        self.average_fill_price = avg_price;
        self.status = if self.remaining_size.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    /// Notional value at the order's limit price, if it has one.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.map(|p| p * self.size)
    }
}

/// An executed fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(default = "new_id")]
    pub id: String,
    pub order_id: String,
    pub coin: String,
    pub side: OrderSide,
    pub size: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default)]
    pub strategy_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_deserializes_with_defaults() {
        let json = r#"{"coin":"btc","is_buy":true,"sz":0.5,"limit_px":45000,"order_type":"limit"}"#;
        let req: OrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.order_type, OrderType::Limit);
        assert_eq!(req.time_in_force, TimeInForce::Gtc);
        assert!(!req.reduce_only);
        assert_eq!(req.limit_px, Some(dec!(45000)));
        assert_eq!(req.side(), OrderSide::Buy);
    }

    #[test]
    fn test_pending_order_tracks_remaining_size() {
        let req = OrderRequest::limit("ETH", false, dec!(2), dec!(3200));
        let mut order = Order::pending(&req, Some(42));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.remaining_size, dec!(2));
        assert_eq!(order.notional(), Some(dec!(6400)));

        order.partial_fill(dec!(0.5), dec!(3199));
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_size, dec!(1.5));

        order.fill(dec!(3199.5));
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.remaining_size, Decimal::ZERO);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PartiallyFilled).unwrap(),
            r#""partially_filled""#
        );
        assert_eq!(OrderStatus::parse("cancelled"), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::from_exchange("open"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_exchange("marginCanceled"), OrderStatus::Cancelled);
        assert_eq!(OrderSide::from_exchange_code("A"), OrderSide::Sell);
    }
}
