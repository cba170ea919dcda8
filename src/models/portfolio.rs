//! Portfolio, position and account DTOs.

use super::order::{new_id, OrderSide};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open perpetual position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default = "new_id")]
    pub id: String,
    pub coin: String,
    /// Absolute size; direction lives in `side`
    pub size: Decimal,
    pub entry_price: Decimal,
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub unrealized_pnl: Decimal,
    #[serde(default)]
    pub realized_pnl: Decimal,
    pub side: OrderSide,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Position {
    pub fn new(
        coin: impl Into<String>,
        side: OrderSide,
        size: Decimal,
        entry_price: Decimal,
        current_price: Decimal,
        unrealized_pnl: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            coin: coin.into(),
            size: size.abs(),
            entry_price,
            current_price,
            unrealized_pnl,
            realized_pnl: Decimal::ZERO,
            side,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn notional(&self) -> Decimal {
        self.size * self.current_price
    }
}

/// Account value plus open positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub account_value: Decimal,
    #[serde(default)]
    pub available_balance: Decimal,
    #[serde(default)]
    pub margin_used: Decimal,
    #[serde(default)]
    pub total_pnl: Decimal,
    #[serde(default)]
    pub daily_pnl: Decimal,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for Portfolio {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            account_value: Decimal::ZERO,
            available_balance: Decimal::ZERO,
            margin_used: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            daily_pnl: Decimal::ZERO,
            positions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Portfolio {
    pub fn position(&self, coin: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.coin == coin)
    }

    pub fn total_unrealized_pnl(&self) -> Decimal {
        self.positions.iter().map(|p| p.unrealized_pnl).sum()
    }
}

/// Margin summary as reported by the clearinghouse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginSummary {
    #[serde(default)]
    pub account_value: Decimal,
    #[serde(default)]
    pub total_ntl_pos: Decimal,
    #[serde(default)]
    pub total_raw_usd: Decimal,
    #[serde(default)]
    pub total_margin_used: Decimal,
}

/// Wallet-level account information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    #[serde(default)]
    pub account_value: Decimal,
    #[serde(default)]
    pub margin_summary: MarginSummary,
    #[serde(default)]
    pub cross_margin_summary: MarginSummary,
    #[serde(default)]
    pub withdrawable: Decimal,
}

impl Account {
    pub fn margin_used(&self) -> Decimal {
        self.margin_summary.total_margin_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_size_is_absolute() {
        let pos = Position::new("BTC", OrderSide::Sell, dec!(-0.5), dec!(45000), dec!(44000), dec!(500));
        assert_eq!(pos.size, dec!(0.5));
        assert_eq!(pos.notional(), dec!(22000));
    }

    #[test]
    fn test_portfolio_lookup_and_pnl() {
        let mut portfolio = Portfolio::default();
        portfolio.positions.push(Position::new(
            "BTC",
            OrderSide::Buy,
            dec!(0.5),
            dec!(45000),
            dec!(46500),
            dec!(750),
        ));
        portfolio.positions.push(Position::new(
            "ETH",
            OrderSide::Buy,
            dec!(2),
            dec!(3200),
            dec!(3150),
            dec!(-100),
        ));

        assert!(portfolio.position("ETH").is_some());
        assert!(portfolio.position("SOL").is_none());
        assert_eq!(portfolio.total_unrealized_pnl(), dec!(650));
    }
}
