//! Strategy definitions and performance bookkeeping.

use super::order::new_id;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyStatus {
    #[default]
    Active,
    Paused,
    Stopped,
    Backtesting,
}

impl StrategyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyStatus::Active => "active",
            StrategyStatus::Paused => "paused",
            StrategyStatus::Stopped => "stopped",
            StrategyStatus::Backtesting => "backtesting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    #[default]
    Manual,
    /// Signals are turned into orders by the engine
    Automated,
    /// Signals are only published
    SignalFollowing,
}

/// Which signal generator drives entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySignal {
    #[default]
    None,
    /// Live mid vs last candle close
    Momentum {
        #[serde(default = "default_momentum_threshold")]
        threshold: Decimal,
    },
    /// Fast/slow simple moving average cross
    MaCross {
        #[serde(default = "default_fast_period")]
        fast_period: usize,
        #[serde(default = "default_slow_period")]
        slow_period: usize,
    },
}

fn default_momentum_threshold() -> Decimal {
    dec!(0.01)
}

fn default_fast_period() -> usize {
    10
}

fn default_slow_period() -> usize {
    20
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeType {
    #[default]
    Fixed,
    /// Percentage of account value
    Percentage,
    /// Sized from the stop loss distance and `max_risk_per_trade`
    RiskBased,
}

/// Strategy parameters. Percentages are whole numbers (5.0 = 5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub entry_signal: EntrySignal,
    pub entry_size_type: SizeType,
    pub entry_size_value: Decimal,
    /// Candle interval the signals read
    pub timeframe: String,

    pub take_profit_enabled: bool,
    pub take_profit_percent: Decimal,
    pub stop_loss_enabled: bool,
    pub stop_loss_percent: Decimal,
    pub trailing_stop_enabled: bool,
    /// Giveback from the best price since entry
    pub trailing_stop_percent: Decimal,

    pub max_position_size: Decimal,
    pub max_risk_per_trade: Decimal,

    // Shown on the dashboard only. The engine enforces the account-wide
    // daily loss limit from `TradingConfig` instead.
    pub max_drawdown: Decimal,
    pub daily_loss_limit: Decimal,
    /// Minutes
    pub max_trade_duration: Option<u32>,
    pub leverage: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            entry_signal: EntrySignal::None,
            entry_size_type: SizeType::Fixed,
            entry_size_value: dec!(0.1),
            timeframe: "1m".to_string(),
            take_profit_enabled: false,
            take_profit_percent: dec!(5.0),
            stop_loss_enabled: false,
            stop_loss_percent: dec!(2.0),
            trailing_stop_enabled: false,
            trailing_stop_percent: dec!(1.0),
            max_position_size: dec!(1.0),
            max_risk_per_trade: dec!(2.0),
            max_drawdown: dec!(10.0),
            daily_loss_limit: dec!(5.0),
            max_trade_duration: None,
            leverage: dec!(1.0),
        }
    }
}

/// Running performance statistics for a strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyPerformance {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub total_pnl: Decimal,
    pub max_drawdown: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
    #[serde(skip)]
    peak_pnl: Decimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl StrategyPerformance {
    /// Win rate in percent.
    pub fn win_rate(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.winning_trades) / Decimal::from(self.total_trades) * dec!(100)
    }

    /// Loss rate in percent.
    pub fn loss_rate(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.losing_trades) / Decimal::from(self.total_trades) * dec!(100)
    }

    pub fn avg_trade_pnl(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        self.total_pnl / Decimal::from(self.total_trades)
    }

    /// Gross wins over gross losses; zero when there are no losses.
    pub fn profit_factor(&self) -> Decimal {
        let gross_loss = (self.avg_loss * Decimal::from(self.losing_trades)).abs();
        if gross_loss.is_zero() {
            return Decimal::ZERO;
        }
        self.avg_win * Decimal::from(self.winning_trades) / gross_loss
    }

    /// Fold a closed trade's PnL into the statistics. Zero PnL counts as a loss.
    pub fn update_trade(&mut self, pnl: Decimal) {
        let now = Utc::now();
        self.start_date.get_or_insert(now);
        self.end_date = Some(now);

        self.total_trades += 1;
        self.total_pnl += pnl;

        if pnl > Decimal::ZERO {
            self.winning_trades += 1;
            self.avg_win = (self.avg_win * Decimal::from(self.winning_trades - 1) + pnl)
                / Decimal::from(self.winning_trades);
            self.largest_win = self.largest_win.max(pnl);
            self.consecutive_wins += 1;
            self.consecutive_losses = 0;
        } else {
            self.losing_trades += 1;
            self.avg_loss = (self.avg_loss * Decimal::from(self.losing_trades - 1) + pnl)
                / Decimal::from(self.losing_trades);
            self.largest_loss = self.largest_loss.min(pnl);
            self.consecutive_losses += 1;
            self.consecutive_wins = 0;
        }

        self.peak_pnl = self.peak_pnl.max(self.total_pnl);
        self.max_drawdown = self.max_drawdown.max(self.peak_pnl - self.total_pnl);
    }
}

/// A user-defined trading strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub coin: String,
    #[serde(default)]
    pub strategy_type: StrategyType,
    #[serde(default)]
    pub status: StrategyStatus,
    #[serde(default)]
    pub config: StrategyConfig,
    #[serde(default)]
    pub performance: StrategyPerformance,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, coin: impl Into<String>, config: StrategyConfig) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            coin: coin.into(),
            strategy_type: StrategyType::Manual,
            status: StrategyStatus::Active,
            config,
            performance: StrategyPerformance::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_type(mut self, strategy_type: StrategyType) -> Self {
        self.strategy_type = strategy_type;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == StrategyStatus::Active
    }

    pub fn start(&mut self) {
        self.set_status(StrategyStatus::Active);
    }

    pub fn pause(&mut self) {
        self.set_status(StrategyStatus::Paused);
    }

    pub fn stop(&mut self) {
        self.set_status(StrategyStatus::Stopped);
    }

    fn set_status(&mut self, status: StrategyStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
