//! SQLite persistence for dashboard state.
//!
//! Keeps local history that survives restarts:
//! - Orders placed through the API or engine
//! - Executed trades
//! - Strategy definitions and performance
//! - Periodic account snapshots
//! - User settings (credentials and preferences)
//!
//! Decimals are stored as TEXT and timestamps as RFC 3339 (UTC, millisecond
//! precision) so that string comparison orders them chronologically.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{Order, OrderStatus, Portfolio, Strategy, Trade, UserSettings};

/// One row of `account_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub timestamp: DateTime<Utc>,
    pub address: String,
    pub account_value: Decimal,
    pub available_balance: Decimal,
    pub margin_used: Decimal,
    pub total_pnl: Decimal,
    pub position_count: usize,
}

/// SQLite-backed store.
pub struct Store {
    conn: Mutex<Connection>,
}

const STATS_TABLES: [&str; 4] = ["account_history", "orders", "strategies", "trades"];

impl Store {
    /// Open (or create) the database and initialize the schema.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        info!("Store initialized at {:?}", db_path.as_ref());
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves SQLite itself consistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init_schema(&self) -> Result<()> {
        self.conn().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                oid INTEGER,
                coin TEXT NOT NULL,
                side TEXT NOT NULL,
                size TEXT NOT NULL,
                price TEXT,
                order_type TEXT NOT NULL,
                status TEXT NOT NULL,
                filled_size TEXT NOT NULL,
                remaining_size TEXT NOT NULL,
                average_fill_price TEXT NOT NULL,
                time_in_force TEXT NOT NULL,
                reduce_only INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
            CREATE INDEX IF NOT EXISTS idx_orders_oid ON orders(oid);

            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                order_id TEXT NOT NULL,
                coin TEXT NOT NULL,
                side TEXT NOT NULL,
                size TEXT NOT NULL,
                price TEXT NOT NULL,
                fee TEXT NOT NULL,
                strategy_id TEXT,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_timestamp ON trades(timestamp);

            CREATE TABLE IF NOT EXISTS strategies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                coin TEXT NOT NULL,
                strategy_type TEXT NOT NULL,
                status TEXT NOT NULL,
                config_json TEXT NOT NULL,
                performance_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS account_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                address TEXT NOT NULL,
                account_value TEXT NOT NULL,
                available_balance TEXT NOT NULL,
                margin_used TEXT NOT NULL,
                total_pnl TEXT NOT NULL,
                position_count INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_history_timestamp ON account_history(timestamp);

            CREATE TABLE IF NOT EXISTS user_settings (
                id TEXT PRIMARY KEY,
                data_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Insert or replace an order by id.
    pub fn save_order(&self, order: &Order) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT INTO orders (id, oid, coin, side, size, price, order_type, status, filled_size,
                                remaining_size, average_fill_price, time_in_force, reduce_only,
                                created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                oid = ?2,
                status = ?8,
                filled_size = ?9,
                remaining_size = ?10,
                average_fill_price = ?11,
                updated_at = ?15
            "#,
            params![
                order.id,
                order.oid.map(|oid| oid as i64),
                order.coin,
                enum_text(&order.side)?,
                order.size.to_string(),
                order.price.map(|p| p.to_string()),
                enum_text(&order.order_type)?,
                order.status.as_str(),
                order.filled_size.to_string(),
                order.remaining_size.to_string(),
                order.average_fill_price.to_string(),
                order.time_in_force.as_str(),
                order.reduce_only,
                timestamp_text(order.created_at),
                timestamp_text(order.updated_at),
            ],
        )?;

        debug!(id = %order.id, status = order.status.as_str(), "Order saved");
        Ok(())
    }

    /// Newest orders first, optionally filtered by status.
    pub fn get_orders(&self, status: Option<OrderStatus>, limit: usize) -> Result<Vec<Order>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, oid, coin, side, size, price, order_type, status, filled_size,
                   remaining_size, average_fill_price, time_in_force, reduce_only,
                   created_at, updated_at
            FROM orders
            WHERE ?1 IS NULL OR status = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )?;

        let orders = stmt
            .query_map(params![status.map(|s| s.as_str()), limit as i64], order_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orders)
    }

    /// Mark every stored order with this exchange id as cancelled.
    pub fn mark_order_cancelled(&self, oid: u64) -> Result<bool> {
        let updated = self.conn().execute(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE oid = ?3",
            params![
                OrderStatus::Cancelled.as_str(),
                timestamp_text(Utc::now()),
                oid as i64
            ],
        )?;
        Ok(updated > 0)
    }

    pub fn record_trade(&self, trade: &Trade) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT OR REPLACE INTO trades (id, order_id, coin, side, size, price, fee, strategy_id, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                trade.id,
                trade.order_id,
                trade.coin,
                enum_text(&trade.side)?,
                trade.size.to_string(),
                trade.price.to_string(),
                trade.fee.to_string(),
                trade.strategy_id,
                timestamp_text(trade.timestamp),
            ],
        )?;
        Ok(())
    }

    /// Newest trades first.
    pub fn get_trades(&self, limit: usize) -> Result<Vec<Trade>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_id, coin, side, size, price, fee, strategy_id, timestamp
            FROM trades
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )?;

        let trades = stmt
            .query_map([limit as i64], |row| {
                Ok(Trade {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    coin: row.get(2)?,
                    side: enum_col(row, 3)?,
                    size: decimal_col(row, 4)?,
                    price: decimal_col(row, 5)?,
                    fee: decimal_col(row, 6)?,
                    strategy_id: row.get(7)?,
                    timestamp: timestamp_col(row, 8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(trades)
    }

    /// Insert or replace a strategy by id.
    pub fn save_strategy(&self, strategy: &Strategy) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT INTO strategies (id, name, description, coin, strategy_type, status,
                                    config_json, performance_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                name = ?2,
                description = ?3,
                coin = ?4,
                strategy_type = ?5,
                status = ?6,
                config_json = ?7,
                performance_json = ?8,
                updated_at = ?10
            "#,
            params![
                strategy.id,
                strategy.name,
                strategy.description,
                strategy.coin,
                enum_text(&strategy.strategy_type)?,
                strategy.status.as_str(),
                serde_json::to_string(&strategy.config)?,
                serde_json::to_string(&strategy.performance)?,
                timestamp_text(strategy.created_at),
                timestamp_text(strategy.updated_at),
            ],
        )?;

        debug!(id = %strategy.id, name = %strategy.name, "Strategy saved");
        Ok(())
    }

    /// All strategies, oldest first.
    pub fn get_strategies(&self) -> Result<Vec<Strategy>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{STRATEGY_SELECT} ORDER BY created_at ASC"))?;
        let strategies = stmt
            .query_map([], strategy_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(strategies)
    }

    pub fn get_strategy(&self, id: &str) -> Result<Option<Strategy>> {
        let strategy = self
            .conn()
            .query_row(&format!("{STRATEGY_SELECT} WHERE id = ?1"), [id], strategy_from_row)
            .optional()?;
        Ok(strategy)
    }

    /// `false` when no strategy had this id.
    pub fn delete_strategy(&self, id: &str) -> Result<bool> {
        let deleted = self.conn().execute("DELETE FROM strategies WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    pub fn save_account_snapshot(&self, address: &str, portfolio: &Portfolio) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT INTO account_history (timestamp, address, account_value, available_balance,
                                         margin_used, total_pnl, position_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                timestamp_text(Utc::now()),
                address,
                portfolio.account_value.to_string(),
                portfolio.available_balance.to_string(),
                portfolio.margin_used.to_string(),
                portfolio.total_pnl.to_string(),
                portfolio.positions.len() as i64,
            ],
        )?;

        debug!(account_value = %portfolio.account_value, "Account snapshot saved");
        Ok(())
    }

    /// Snapshots from the last `days` days, newest first.
    pub fn get_account_history(&self, days: u32) -> Result<Vec<AccountSnapshot>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT timestamp, address, account_value, available_balance, margin_used,
                   total_pnl, position_count
            FROM account_history
            WHERE timestamp > ?1
            ORDER BY timestamp DESC
            "#,
        )?;

        let snapshots = stmt
            .query_map([cutoff(days)], |row| {
                Ok(AccountSnapshot {
                    timestamp: timestamp_col(row, 0)?,
                    address: row.get(1)?,
                    account_value: decimal_col(row, 2)?,
                    available_balance: decimal_col(row, 3)?,
                    margin_used: decimal_col(row, 4)?,
                    total_pnl: decimal_col(row, 5)?,
                    position_count: row.get::<_, i64>(6)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(snapshots)
    }

    /// Stored settings; the first read creates and saves the defaults.
    pub fn load_settings(&self) -> Result<UserSettings> {
        let stored: Option<String> = self
            .conn()
            .query_row(
                "SELECT data_json FROM user_settings ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => {
                let settings = UserSettings::default();
                self.save_settings(&settings)?;
                info!("Created default user settings");
                Ok(settings)
            }
        }
    }

    pub fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT INTO user_settings (id, data_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET data_json = ?2, updated_at = ?3
            "#,
            params![
                settings.id,
                serde_json::to_string(settings)?,
                timestamp_text(settings.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Drop account snapshots and finished orders older than `days`. Returns rows removed.
    pub fn cleanup_old_data(&self, days: u32) -> Result<usize> {
        let cutoff = cutoff(days);
        let conn = self.conn();

        let snapshots = conn.execute("DELETE FROM account_history WHERE timestamp < ?1", [&cutoff])?;
        let orders = conn.execute(
            "DELETE FROM orders WHERE status IN ('filled', 'cancelled') AND created_at < ?1",
            [&cutoff],
        )?;

        info!(days, snapshots, orders, "Cleaned old data");
        Ok(snapshots + orders)
    }

    /// Row count per table.
    pub fn database_stats(&self) -> Result<BTreeMap<String, i64>> {
        let conn = self.conn();
        let mut stats = BTreeMap::new();
        for table in STATS_TABLES {
            let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            stats.insert(table.to_string(), count);
        }
        Ok(stats)
    }
}

const STRATEGY_SELECT: &str = r#"
    SELECT id, name, description, coin, strategy_type, status, config_json, performance_json,
           created_at, updated_at
    FROM strategies
"#;

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        oid: row.get::<_, Option<i64>>(1)?.map(|oid| oid as u64),
        coin: row.get(2)?,
        side: enum_col(row, 3)?,
        size: decimal_col(row, 4)?,
        price: row
            .get::<_, Option<String>>(5)?
            .map(|p| Decimal::from_str(&p).unwrap_or_default()),
        order_type: enum_col(row, 6)?,
        status: OrderStatus::parse(&row.get::<_, String>(7)?).unwrap_or(OrderStatus::Pending),
        filled_size: decimal_col(row, 8)?,
        remaining_size: decimal_col(row, 9)?,
        average_fill_price: decimal_col(row, 10)?,
        time_in_force: enum_col(row, 11)?,
        reduce_only: row.get(12)?,
        created_at: timestamp_col(row, 13)?,
        updated_at: timestamp_col(row, 14)?,
    })
}

fn strategy_from_row(row: &Row<'_>) -> rusqlite::Result<Strategy> {
    Ok(Strategy {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        coin: row.get(3)?,
        strategy_type: enum_col(row, 4)?,
        status: enum_col(row, 5)?,
        config: json_col(row, 6)?,
        performance: json_col(row, 7)?,
        created_at: timestamp_col(row, 8)?,
        updated_at: timestamp_col(row, 9)?,
    })
}

fn timestamp_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `days` before now; windows reaching past the representable range start at the earliest timestamp.
fn cutoff(days: u32) -> String {
    let start = Utc::now()
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    timestamp_text(start)
}

/// Serde name of a unit enum variant, e.g. `OrderSide::Buy` -> "buy".
fn enum_text<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn enum_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_value(serde_json::Value::String(text)).map_err(|e| conversion_error(idx, e))
}

fn json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(idx, e))
}

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    Ok(Decimal::from_str(&row.get::<_, String>(idx)?).unwrap_or_default())
}

fn timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(&row.get::<_, String>(idx)?)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MockExchange;
    use crate::models::{ApiCredentials, Environment, OrderRequest, OrderSide, StrategyConfig, TimeInForce};
    use rust_decimal_macros::dec;

    fn store() -> Store {
        Store::in_memory().unwrap()
    }

    #[test]
    fn test_save_and_update_order() {
        let store = store();
        let mut request = OrderRequest::limit("BTC", true, dec!(0.25), dec!(45000.5));
        request.time_in_force = TimeInForce::Alo;
        let mut order = Order::pending(&request, Some(4242));
        store.save_order(&order).unwrap();

        order.partial_fill(dec!(0.1), dec!(45000));
        store.save_order(&order).unwrap();

        let orders = store.get_orders(None, 10).unwrap();
        assert_eq!(orders.len(), 1);
        let loaded = &orders[0];
        assert_eq!(loaded.id, order.id);
        assert_eq!(loaded.oid, Some(4242));
        assert_eq!(loaded.side, OrderSide::Buy);
        assert_eq!(loaded.price, Some(dec!(45000.5)));
        assert_eq!(loaded.status, OrderStatus::PartiallyFilled);
        assert_eq!(loaded.remaining_size, dec!(0.15));
        assert_eq!(loaded.time_in_force, TimeInForce::Alo);
    }

    #[test]
    fn test_orders_filter_and_cancel() {
        let store = store();
        let open = Order::pending(&OrderRequest::limit("ETH", false, dec!(1), dec!(3200)), Some(7));
        let mut filled = Order::pending(&OrderRequest::market("SOL", true, dec!(3)), Some(8));
        filled.fill(dec!(101));
        store.save_order(&open).unwrap();
        store.save_order(&filled).unwrap();

        assert_eq!(store.get_orders(Some(OrderStatus::Filled), 10).unwrap().len(), 1);
        assert!(store.mark_order_cancelled(7).unwrap());
        assert!(!store.mark_order_cancelled(99).unwrap());

        let cancelled = store.get_orders(Some(OrderStatus::Cancelled), 10).unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].coin, "ETH");
        assert_eq!(store.get_orders(None, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_trades_newest_first() {
        let store = store();
        let older = Trade {
            id: "t1".into(),
            order_id: "o1".into(),
            coin: "BTC".into(),
            side: OrderSide::Sell,
            size: dec!(0.1),
            price: dec!(45000),
            fee: dec!(0.45),
            strategy_id: Some("s1".into()),
            timestamp: Utc::now() - Duration::minutes(5),
        };
        let newer = Trade {
            id: "t2".into(),
            timestamp: Utc::now(),
            strategy_id: None,
            ..older.clone()
        };
        store.record_trade(&older).unwrap();
        store.record_trade(&newer).unwrap();

        let trades = store.get_trades(10).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].id, "t2");
        assert_eq!(trades[1].fee, dec!(0.45));
        assert_eq!(trades[1].strategy_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_strategy_crud() {
        let store = store();
        let mut strategy = Strategy::new("Momentum BTC", "BTC", StrategyConfig::default());
        store.save_strategy(&strategy).unwrap();

        strategy.pause();
        strategy.performance.update_trade(dec!(25));
        store.save_strategy(&strategy).unwrap();

        let loaded = store.get_strategy(&strategy.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Momentum BTC");
        assert_eq!(loaded.status, strategy.status);
        assert_eq!(loaded.config, strategy.config);
        assert_eq!(loaded.performance.total_pnl, dec!(25));
        assert_eq!(store.get_strategies().unwrap().len(), 1);

        assert!(store.delete_strategy(&strategy.id).unwrap());
        assert!(!store.delete_strategy(&strategy.id).unwrap());
        assert!(store.get_strategy(&strategy.id).unwrap().is_none());
    }

    #[test]
    fn test_account_history_and_stats() {
        let store = store();
        let portfolio = MockExchange::mock_portfolio();
        store.save_account_snapshot("0xabc", &portfolio).unwrap();
        store.save_account_snapshot("0xabc", &portfolio).unwrap();

        let history = store.get_account_history(30).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].account_value, dec!(50000));
        assert_eq!(history[0].position_count, 2);

        let stats = store.database_stats().unwrap();
        assert_eq!(stats["account_history"], 2);
        assert_eq!(stats["orders"], 0);
    }

    #[test]
    fn test_cleanup_keeps_recent_and_open() {
        let store = store();
        let mut old = Order::pending(&OrderRequest::market("BTC", true, dec!(1)), Some(1));
        old.fill(dec!(45000));
        old.created_at = Utc::now() - Duration::days(40);
        let mut old_open = Order::pending(&OrderRequest::limit("BTC", true, dec!(1), dec!(40000)), Some(2));
        old_open.created_at = Utc::now() - Duration::days(40);
        store.save_order(&old).unwrap();
        store.save_order(&old_open).unwrap();
        store.save_account_snapshot("0xabc", &MockExchange::mock_portfolio()).unwrap();

        assert_eq!(store.cleanup_old_data(30).unwrap(), 1);
        let remaining = store.get_orders(None, 10).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].oid, Some(2));
        assert_eq!(store.get_account_history(30).unwrap().len(), 1);
    }

    #[test]
    fn test_unbounded_day_windows() {
        let store = store();
        store.save_account_snapshot("0xabc", &MockExchange::mock_portfolio()).unwrap();

        assert_eq!(store.get_account_history(u32::MAX).unwrap().len(), 1);
        assert_eq!(store.cleanup_old_data(u32::MAX).unwrap(), 0);
    }

    #[test]
    fn test_settings_created_on_first_read() {
        let store = store();
        let mut settings = store.load_settings().unwrap();
        assert!(!settings.api_credentials.is_configured);

        settings.api_credentials =
            ApiCredentials::new(Some("0xabc".into()), Some("0xkey".into()), Environment::Mainnet);
        settings.updated_at = Utc::now();
        store.save_settings(&settings).unwrap();

        let loaded = store.load_settings().unwrap();
        assert_eq!(loaded.id, settings.id);
        assert_eq!(loaded.api_credentials.environment, Environment::Mainnet);
        assert!(loaded.api_credentials.is_configured);
    }
}
