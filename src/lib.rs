//! # Hypertrader
//!
//! Hyperliquid API client, dashboard backend and local trading monitor.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: Hyperliquid REST/WebSocket client, signed orders and mock data
//! - `service`: Live-or-mock account selection with fallbacks and caching
//! - `engine`: Order validation, risk limits and strategy execution
//! - `strategy`: Indicators and entry/exit signal evaluation
//! - `persistence`: SQLite store for orders, trades, strategies and settings
//! - `server`: REST API and WebSocket push for the dashboard
//! - `utils`: Shared utilities and decimal arithmetic

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod models;
pub mod persistence;
pub mod server;
pub mod service;
pub mod strategy;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
