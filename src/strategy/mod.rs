//! Strategy signal generation.
//!
//! Contains the logic for:
//! - Technical indicators (SMA, RSI)
//! - Entry signals (real-time momentum, moving-average cross)
//! - Exits (take profit / stop loss, trailing stop, reverse signals) and entry confirmation

pub mod indicators;
mod signals;

pub use signals::{
    best_price, confirm_entry, custom_exit, entry_size, evaluate, ma_cross_entry, ma_cross_exit, momentum_entry,
    momentum_exit, Signal, SignalAction,
};
