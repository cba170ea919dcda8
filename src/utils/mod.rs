//! Shared helpers: decimal math, display formatting and credential checks.

pub mod decimal;
pub mod format;
pub mod validate;
