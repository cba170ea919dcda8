//! Error types shared by the exchange, service, engine and HTTP layers.

use thiserror::Error;

/// A specialized `Result` type for hypertrader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes when talking to Hyperliquid or managing local state.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hyperliquid returned a non-success status
    #[error("Hyperliquid API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Operation needs wallet credentials that are not set
    #[error("Hyperliquid credentials are not configured")]
    NotConfigured,

    /// The coin is not listed or has no price
    #[error("Unknown coin or no price available: {0}")]
    UnknownCoin(String),

    /// Order parameters failed validation
    #[error("Invalid order: {}", .0.join("; "))]
    InvalidOrder(Vec<String>),

    /// Settings payload failed validation
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Order blocked by local risk limits
    #[error("Risk limit: {0}")]
    RiskLimit(String),

    /// The exchange refused the order
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Requested record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// SQLite failure
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Signing client or other exchange-side failure
    #[error("Exchange error: {0}")]
    Exchange(String),
}

impl From<hyperliquid_rust_sdk::Error> for Error {
    fn from(err: hyperliquid_rust_sdk::Error) -> Self {
        Error::Exchange(err.to_string())
    }
}

impl Error {
    /// Whether the failure came from the exchange or the network rather than local input.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Api { .. } | Error::Exchange(_) | Error::OrderRejected(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_order_message_joins_reasons() {
        let err = Error::InvalidOrder(vec![
            "Coin symbol is required".to_string(),
            "Order size must be greater than 0".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid order: Coin symbol is required; Order size must be greater than 0"
        );
    }

    #[test]
    fn test_upstream_classification() {
        assert!(Error::Api { status: 500, body: String::new() }.is_upstream());
        assert!(!Error::NotFound("Strategy".into()).is_upstream());
        assert!(!Error::InvalidOrder(vec![]).is_upstream());
    }
}
