//! Signed order placement through the Hyperliquid Rust SDK.

use async_trait::async_trait;
use ethers::signers::LocalWallet;
use hyperliquid_rust_sdk::{
    BaseUrl, ClientCancelRequest, ClientLimit, ClientOrder, ClientOrderRequest, ExchangeClient,
    ExchangeDataStatus, ExchangeResponseStatus, MarketCloseParams, MarketOrderParams,
};
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::exchange::traits::OrderGateway;
use crate::models::{Environment, Order, OrderRequest, OrderType, TimeInForce};
use crate::utils::decimal::to_f64;

/// Slippage allowance for market orders (1%).
const MARKET_SLIPPAGE: f64 = 0.01;

/// Order gateway backed by the SDK's signing `ExchangeClient`.
pub struct SdkOrderGateway {
    client: ExchangeClient,
}

impl SdkOrderGateway {
    /// Build a signing client from a hex private key.
    pub async fn connect(private_key: &str, environment: Environment) -> Result<Self> {
        let wallet = parse_wallet(private_key)?;
        let base_url = match environment {
            Environment::Mainnet => BaseUrl::Mainnet,
            Environment::Testnet => BaseUrl::Testnet,
        };

        let client = ExchangeClient::new(None, wallet, Some(base_url), None, None).await?;
        info!(%environment, "Hyperliquid exchange client initialized");
        Ok(Self { client })
    }

    async fn submit(&self, request: &OrderRequest) -> Result<ExchangeResponseStatus> {
        let sz = to_f64(request.sz);

        match request.order_type {
            OrderType::Limit => {
                let limit_px = request.limit_px.ok_or_else(|| {
                    Error::InvalidOrder(vec!["Limit orders require a price".to_string()])
                })?;
                let order = ClientOrderRequest {
                    asset: request.coin.clone(),
                    is_buy: request.is_buy,
                    reduce_only: request.reduce_only,
                    limit_px: to_f64(limit_px),
                    sz,
                    cloid: None,
                    order_type: ClientOrder::Limit(ClientLimit {
                        tif: request.time_in_force.as_str().to_string(),
                    }),
                };
                Ok(self.client.order(order, None).await?)
            }
            OrderType::Market if request.reduce_only => {
                let params = MarketCloseParams {
                    asset: request.coin.as_str(),
                    sz: Some(sz),
                    px: None,
                    slippage: Some(MARKET_SLIPPAGE),
                    cloid: None,
                    wallet: None,
                };
                Ok(self.client.market_close(params).await?)
            }
            OrderType::Market => {
                let params = MarketOrderParams {
                    asset: request.coin.as_str(),
                    is_buy: request.is_buy,
                    sz,
                    px: None,
                    slippage: Some(MARKET_SLIPPAGE),
                    cloid: None,
                    wallet: None,
                };
                Ok(self.client.market_open(params).await?)
            }
        }
    }
}

#[async_trait]
impl OrderGateway for SdkOrderGateway {
    #[instrument(skip(self, request), fields(coin = %request.coin, is_buy = request.is_buy, sz = %request.sz))]
    async fn place_order(&self, request: &OrderRequest) -> Result<Order> {
        if request.time_in_force == TimeInForce::Fok {
            return Err(Error::InvalidOrder(vec![
                "Fill-or-kill is not supported by Hyperliquid".to_string(),
            ]));
        }

        let response = self.submit(request).await?;
        let status = first_status(response)?;
        let order = order_from_status(request, status)?;

        info!(oid = ?order.oid, status = order.status.as_str(), "Order submitted");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, coin: &str, oid: u64) -> Result<bool> {
        let cancel = ClientCancelRequest {
            asset: coin.to_string(),
            oid,
        };

        match self.client.cancel(cancel, None).await? {
            ExchangeResponseStatus::Ok(response) => {
                let rejected = response
                    .data
                    .iter()
                    .flat_map(|d| d.statuses.iter())
                    .find_map(|s| match s {
                        ExchangeDataStatus::Error(msg) => Some(msg.clone()),
                        _ => None,
                    });

                if let Some(msg) = rejected {
                    warn!(coin, oid, "Cancel rejected: {}", msg);
                    return Ok(false);
                }
                info!(coin, oid, "Order cancelled");
                Ok(true)
            }
            ExchangeResponseStatus::Err(msg) => Err(Error::OrderRejected(msg)),
        }
    }
}

fn parse_wallet(private_key: &str) -> Result<LocalWallet> {
    let key = private_key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    // The parse error can echo key material, so it is not forwarded.
    key.parse::<LocalWallet>()
        .map_err(|_| Error::Exchange("Invalid private key".to_string()))
}

fn first_status(response: ExchangeResponseStatus) -> Result<ExchangeDataStatus> {
    match response {
        ExchangeResponseStatus::Ok(response) => response
            .data
            .and_then(|d| d.statuses.into_iter().next())
            .ok_or_else(|| Error::Exchange("Exchange returned no order status".to_string())),
        ExchangeResponseStatus::Err(msg) => Err(Error::OrderRejected(msg)),
    }
}

fn order_from_status(request: &OrderRequest, status: ExchangeDataStatus) -> Result<Order> {
    match status {
        ExchangeDataStatus::Resting(resting) => Ok(Order::pending(request, Some(resting.oid))),
        ExchangeDataStatus::Filled(filled) => {
            let mut order = Order::pending(request, Some(filled.oid));
            let total_sz = filled.total_sz.parse().unwrap_or(request.sz);
            let avg_px = filled.avg_px.parse().unwrap_or_default();
            order.partial_fill(total_sz, avg_px);
            Ok(order)
        }
        ExchangeDataStatus::Error(msg) => Err(Error::OrderRejected(msg)),
        // Success, WaitingForFill, WaitingForTrigger carry no oid
        _ => Ok(Order::pending(request, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperliquid_rust_sdk::{FilledOrder, RestingOrder};
    use rust_decimal_macros::dec;

    #[test]
    fn test_resting_status_becomes_pending_order() {
        let req = OrderRequest::limit("BTC", true, dec!(0.1), dec!(44000));
        let order = order_from_status(&req, ExchangeDataStatus::Resting(RestingOrder { oid: 77 })).unwrap();
        assert_eq!(order.oid, Some(77));
        assert_eq!(order.status.as_str(), "pending");
        assert_eq!(order.remaining_size, dec!(0.1));
    }

    #[test]
    fn test_filled_status_records_average_price() {
        let req = OrderRequest::market("ETH", false, dec!(2));
        let filled = FilledOrder {
            total_sz: "2.0".to_string(),
            avg_px: "3150.5".to_string(),
            oid: 9,
        };
        let order = order_from_status(&req, ExchangeDataStatus::Filled(filled)).unwrap();
        assert_eq!(order.status.as_str(), "filled");
        assert_eq!(order.average_fill_price, dec!(3150.5));
        assert_eq!(order.remaining_size, dec!(0));
    }

    #[test]
    fn test_error_status_is_rejection() {
        let req = OrderRequest::limit("BTC", true, dec!(0.1), dec!(1));
        let err = order_from_status(&req, ExchangeDataStatus::Error("Insufficient margin".into())).unwrap_err();
        assert!(matches!(err, Error::OrderRejected(msg) if msg == "Insufficient margin"));
    }

    #[test]
    fn test_wallet_parsing() {
        let key = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        assert!(parse_wallet(key).is_ok());
        assert!(parse_wallet("not-a-key").is_err());
    }
}
