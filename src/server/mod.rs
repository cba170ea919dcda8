//! Dashboard backend: REST API and WebSocket push.
//!
//! Every route lives under `/api`. Successful calls answer with an
//! [`ApiResponse`](crate::models::ApiResponse) envelope, failures with
//! `{"detail": "..."}` and a status code from [`ApiError`].

mod error;
mod routes;
mod ws;

pub use error::ApiError;

use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, PollingConfig};
use crate::engine::TradingEngine;
use crate::persistence::Store;
use crate::service::HyperliquidService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<HyperliquidService>,
    pub store: Arc<Store>,
    pub engine: Arc<TradingEngine>,
    pub market_push: Duration,
    pub portfolio_push: Duration,
}

impl AppState {
    pub fn new(
        service: Arc<HyperliquidService>,
        store: Arc<Store>,
        engine: Arc<TradingEngine>,
        polling: &PollingConfig,
    ) -> Self {
        Self {
            service,
            store,
            engine,
            market_push: Duration::from_secs(polling.market_push_secs),
            portfolio_push: Duration::from_secs(polling.portfolio_push_secs),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/", get(routes::root))
        .route("/api/health", get(routes::health))
        .route("/api/portfolio", get(routes::portfolio))
        .route("/api/account", get(routes::account))
        .route("/api/market/{coin}", get(routes::market_data))
        .route("/api/candlesticks/{coin}", get(routes::candlesticks))
        .route("/api/orderbook/{coin}", get(routes::order_book))
        .route("/api/orders", post(routes::place_order))
        .route("/api/orders/open", get(routes::open_orders))
        .route("/api/orders/history", get(routes::order_history))
        .route("/api/orders/{coin}/{oid}", delete(routes::cancel_order))
        .route(
            "/api/strategies",
            get(routes::list_strategies).post(routes::create_strategy),
        )
        .route(
            "/api/strategies/{id}",
            put(routes::update_strategy).delete(routes::delete_strategy),
        )
        .route(
            "/api/settings",
            get(routes::get_settings).put(routes::update_settings),
        )
        .route("/api/settings/api-status", get(routes::api_status))
        .route("/api/engine/stats", get(routes::engine_stats))
        .route("/api/account/history", get(routes::account_history))
        .route("/api/coins", get(routes::featured))
        .route("/api/coins/all", get(routes::all_coins))
        .route("/api/ws", get(ws::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` is set.
pub async fn serve(config: &Config, state: AppState, shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while !shutdown.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        })
        .await?;

    info!("API server stopped");
    Ok(())
}
