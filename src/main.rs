//! Hypertrader - Main Entry Point
//!
//! Serves the dashboard API, runs the local monitor and offers one-shot
//! status and order commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hypertrader::config::Config;
use hypertrader::engine::TradingEngine;
use hypertrader::exchange::{AccountGateway, HyperliquidWebSocket, MarketDataSource, WsEvent};
use hypertrader::models::{Environment, OrderRequest};
use hypertrader::persistence::Store;
use hypertrader::server::{self, AppState};
use hypertrader::service::HyperliquidService;
use hypertrader::utils::format::{
    format_currency, format_percentage, format_pnl, short_address, time_ago,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Pause before reconnecting the price feed.
const FEED_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Hypertrader CLI
#[derive(Parser)]
#[command(name = "hypertrader")]
#[command(version, about = "Hyperliquid dashboard backend and local trading monitor")]
struct Cli {
    /// Use mock market data instead of the Hyperliquid API
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the trading engine (default)
    Serve,

    /// Poll the account and watched coins, logging a dashboard summary
    Monitor,

    /// Show connection, account and database status
    Status {
        /// Show positions and recent orders
        #[arg(short, long)]
        verbose: bool,
    },

    /// Place or cancel an order
    Order {
        #[command(subcommand)]
        action: OrderCommand,
    },

    /// Delete account history and closed orders older than the retention window
    Cleanup {
        /// Days to keep (default: storage.history_retention_days)
        #[arg(short, long)]
        days: Option<u32>,
    },
}

#[derive(Subcommand)]
enum OrderCommand {
    /// Place a market order, or a limit order when --price is given
    Place {
        coin: String,

        #[arg(value_enum)]
        side: Side,

        /// Order size (default: trading.default_order_size)
        #[arg(short, long)]
        size: Option<Decimal>,

        /// Limit price
        #[arg(short, long)]
        price: Option<Decimal>,

        /// Only reduce an existing position
        #[arg(long)]
        reduce_only: bool,
    },

    /// Cancel a resting order by exchange order id
    Cancel { coin: String, oid: u64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Buy,
    Sell,
}

/// Shared components every command runs on.
struct Runtime {
    service: Arc<HyperliquidService>,
    store: Arc<Store>,
    engine: Arc<TradingEngine>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let mut config = Config::load()?;
    if cli.offline {
        config.hyperliquid.offline = true;
    }
    config.validate()?;

    let runtime = build_runtime(&config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config, runtime).await,
        Commands::Monitor => run_monitor(&config, runtime).await,
        Commands::Status { verbose } => show_status(&runtime, verbose).await,
        Commands::Order { action } => run_order(&config, &runtime, action).await,
        Commands::Cleanup { days } => {
            let days = days.unwrap_or(config.storage.history_retention_days);
            let removed = runtime.store.cleanup_old_data(days)?;
            println!("Removed {removed} records older than {days} days");
            Ok(())
        }
    }
}

/// Open the store, connect the service and load persisted strategies.
async fn build_runtime(config: &Config) -> Result<Runtime> {
    let db_path = Path::new(&config.storage.db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = Arc::new(Store::open(db_path).context("Failed to open database")?);

    let service = Arc::new(
        HyperliquidService::from_config(config)
            .await
            .context("Failed to initialize Hyperliquid service")?,
    );

    // Credentials saved from the dashboard apply when none are configured
    if !service.is_configured().await {
        let saved = store.load_settings()?.api_credentials;
        if saved.has_keys() {
            info!("Using credentials saved in settings");
            service.reconfigure(saved).await;
        }
    }

    let engine = Arc::new(TradingEngine::new(
        service.clone(),
        service.clone(),
        store.clone(),
        config,
    ));
    engine.load_strategies().await?;

    Ok(Runtime {
        service,
        store,
        engine,
    })
}

/// Set on Ctrl-C.
fn shutdown_flag() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        flag.store(true, Ordering::SeqCst);
    });
    shutdown
}

/// Keep the engine's price map fed from the allMids stream of the market data
/// network, reconnecting on drop.
fn spawn_price_feed(environment: Environment, engine: Arc<TradingEngine>, shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        while !shutdown.load(Ordering::SeqCst) {
            let (tx, mut rx) = mpsc::channel(100);
            let socket = HyperliquidWebSocket::new(environment);
            let reader = tokio::spawn(async move { socket.subscribe_all_mids(tx).await });

            while let Some(event) = rx.recv().await {
                match event {
                    WsEvent::AllMids(mids) => engine.update_prices(mids).await,
                    WsEvent::Connected => info!("Price feed connected"),
                    WsEvent::Disconnected => warn!("Price feed disconnected"),
                }
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
            }

            reader.abort();
            if let Ok(Err(e)) = reader.await {
                warn!(error = %e, "Price feed error");
            }
            tokio::time::sleep(FEED_RECONNECT_DELAY).await;
        }
    });
}

async fn run_server(config: &Config, runtime: Runtime) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        configured = runtime.service.is_configured().await,
        environment = %runtime.service.environment().await,
        "Starting Hypertrader API"
    );

    let removed = runtime.store.cleanup_old_data(config.storage.history_retention_days)?;
    if removed > 0 {
        info!(removed, "Old records cleaned up");
    }

    let shutdown = shutdown_flag();
    if let Some(environment) = runtime.service.market_environment() {
        spawn_price_feed(environment, runtime.engine.clone(), shutdown.clone());
    }
    let engine_task = tokio::spawn(runtime.engine.clone().run(shutdown.clone()));

    let state = AppState::new(
        runtime.service.clone(),
        runtime.store.clone(),
        runtime.engine.clone(),
        &config.polling,
    );
    let result = server::serve(config, state, shutdown.clone()).await;

    shutdown.store(true, Ordering::SeqCst);
    engine_task.await.ok();
    info!("Hypertrader shutdown complete");
    result
}

async fn run_monitor(config: &Config, runtime: Runtime) -> Result<()> {
    info!(
        coins = ?config.monitor.watched_coins,
        refresh_secs = config.polling.refresh_secs,
        "Starting monitor"
    );

    let shutdown = shutdown_flag();
    if let Some(environment) = runtime.service.market_environment() {
        spawn_price_feed(environment, runtime.engine.clone(), shutdown.clone());
    }
    let engine_task = tokio::spawn(runtime.engine.clone().run(shutdown.clone()));

    let refresh = Duration::from_secs(config.polling.refresh_secs);
    while !shutdown.load(Ordering::SeqCst) {
        if let Err(e) = monitor_cycle(config, &runtime).await {
            error!(error = %e, "Monitor cycle failed");
        }
        tokio::time::sleep(refresh).await;
    }

    engine_task.await.ok();
    info!("Monitor stopped");
    Ok(())
}

/// One refresh: log the dashboard summary and snapshot the account.
async fn monitor_cycle(config: &Config, runtime: &Runtime) -> Result<()> {
    let portfolio = runtime.service.portfolio().await?;
    let account = runtime.service.account().await?;

    info!(
        account_value = %format_currency(portfolio.account_value),
        available = %format_currency(portfolio.available_balance),
        margin_used = %format_currency(portfolio.margin_used),
        pnl = %format_pnl(portfolio.total_pnl),
        positions = portfolio.positions.len(),
        "Account"
    );
    for position in &portfolio.positions {
        info!(
            coin = %position.coin,
            side = ?position.side,
            size = %position.size,
            entry = %position.entry_price,
            mark = %position.current_price,
            pnl = %format_pnl(position.unrealized_pnl),
            "Position"
        );
    }

    for coin in &config.monitor.watched_coins {
        match runtime.service.market_data(coin).await {
            Ok(data) => {
                runtime
                    .engine
                    .update_prices(HashMap::from([(coin.clone(), data.price)]))
                    .await;
                info!(
                    coin = %coin,
                    price = %data.price,
                    change_24h = %format_percentage(data.change_24h),
                    "Market"
                );
            }
            Err(e) => warn!(coin = %coin, error = %e, "Market data unavailable"),
        }
    }

    runtime.store.save_account_snapshot(&account.address, &portfolio)?;

    let stats = runtime.engine.stats().await;
    info!(
        active_orders = stats.active_orders,
        active_strategies = stats.active_strategies,
        daily_loss = %stats.current_daily_loss,
        daily_limit = %stats.daily_loss_limit,
        "Engine"
    );
    Ok(())
}

async fn show_status(runtime: &Runtime, verbose: bool) -> Result<()> {
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║                   HYPERTRADER STATUS                       ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let status = runtime.service.api_status().await;
    println!("\n🔌 Connection");
    println!("   ├─ Environment:      {}", status.environment);
    println!(
        "   ├─ Wallet:           {}",
        status.wallet_address.as_deref().map(short_address).unwrap_or_else(|| "not set".to_string())
    );
    println!("   ├─ Configured:       {}", status.is_configured);
    println!(
        "   └─ Test:             {}",
        status.test_result.as_deref().unwrap_or("using mock data")
    );

    let portfolio = runtime.service.portfolio().await?;
    println!("\n📊 Account Summary");
    println!("   ├─ Account Value:    {}", format_currency(portfolio.account_value));
    println!("   ├─ Available:        {}", format_currency(portfolio.available_balance));
    println!("   ├─ Margin Used:      {}", format_currency(portfolio.margin_used));
    println!("   └─ PnL:              {}", format_pnl(portfolio.total_pnl));

    if verbose && !portfolio.positions.is_empty() {
        println!("\n🔓 Open Positions");
        for position in &portfolio.positions {
            println!(
                "   ├─ {:<6} {:?} {} @ {} (mark {}) {}",
                position.coin,
                position.side,
                position.size,
                position.entry_price,
                position.current_price,
                format_pnl(position.unrealized_pnl)
            );
        }
    }

    println!("\n💾 Database");
    for (table, count) in runtime.store.database_stats()? {
        println!("   ├─ {table:<16}  {count}");
    }

    if verbose {
        let orders = runtime.store.get_orders(None, 10)?;
        if !orders.is_empty() {
            println!("\n📜 Recent Orders");
            for order in orders {
                println!(
                    "   ├─ {:<6} {:?} {} {} {} ({})",
                    order.coin,
                    order.side,
                    order.size,
                    order.price.map(|p| p.to_string()).unwrap_or_else(|| "market".to_string()),
                    order.status.as_str(),
                    time_ago(order.created_at)
                );
            }
        }

        let strategies = runtime.store.get_strategies()?;
        if !strategies.is_empty() {
            println!("\n🧭 Strategies");
            for strategy in strategies {
                println!(
                    "   ├─ {} [{}] {} trades, {}",
                    strategy.name,
                    strategy.status.as_str(),
                    strategy.performance.total_trades,
                    format_pnl(strategy.performance.total_pnl)
                );
            }
        }
    }

    Ok(())
}

async fn run_order(config: &Config, runtime: &Runtime, action: OrderCommand) -> Result<()> {
    match action {
        OrderCommand::Place {
            coin,
            side,
            size,
            price,
            reduce_only,
        } => {
            let coin = coin.to_uppercase();
            let is_buy = matches!(side, Side::Buy);
            let size = size.unwrap_or(config.trading.default_order_size);

            // Market orders are risk-checked against the current mid
            let market = runtime.service.market_data(&coin).await?;
            runtime
                .engine
                .update_prices(HashMap::from([(coin.clone(), market.price)]))
                .await;

            let mut request = match price {
                Some(price) => OrderRequest::limit(&coin, is_buy, size, price),
                None => OrderRequest::market(&coin, is_buy, size),
            };
            if reduce_only {
                request = request.reduce_only();
            }

            let order = runtime.engine.place_order(request).await?;
            println!(
                "Order {} {}: {:?} {} {} (oid {})",
                order.status.as_str(),
                order.id,
                order.side,
                order.size,
                order.coin,
                order.oid.map(|o| o.to_string()).unwrap_or_else(|| "-".to_string())
            );
        }
        OrderCommand::Cancel { coin, oid } => {
            let cancelled = runtime
                .engine
                .cancel_exchange_order(&coin.to_uppercase(), oid)
                .await?;
            if cancelled {
                println!("Order {oid} cancelled");
            } else {
                println!("Order {oid} could not be cancelled");
            }
        }
    }
    Ok(())
}

/// Initialize logging to stdout and an hourly rolling file.
fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "hypertrader.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the program duration
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hypertrader=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .init();

    Ok(())
}
