//! Trailbot Daemon
//!
//! Paper-trades one instrument on closed klines and journals every trade.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration (SOLUSDT, 1m klines)
//! cargo run -p trailbotd
//!
//! # Trade another symbol with verbose engine logs
//! TRAILBOT_SYMBOL=BTCUSDT RUST_LOG=trailbot_engine=debug cargo run -p trailbotd
//! ```
//!
//! # Environment Variables
//!
//! - `TRAILBOT_SYMBOL`: Trading pair (default: SOLUSDT)
//! - `TRAILBOT_INTERVAL`: Kline interval (default: 1m)
//! - `TRAILBOT_WS_URL`: WebSocket base URL (default: wss://fstream.binance.com/ws)
//! - `TRAILBOT_CAPITAL`: Simulated capital (default: 1000)
//! - `TRAILBOT_LEVERAGE`: Leverage (default: 5)
//! - `TRAILBOT_TAKE_PROFIT_PCT`: Take-profit fraction (default: 0.01)
//! - `TRAILBOT_STOP_LOSS_PCT`: Stop-loss fraction (default: 0.005)
//! - `TRAILBOT_TRAILING_PCT`: Trailing fraction (default: 0.005)
//! - `TRAILBOT_HISTORY_WINDOW`: Closes kept for signals (default: 100)
//! - `TRAILBOT_TRADE_LOG`: Journal file (default: trade_log.txt)
//! - `TRAILBOT_READ_TIMEOUT_SECS`: Feed read timeout (default: 30)
//! - `TRAILBOT_RECONNECT_INITIAL_SECS`: First reconnect delay (default: 1)
//! - `TRAILBOT_RECONNECT_MAX_SECS`: Reconnect delay cap (default: 60)

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trailbot_store::FileJournal;
use trailbotd::{Config, ConsoleReporter, Daemon, EventBus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("trailbotd=info".parse()?))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        symbol = %config.strategy.symbol,
        interval = %config.feed.stream.interval,
        journal = %config.journal.path.display(),
        "Trailbot daemon"
    );

    let event_bus = Arc::new(EventBus::default());
    let journal = Arc::new(FileJournal::new(&config.journal.path));
    let reporter = ConsoleReporter::new(&event_bus).spawn();

    // Create and run daemon
    let daemon = Daemon::new(config, journal, event_bus)?;
    let summary = daemon.run().await?;

    let reported = reporter.await?;
    info!(trades = summary.trades, reported, "Trailbot daemon stopped");

    Ok(())
}
