//! Trailbot Daemon Library
//!
//! Runtime orchestrator for the trailbot trading engine.
//!
//! # Architecture
//!
//! ```text
//! Binance kline stream → Market Data (reconnect) → Daemon loop → Engine
//!                                                       │
//!                                   Trade Journal ←─────┤
//!                                                       ↓
//!                                     Event Bus → Console Reporter
//! ```
//!
//! # Components
//!
//! - **Daemon**: Main runtime orchestrator
//! - **Market Data**: Feed connection and reconnect supervision
//! - **Event Bus**: Internal communication (daemon → observers)
//! - **Reporter**: Console lines for prices, entries, trailing moves and trades
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trailbotd::{Config, Daemon, EventBus};
//! use trailbot_store::FileJournal;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let journal = Arc::new(FileJournal::new(&config.journal.path));
//!     let daemon = Daemon::new(config, journal, Arc::new(EventBus::default())).unwrap();
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod daemon;
pub mod error;
pub mod event_bus;
pub mod market_data;
pub mod reporter;
pub mod session;

// Re-exports for convenience
pub use config::{Config, FeedConfig, JournalConfig, ReconnectConfig};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
pub use event_bus::{DaemonEvent, EventBus, EventReceiver};
pub use market_data::MarketDataManager;
pub use reporter::{console_line, ConsoleReporter};
pub use session::SessionSummary;
