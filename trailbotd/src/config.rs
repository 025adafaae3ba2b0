//! Daemon configuration.
//!
//! Loads configuration from environment variables with the reference bot's
//! defaults. Values that fail to parse are `DaemonError::Config`; values that
//! parse but are rejected by domain validation surface as `DaemonError::Domain`
//! or `DaemonError::Engine`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use trailbot_connectors::{KlineStreamConfig, BINANCE_FUTURES_WS_URL, DEFAULT_KLINE_INTERVAL};
use trailbot_domain::{BracketConfig, SizingConfig, Symbol};
use trailbot_engine::{StrategyConfig, DEFAULT_HISTORY_WINDOW};
use trailbot_store::DEFAULT_TRADE_LOG;

use crate::error::{DaemonError, DaemonResult};

/// Default traded instrument.
pub const DEFAULT_SYMBOL: &str = "SOLUSDT";

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Market data feed configuration
    pub feed: FeedConfig,

    /// Strategy parameters handed to the engine
    pub strategy: StrategyConfig,

    /// Trade journal configuration
    pub journal: JournalConfig,
}

/// Market data feed configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Stream URL, symbol, interval and read timeout
    pub stream: KlineStreamConfig,
    /// Reconnect policy after the connection drops
    pub reconnect: ReconnectConfig,
}

/// Exponential backoff between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for the delay
    pub max_delay: Duration,
}

impl ReconnectConfig {
    /// Delay following `current`: doubled, capped at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Trade journal configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    /// File receiving one line per closed trade
    pub path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> DaemonResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let strategy = Self::load_strategy_config(&lookup)?;
        let feed = Self::load_feed_config(&lookup, strategy.symbol.clone())?;
        let journal = JournalConfig {
            path: PathBuf::from(
                lookup("TRAILBOT_TRADE_LOG").unwrap_or_else(|| DEFAULT_TRADE_LOG.to_string()),
            ),
        };

        Ok(Self {
            feed,
            strategy,
            journal,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        let symbol = Symbol::from_pair(DEFAULT_SYMBOL).expect("default symbol is valid");
        let mut stream = KlineStreamConfig::new(symbol.clone());
        stream.base_url = "ws://127.0.0.1:9/ws".to_string();
        stream.read_timeout = Duration::from_secs(1);

        Self {
            feed: FeedConfig {
                stream,
                reconnect: ReconnectConfig {
                    initial_delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(80),
                },
            },
            strategy: StrategyConfig::with_defaults(symbol),
            journal: JournalConfig {
                path: env::temp_dir().join("trailbot-test-trade_log.txt"),
            },
        }
    }

    fn load_strategy_config<F>(lookup: &F) -> DaemonResult<StrategyConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let symbol_str = lookup("TRAILBOT_SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
        let symbol = Symbol::from_pair(&symbol_str)?;

        let capital = Self::load_decimal_env(lookup, "TRAILBOT_CAPITAL", Decimal::new(1000, 0))?;
        let leverage = Self::load_decimal_env(lookup, "TRAILBOT_LEVERAGE", Decimal::new(5, 0))?;
        let sizing = SizingConfig::new(capital, leverage)?;

        let take_profit = Self::load_decimal_env(
            lookup,
            "TRAILBOT_TAKE_PROFIT_PCT",
            Decimal::new(1, 2), // 1%
        )?;
        let stop_loss = Self::load_decimal_env(
            lookup,
            "TRAILBOT_STOP_LOSS_PCT",
            Decimal::new(5, 3), // 0.5%
        )?;
        let trailing = Self::load_decimal_env(
            lookup,
            "TRAILBOT_TRAILING_PCT",
            Decimal::new(5, 3), // 0.5%
        )?;
        let bracket = BracketConfig::new(take_profit, stop_loss, trailing)?;

        let window =
            Self::load_parsed_env(lookup, "TRAILBOT_HISTORY_WINDOW", DEFAULT_HISTORY_WINDOW)?;

        Ok(StrategyConfig::new(symbol, sizing, bracket, window)?)
    }

    fn load_feed_config<F>(lookup: &F, symbol: Symbol) -> DaemonResult<FeedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read_timeout_secs = Self::load_parsed_env(lookup, "TRAILBOT_READ_TIMEOUT_SECS", 30u64)?;
        let initial_secs = Self::load_parsed_env(lookup, "TRAILBOT_RECONNECT_INITIAL_SECS", 1u64)?;
        let max_secs = Self::load_parsed_env(lookup, "TRAILBOT_RECONNECT_MAX_SECS", 60u64)?;

        if read_timeout_secs == 0 {
            return Err(DaemonError::Config(
                "TRAILBOT_READ_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        if initial_secs == 0 || max_secs < initial_secs {
            return Err(DaemonError::Config(format!(
                "Invalid reconnect backoff: initial {}s, max {}s",
                initial_secs, max_secs
            )));
        }

        let stream = KlineStreamConfig {
            base_url: lookup("TRAILBOT_WS_URL")
                .unwrap_or_else(|| BINANCE_FUTURES_WS_URL.to_string()),
            symbol,
            interval: lookup("TRAILBOT_INTERVAL")
                .unwrap_or_else(|| DEFAULT_KLINE_INTERVAL.to_string()),
            read_timeout: Duration::from_secs(read_timeout_secs),
        };

        Ok(FeedConfig {
            stream,
            reconnect: ReconnectConfig {
                initial_delay: Duration::from_secs(initial_secs),
                max_delay: Duration::from_secs(max_secs),
            },
        })
    }

    fn load_decimal_env<F>(lookup: &F, key: &str, default: Decimal) -> DaemonResult<Decimal>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(key) {
            Some(val) => Decimal::from_str(val.trim())
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            None => Ok(default),
        }
    }

    fn load_parsed_env<F, T>(lookup: &F, key: &str, default: T) -> DaemonResult<T>
    where
        F: Fn(&str) -> Option<String>,
        T: FromStr,
    {
        match lookup(key) {
            Some(val) => val
                .trim()
                .parse::<T>()
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            None => Ok(default),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
