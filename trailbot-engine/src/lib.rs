//! Trailbot Engine Layer
//!
//! Pure decision logic, deterministic, no I/O.
//! Takes bar events → returns outcomes (entries, trailing moves, closed trades).

#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod signal;

pub use config::{StrategyConfig, DEFAULT_HISTORY_WINDOW};
pub use engine::{BarOutcome, TradingEngine};
pub use error::{EngineError, EngineResult};
pub use history::PriceHistory;
pub use signal::{momentum_signal, SignalGenerator};
