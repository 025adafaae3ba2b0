//! Trailbot Exchange Connectors
//!
//! Adapters for exchange market data streams.
//! Normalizes exchange-specific messages to domain types.

#![warn(clippy::all)]

// Public modules
pub mod binance_ws;

// Re-exports
pub use binance_ws::{
    decode_kline_message, BinanceKlineClient, FeedError, FeedMessage, KlineStreamConfig,
    BINANCE_FUTURES_WS_URL, DEFAULT_KLINE_INTERVAL,
};
