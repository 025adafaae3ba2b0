//! Market Data Types
//!
//! Exchange-agnostic bar events consumed by the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Symbol;

// =============================================================================
// Bar Event
// =============================================================================

/// One candle update from the feed.
///
/// Prices are raw decimals: validation happens where the price is used, so a
/// bad close can be rejected as a whole event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarEvent {
    /// Trading symbol
    pub symbol: Symbol,
    /// Close price (last price while the bar is still forming)
    pub close: Decimal,
    /// High price
    pub high: Decimal,
    /// Low price
    pub low: Decimal,
    /// Candle close time
    pub close_time: DateTime<Utc>,
    /// Whether the bar is final
    pub is_closed: bool,
}

impl BarEvent {
    /// Create a new bar event.
    pub fn new(
        symbol: Symbol,
        close: Decimal,
        high: Decimal,
        low: Decimal,
        close_time: DateTime<Utc>,
        is_closed: bool,
    ) -> Self {
        Self {
            symbol,
            close,
            high,
            low,
            close_time,
            is_closed,
        }
    }

    /// Create a closed bar whose high and low equal the close.
    pub fn closed(symbol: Symbol, close: Decimal, close_time: DateTime<Utc>) -> Self {
        Self::new(symbol, close, close, close, close_time, true)
    }

    /// Get the candle's range (high - low).
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }
}

// =============================================================================
// Tests
// =============================================================================
