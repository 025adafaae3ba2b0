//! Engine error types.

use rust_decimal::Decimal;
use thiserror::Error;
use trailbot_domain::{DomainError, Symbol};

/// Reasons a bar event is rejected by the engine.
///
/// A rejected event leaves history and position untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Close price is not a valid (positive) price
    #[error("Invalid close price {close}: {source}")]
    InvalidClose {
        /// Offending close
        close: Decimal,
        /// Validation failure
        source: DomainError,
    },

    /// Bar belongs to another instrument
    #[error("Symbol mismatch: expected {expected}, got {actual}")]
    SymbolMismatch {
        /// Instrument the engine trades
        expected: Symbol,
        /// Instrument of the bar
        actual: Symbol,
    },

    /// Close is valid but the open position's levels or P&L cannot be
    /// computed from it
    #[error("Close price {close} out of range: {source}")]
    CloseOutOfRange {
        /// Offending close
        close: Decimal,
        /// Arithmetic failure
        source: DomainError,
    },

    /// Entry could not be opened (sizing or level failure)
    #[error("Entry rejected: {0}")]
    EntryRejected(#[from] DomainError),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
