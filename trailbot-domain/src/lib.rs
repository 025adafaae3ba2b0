//! Trailbot Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains value objects, position state, trade records and bracket rules.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod market_data;
pub mod position;
pub mod trade;
pub mod trailing;
pub mod value_objects;

// Re-export commonly used types
pub use market_data::BarEvent;
pub use position::{OpenPosition, PositionId, PositionState};
pub use trade::{ExitReason, TradeRecord};
pub use trailing::Bracket;
pub use value_objects::{
    BracketConfig, DomainError, Price, Quantity, Side, SizingConfig, Symbol,
};
