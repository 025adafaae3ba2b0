//! Position state of the simulated account.
//!
//! A position is either flat or open on one side. The open variant carries
//! every price/quantity field, so a flat position can never hold stale levels.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trailing::{initial_bracket, realized_pnl, Bracket};
use crate::value_objects::{BracketConfig, DomainError, Price, Quantity, Side};

/// Unique identifier for a Position
pub type PositionId = Uuid;

/// An open simulated position with its initial and trailing brackets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    /// Position identifier (UUID v7)
    pub id: PositionId,
    /// Direction of the position
    pub side: Side,
    /// Close the position was opened at
    pub entry_price: Price,
    /// Simulated quantity
    pub quantity: Quantity,
    /// Levels computed at entry (reported in the trade record)
    pub initial: Bracket,
    /// Levels currently used for exit evaluation
    pub trailing: Bracket,
    /// Close time of the entry bar
    pub opened_at: DateTime<Utc>,
}

impl OpenPosition {
    /// Open a position at `entry_price`; trailing levels start at the initial bracket.
    ///
    /// # Errors
    /// Returns a `DomainError` if the initial levels are not representable
    pub fn open(
        side: Side,
        entry_price: Price,
        quantity: Quantity,
        config: &BracketConfig,
        opened_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let initial = initial_bracket(side, entry_price, config)?;
        Ok(Self {
            id: Uuid::now_v7(),
            side,
            entry_price,
            quantity,
            initial,
            trailing: initial,
            opened_at,
        })
    }

    /// Unrealized P&L if the position were closed at `price`.
    pub fn unrealized_pnl(&self, price: Price) -> Result<Decimal, DomainError> {
        realized_pnl(self.side, self.entry_price, price, self.quantity)
    }
}

/// Current trading stance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PositionState {
    /// No position
    #[default]
    Flat,
    /// Position open on one side
    Open(OpenPosition),
}

impl PositionState {
    /// Check if there is no open position
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    /// Side of the open position, if any
    pub fn side(&self) -> Option<Side> {
        self.as_open().map(|p| p.side)
    }

    /// Borrow the open position, if any
    pub fn as_open(&self) -> Option<&OpenPosition> {
        match self {
            PositionState::Open(position) => Some(position),
            PositionState::Flat => None,
        }
    }
}
