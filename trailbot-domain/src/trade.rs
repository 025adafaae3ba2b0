//! Closed trade records and their journal rendering.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::position::{OpenPosition, PositionId};
use crate::trailing::realized_pnl;
use crate::value_objects::{DomainError, Price, Quantity, Side, Symbol};

/// Timestamp layout of journal lines (UTC).
pub const JOURNAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Currency label printed after the P&L in journal lines.
pub const JOURNAL_PNL_CURRENCY: &str = "USDT";

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Close reached the trailing take-profit
    TakeProfit,
    /// Close reached the trailing stop-loss
    StopLoss,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => write!(f, "TP hit"),
            ExitReason::StopLoss => write!(f, "SL hit"),
        }
    }
}

/// Immutable snapshot of a completed trade.
///
/// Carries the initial take-profit/stop-loss of the position, not the
/// trailed levels that triggered the exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Position this trade closed
    pub position_id: PositionId,
    /// Instrument traded
    pub symbol: Symbol,
    /// Direction of the position
    pub side: Side,
    /// Simulated quantity
    pub quantity: Quantity,
    /// Entry price
    pub entry_price: Price,
    /// Take-profit computed at entry
    pub initial_take_profit: Price,
    /// Stop-loss computed at entry
    pub initial_stop_loss: Price,
    /// Close that triggered the exit
    pub exit_price: Price,
    /// Exit reason
    pub exit_reason: ExitReason,
    /// Realized profit and loss in quote currency
    pub pnl: Decimal,
    /// Close time of the exit bar
    pub closed_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Build the record for closing `position` at `exit_price`.
    ///
    /// # Errors
    /// Returns a `DomainError` if the P&L is not representable
    pub fn close(
        position: &OpenPosition,
        symbol: Symbol,
        exit_price: Price,
        exit_reason: ExitReason,
        closed_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let pnl = realized_pnl(position.side, position.entry_price, exit_price, position.quantity)?;
        Ok(Self {
            position_id: position.id,
            symbol,
            side: position.side,
            quantity: position.quantity,
            entry_price: position.entry_price,
            initial_take_profit: position.initial.take_profit,
            initial_stop_loss: position.initial.stop_loss,
            exit_price,
            exit_reason,
            pnl,
            closed_at,
        })
    }

    /// Whether the trade made money.
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    /// Render the canonical journal line.
    ///
    /// The P&L is always labelled [`JOURNAL_PNL_CURRENCY`], whatever the quote
    /// currency of the symbol.
    ///
    /// ```text
    /// 2024-01-01 00:03:00 | SIDE: LONG | Entry: 100.00 | TP: 101.00 | SL: 99.50 | Exit: 99.40 | Reason: SL hit | PnL: -30.00 USDT
    /// ```
    pub fn journal_line(&self) -> String {
        format!(
            "{} | SIDE: {} | Entry: {} | TP: {} | SL: {} | Exit: {} | Reason: {} | PnL: {} {}",
            self.closed_at.format(JOURNAL_TIME_FORMAT),
            self.side,
            two_places(self.entry_price.as_decimal()),
            two_places(self.initial_take_profit.as_decimal()),
            two_places(self.initial_stop_loss.as_decimal()),
            two_places(self.exit_price.as_decimal()),
            self.exit_reason,
            two_places(self.pnl),
            JOURNAL_PNL_CURRENCY,
        )
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.journal_line())
    }
}

/// Format with exactly two decimals, rounding half away from zero.
pub fn two_places(value: Decimal) -> String {
    format!("{:.2}", value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

// =============================================================================
// Tests
// =============================================================================
