//! Running totals for one daemon session.

use rust_decimal::Decimal;
use trailbot_domain::TradeRecord;

/// Closed-trade statistics, reported on shutdown.
///
/// A trade with zero PnL counts as neither a win nor a loss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Trades closed this session
    pub trades: usize,
    /// Trades with positive PnL
    pub wins: usize,
    /// Trades with negative PnL
    pub losses: usize,
    /// Sum of realized PnL in quote currency
    pub cumulative_pnl: Decimal,
    /// Whether a position was still open at shutdown
    pub position_open: bool,
}

impl SessionSummary {
    /// Fold one closed trade into the totals.
    pub fn record(&mut self, trade: &TradeRecord) {
        self.trades += 1;
        if trade.is_win() {
            self.wins += 1;
        } else if trade.pnl < Decimal::ZERO {
            self.losses += 1;
        }
        self.cumulative_pnl += trade.pnl;
    }
}
