//! Trading engine: the position state machine.
//!
//! ```text
//!            signal (Long/Short)
//!   FLAT ───────────────────────────▶ OPEN(side)
//!     ▲                                  │ ratchet trailing levels
//!     │          TP hit / SL hit         │ then evaluate exit
//!     └──────────────────────────────────┘
//! ```
//!
//! Every closed bar is appended to the rolling history. While flat the
//! history drives entry; while open the bar drives the trailing ratchet and
//! the exit check, in that order and against the same close.
//!
//! Events are applied all-or-nothing: an event rejected with an
//! [`EngineError`] leaves history and position exactly as they were.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use trailbot_domain::trailing::{evaluate_exit, ratchet_bracket};
use trailbot_domain::{
    BarEvent, Bracket, DomainError, OpenPosition, PositionState, Price, Side, TradeRecord,
};

use crate::config::StrategyConfig;
use crate::error::{EngineError, EngineResult};
use crate::signal::SignalGenerator;

/// What a single bar did to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum BarOutcome {
    /// Bar is still forming; nothing changed
    Ignored,
    /// Flat and no direction; the close was recorded
    NoSignal,
    /// A position was opened on this close
    Entered(OpenPosition),
    /// Position open, levels unchanged, no exit
    Held,
    /// Position open, trailing levels moved, no exit
    Trailed(Bracket),
    /// Position closed on this bar
    Exited {
        /// The completed trade
        record: TradeRecord,
        /// Levels set by a ratchet on the same bar, if one fired
        trailed: Option<Bracket>,
    },
}

/// Single-instrument trading engine.
///
/// Owns the rolling price history and the position; nothing else mutates them.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingEngine {
    config: StrategyConfig,
    signals: SignalGenerator,
    position: PositionState,
}

impl TradingEngine {
    /// Create a flat engine.
    pub fn new(config: StrategyConfig) -> EngineResult<Self> {
        let signals = SignalGenerator::new(config.history_window)?;
        Ok(Self {
            config,
            signals,
            position: PositionState::Flat,
        })
    }

    /// Process one bar event.
    ///
    /// # Errors
    ///
    /// The event is rejected, with no state change, when:
    /// - the bar is for another symbol
    /// - the close is not positive
    /// - an entry would be opened but the quantity rounds to zero
    /// - the close is too large or too small for the level or P&L arithmetic
    pub fn process_bar(&mut self, bar: &BarEvent) -> EngineResult<BarOutcome> {
        if !bar.is_closed {
            return Ok(BarOutcome::Ignored);
        }

        if bar.symbol != self.config.symbol {
            return Err(EngineError::SymbolMismatch {
                expected: self.config.symbol.clone(),
                actual: bar.symbol.clone(),
            });
        }

        let close = Price::new(bar.close).map_err(|source| EngineError::InvalidClose {
            close: bar.close,
            source,
        })?;

        if self.position.is_flat() {
            self.process_flat(close, bar.close_time)
        } else {
            self.process_open(close, bar.close_time)
        }
    }

    /// Record the close and open a position if the closes diverge.
    fn process_flat(&mut self, close: Price, at: DateTime<Utc>) -> EngineResult<BarOutcome> {
        // Build the position before touching history so a failure rejects the whole event
        let position = match self.signals.signal_after(close) {
            Some(side) => {
                let quantity = self.config.sizing.position_size(close)?;
                Some(OpenPosition::open(side, close, quantity, &self.config.bracket, at)?)
            },
            None => None,
        };

        self.signals.observe(close);

        let Some(position) = position else {
            return Ok(BarOutcome::NoSignal);
        };

        debug!(
            position_id = %position.id,
            side = %position.side,
            entry_price = %close,
            quantity = %position.quantity,
            take_profit = %position.initial.take_profit,
            stop_loss = %position.initial.stop_loss,
            "Position opened"
        );

        self.position = PositionState::Open(position.clone());
        Ok(BarOutcome::Entered(position))
    }

    /// Ratchet, then check exits against the ratcheted levels.
    ///
    /// Levels and the trade record are computed first; history and position
    /// change only once every step has succeeded.
    fn process_open(&mut self, close: Price, at: DateTime<Utc>) -> EngineResult<BarOutcome> {
        let PositionState::Open(current) = &self.position else {
            return Ok(BarOutcome::NoSignal);
        };

        let out_of_range = |source: DomainError| EngineError::CloseOutOfRange {
            close: close.as_decimal(),
            source,
        };

        let mut position = current.clone();
        let trailed = ratchet_bracket(position.side, close, &position.trailing, &self.config.bracket)
            .map_err(out_of_range)?;
        if let Some(levels) = trailed {
            position.trailing = levels;
        }

        let record = match evaluate_exit(position.side, close, &position.trailing) {
            Some(reason) => Some(
                TradeRecord::close(&position, self.config.symbol.clone(), close, reason, at)
                    .map_err(out_of_range)?,
            ),
            None => None,
        };

        self.signals.observe(close);

        if let Some(levels) = trailed {
            debug!(
                position_id = %position.id,
                take_profit = %levels.take_profit,
                stop_loss = %levels.stop_loss,
                "Trailing levels moved"
            );
        }

        let outcome = match record {
            Some(record) => {
                debug!(
                    position_id = %record.position_id,
                    exit_price = %close,
                    reason = %record.exit_reason,
                    pnl = %record.pnl,
                    "Position closed"
                );
                self.position = PositionState::Flat;
                BarOutcome::Exited { record, trailed }
            },
            None => {
                self.position = PositionState::Open(position);
                match trailed {
                    Some(levels) => BarOutcome::Trailed(levels),
                    None => BarOutcome::Held,
                }
            },
        };
        Ok(outcome)
    }

    /// Current position.
    pub fn position(&self) -> &PositionState {
        &self.position
    }

    /// Side of the open position, if any.
    pub fn side(&self) -> Option<Side> {
        self.position.side()
    }

    /// Unrealized P&L of the open position at `price`.
    pub fn unrealized_pnl(&self, price: Price) -> EngineResult<Option<Decimal>> {
        match self.position.as_open() {
            Some(position) => Ok(Some(position.unrealized_pnl(price)?)),
            None => Ok(None),
        }
    }

    /// Signal generator and its history.
    pub fn signals(&self) -> &SignalGenerator {
        &self.signals
    }

    /// Strategy parameters.
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use trailbot_domain::{BracketConfig, ExitReason, SizingConfig, Symbol};

    fn symbol() -> Symbol {
        Symbol::from_pair("SOLUSDT").unwrap()
    }

    fn engine_with_trailing(trailing_pct: Decimal) -> TradingEngine {
        let config = StrategyConfig::new(
            symbol(),
            SizingConfig::new(dec!(1000), dec!(5)).unwrap(),
            BracketConfig::new(dec!(0.01), dec!(0.005), trailing_pct).unwrap(),
            100,
        )
        .unwrap();
        TradingEngine::new(config).unwrap()
    }

    fn engine() -> TradingEngine {
        engine_with_trailing(dec!(0.005))
    }

    /// Feeds closed bars one minute apart and returns the outcomes.
    fn feed(engine: &mut TradingEngine, closes: &[Decimal]) -> Vec<BarOutcome> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 59).unwrap();
        let offset = engine.signals().history().len() as i64;
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                let at = start + Duration::minutes(offset + i as i64);
                engine.process_bar(&BarEvent::closed(symbol(), *close, at)).unwrap()
            })
            .collect()
    }

    fn open_position(engine: &TradingEngine) -> &OpenPosition {
        engine.position().as_open().expect("position should be open")
    }

    // =========================================================================
    // Entry
    // =========================================================================

    #[test]
    fn test_first_close_never_enters() {
        let mut engine = engine();
        assert_eq!(feed(&mut engine, &[dec!(100)]), vec![BarOutcome::NoSignal]);
        assert!(engine.position().is_flat());
    }

    #[test]
    fn test_equal_closes_stay_flat() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(100), dec!(100), dec!(100)]);
        assert!(engine.position().is_flat());
        assert_eq!(engine.signals().history().len(), 3);
    }

    #[test]
    fn test_long_entry_brackets() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(99), dec!(100)]);

        let position = open_position(&engine);
        assert_eq!(position.side, Side::Long);
        assert_eq!(position.entry_price.as_decimal(), dec!(100));
        assert_eq!(position.quantity.as_decimal(), dec!(50));
        assert_eq!(position.initial.take_profit.as_decimal(), dec!(101.0));
        assert_eq!(position.initial.stop_loss.as_decimal(), dec!(99.5));
        assert_eq!(position.trailing, position.initial);
    }

    #[test]
    fn test_short_entry_brackets() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(101), dec!(100)]);

        let position = open_position(&engine);
        assert_eq!(position.side, Side::Short);
        assert_eq!(position.initial.take_profit.as_decimal(), dec!(99.0));
        assert_eq!(position.initial.stop_loss.as_decimal(), dec!(100.5));
    }

    #[test]
    fn test_unclosed_bar_is_ignored() {
        let mut engine = engine();
        let before = engine.clone();

        let bar = BarEvent::new(symbol(), dec!(100), dec!(101), dec!(99), Utc::now(), false);
        assert_eq!(engine.process_bar(&bar).unwrap(), BarOutcome::Ignored);
        assert_eq!(engine, before);
    }

    // =========================================================================
    // Rejections leave state untouched
    // =========================================================================

    #[test]
    fn test_non_positive_close_rejected_without_mutation() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(100)]);
        let before = engine.clone();

        for bad in [dec!(0), dec!(-5)] {
            let result = engine.process_bar(&BarEvent::closed(symbol(), bad, Utc::now()));
            assert!(matches!(result, Err(EngineError::InvalidClose { .. })));
            assert_eq!(engine, before);
        }
    }

    #[test]
    fn test_non_positive_close_rejected_while_open() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(99), dec!(100)]);
        let before = engine.clone();

        let result = engine.process_bar(&BarEvent::closed(symbol(), dec!(0), Utc::now()));

        assert!(result.is_err());
        assert_eq!(engine, before);
    }

    #[test]
    fn test_other_symbol_rejected() {
        let mut engine = engine();
        let bar = BarEvent::closed(Symbol::from_pair("BTCUSDT").unwrap(), dec!(100), Utc::now());

        let result = engine.process_bar(&bar);

        assert!(matches!(result, Err(EngineError::SymbolMismatch { .. })));
        assert!(engine.signals().history().is_empty());
    }

    #[test]
    fn test_sizing_failure_rejects_entry_and_keeps_history() {
        let config = StrategyConfig::new(
            symbol(),
            SizingConfig::new(dec!(1), dec!(1)).unwrap(),
            BracketConfig::default(),
            100,
        )
        .unwrap();
        let mut engine = TradingEngine::new(config).unwrap();
        feed(&mut engine, &[dec!(999999)]);
        let before = engine.clone();

        let result = engine.process_bar(&BarEvent::closed(symbol(), dec!(1000000), Utc::now()));

        assert!(matches!(result, Err(EngineError::EntryRejected(_))));
        assert_eq!(engine, before);
    }

    // =========================================================================
    // Trailing and exits
    // =========================================================================

    #[test]
    fn test_scenario_a_ratchets_then_exits_on_trailed_stop() {
        let mut engine = engine();
        let outcomes = feed(&mut engine, &[dec!(100), dec!(101)]);
        assert!(matches!(outcomes[1], BarOutcome::Entered(_)));

        let position = open_position(&engine);
        assert_eq!(position.entry_price.as_decimal(), dec!(101));
        assert_eq!(position.quantity.as_decimal(), dec!(49.5050));
        assert_eq!(position.initial.take_profit.as_decimal(), dec!(102.01));
        assert_eq!(position.initial.stop_loss.as_decimal(), dec!(100.495));

        // 105 >= 102.01: ratchet, and 105 < 105.525 so no exit
        let outcomes = feed(&mut engine, &[dec!(105)]);
        match &outcomes[0] {
            BarOutcome::Trailed(levels) => {
                assert_eq!(levels.take_profit.as_decimal(), dec!(105.525));
                assert_eq!(levels.stop_loss.as_decimal(), dec!(104.475));
            },
            other => panic!("Expected Trailed, got {:?}", other),
        }

        // 106 ratchets again
        feed(&mut engine, &[dec!(106)]);
        let position = open_position(&engine);
        assert_eq!(position.trailing.take_profit.as_decimal(), dec!(106.53));
        assert_eq!(position.trailing.stop_loss.as_decimal(), dec!(105.47));

        // Pullback through the trailed stop
        let outcomes = feed(&mut engine, &[dec!(105.4)]);
        match &outcomes[0] {
            BarOutcome::Exited { record, trailed } => {
                assert!(trailed.is_none());
                assert_eq!(record.exit_reason, ExitReason::StopLoss);
                assert_eq!(record.exit_price.as_decimal(), dec!(105.4));
                assert_eq!(record.pnl, (dec!(105.4) - dec!(101)) * dec!(49.5050));
                assert_eq!(record.initial_take_profit.as_decimal(), dec!(102.01));
                assert_eq!(record.initial_stop_loss.as_decimal(), dec!(100.495));
                assert!(record.is_win());
            },
            other => panic!("Expected Exited, got {:?}", other),
        }
        assert!(engine.position().is_flat());
    }

    #[test]
    fn test_take_profit_fires_on_touch_without_trailing_distance() {
        let mut engine = engine_with_trailing(dec!(0));
        feed(&mut engine, &[dec!(100), dec!(101)]);

        let outcomes = feed(&mut engine, &[dec!(105)]);
        match &outcomes[0] {
            BarOutcome::Exited { record, trailed } => {
                // Ratchet fired first, then the exit saw the moved level
                assert_eq!(trailed.map(|l| l.take_profit.as_decimal()), Some(dec!(105)));
                assert_eq!(record.exit_reason, ExitReason::TakeProfit);
                assert_eq!(record.pnl, (dec!(105) - dec!(101)) * dec!(49.5050));
            },
            other => panic!("Expected Exited, got {:?}", other),
        }
        assert!(engine.position().is_flat());
    }

    #[test]
    fn test_trailing_distance_keeps_take_profit_out_of_reach() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(100), dec!(101)]);

        // Every close at or above the trailing TP lifts it above the close
        for outcome in feed(&mut engine, &[dec!(102.01), dec!(103), dec!(104), dec!(110)]) {
            assert!(matches!(outcome, BarOutcome::Trailed(_)));
        }
        assert_eq!(engine.side(), Some(Side::Long));
    }

    #[test]
    fn test_scenario_b_stop_loss() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(99), dec!(100)]);

        let outcomes = feed(&mut engine, &[dec!(99.4)]);
        match &outcomes[0] {
            BarOutcome::Exited { record, trailed } => {
                assert!(trailed.is_none());
                assert_eq!(record.exit_reason, ExitReason::StopLoss);
                assert_eq!(record.pnl, dec!(-30));
                assert_eq!(record.side, Side::Long);
            },
            other => panic!("Expected Exited, got {:?}", other),
        }
        assert!(engine.position().is_flat());
    }

    #[test]
    fn test_short_trailing_and_stop() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(101), dec!(100)]);

        // 98 <= 99: ratchet down
        feed(&mut engine, &[dec!(98)]);
        let position = open_position(&engine);
        assert_eq!(position.trailing.take_profit.as_decimal(), dec!(97.51));
        assert_eq!(position.trailing.stop_loss.as_decimal(), dec!(98.49));

        let outcomes = feed(&mut engine, &[dec!(98.6)]);
        match &outcomes[0] {
            BarOutcome::Exited { record, .. } => {
                assert_eq!(record.exit_reason, ExitReason::StopLoss);
                assert_eq!(record.side, Side::Short);
                // (100 - 98.6) × 50
                assert_eq!(record.pnl, dec!(70));
            },
            other => panic!("Expected Exited, got {:?}", other),
        }
    }

    #[test]
    fn test_quiet_bar_leaves_position_unchanged() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(99), dec!(100)]);
        let before = open_position(&engine).clone();

        let outcomes = feed(&mut engine, &[dec!(100.3), dec!(99.8), dec!(100)]);

        assert!(outcomes.iter().all(|o| *o == BarOutcome::Held));
        assert_eq!(open_position(&engine), &before);
    }

    #[test]
    fn test_trailing_levels_are_monotonic() {
        let closes = [
            dec!(101.2), dec!(100.9), dec!(102.5), dec!(102.0), dec!(103.1),
            dec!(104.0), dec!(103.9), dec!(105.7), dec!(105.4),
        ];

        for (side, warmup) in [
            (Side::Long, [dec!(99), dec!(100)]),
            (Side::Short, [dec!(101), dec!(100)]),
        ] {
            let mut engine = engine();
            feed(&mut engine, &warmup);
            let mut last = open_position(&engine).trailing;

            for close in closes {
                // Mirror the path around 100 for shorts
                let close = match side {
                    Side::Long => close,
                    Side::Short => dec!(200) - close,
                };
                feed(&mut engine, &[close]);
                let Some(position) = engine.position().as_open() else { break };
                match side {
                    Side::Long => {
                        assert!(position.trailing.take_profit >= last.take_profit);
                        assert!(position.trailing.stop_loss >= last.stop_loss);
                    },
                    Side::Short => {
                        assert!(position.trailing.take_profit <= last.take_profit);
                        assert!(position.trailing.stop_loss <= last.stop_loss);
                    },
                }
                last = position.trailing;
            }
        }
    }

    #[test]
    fn test_reenters_after_exit() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(99), dec!(100), dec!(99.4)]);
        assert!(engine.position().is_flat());

        // History keeps growing while open, so the next close compares to 99.4
        let outcomes = feed(&mut engine, &[dec!(99.2)]);
        assert!(matches!(&outcomes[0], BarOutcome::Entered(p) if p.side == Side::Short));
    }

    #[test]
    fn test_record_timestamp_is_bar_close_time() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(99), dec!(100)]);

        let at = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 59).unwrap();
        let outcome = engine.process_bar(&BarEvent::closed(symbol(), dec!(99), at)).unwrap();

        match outcome {
            BarOutcome::Exited { record, .. } => assert_eq!(record.closed_at, at),
            other => panic!("Expected Exited, got {:?}", other),
        }
    }

    #[test]
    fn test_unrealized_pnl() {
        let mut engine = engine();
        assert_eq!(engine.unrealized_pnl(Price::new(dec!(100)).unwrap()).unwrap(), None);

        feed(&mut engine, &[dec!(99), dec!(100)]);
        assert_eq!(
            engine.unrealized_pnl(Price::new(dec!(100.4)).unwrap()).unwrap(),
            Some(dec!(20))
        );
    }

    // =========================================================================
    // Closes outside the representable range
    // =========================================================================

    #[test]
    fn test_tiny_close_while_flat_rejects_entry_without_mutation() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(100)]);
        let before = engine.clone();

        let tiny = BarEvent::closed(symbol(), dec!(0.0000000000000000000000000001), Utc::now());
        let result = engine.process_bar(&tiny);

        assert!(matches!(result, Err(EngineError::EntryRejected(_))));
        assert_eq!(engine, before);
    }

    #[test]
    fn test_huge_close_while_flat_rejects_entry_without_mutation() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(100)]);
        let before = engine.clone();

        let huge = BarEvent::closed(symbol(), Decimal::MAX, Utc::now());
        let result = engine.process_bar(&huge);

        assert!(matches!(result, Err(EngineError::EntryRejected(_))));
        assert_eq!(engine, before);
    }

    #[test]
    fn test_huge_close_while_long_rejected_without_mutation() {
        let mut engine = engine();
        feed(&mut engine, &[dec!(99), dec!(100)]);
        let before = engine.clone();

        // Reaches the trailing TP, so the ratchet would scale it past Decimal::MAX
        let huge = BarEvent::closed(symbol(), Decimal::MAX, Utc::now());
        let result = engine.process_bar(&huge);

        assert!(matches!(result, Err(EngineError::CloseOutOfRange { .. })));
        assert_eq!(engine, before);

        // The engine keeps working afterwards
        let outcomes = feed(&mut engine, &[dec!(99.4)]);
        assert!(matches!(&outcomes[0], BarOutcome::Exited { record, .. } if record.pnl == dec!(-30)));
    }
}
