//! Bracket and Trailing Logic (Pure Functions)
//!
//! This module contains pure functions for computing take-profit/stop-loss
//! brackets, ratcheting them as price moves favorably and evaluating exits.
//! All functions are deterministic and have no side effects.
//!
//! # Ratchet Algorithm
//!
//! The bracket only moves when the close reaches the trailing take-profit:
//! - LONG: TP = close × (1 + trail%), SL = close × (1 − sl%)
//! - SHORT: TP = close × (1 − trail%), SL = close × (1 + sl%)
//!
//! The exit check runs after the ratchet, against the moved levels, on the
//! same close.
//!
//! Level and P&L arithmetic is checked: a close too large or too small for
//! `Decimal` yields a [`DomainError`] instead of a panic.

use crate::trade::ExitReason;
use crate::value_objects::{BracketConfig, DomainError, Price, Quantity, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Take-profit and stop-loss levels of an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// Take-profit level
    pub take_profit: Price,
    /// Stop-loss level
    pub stop_loss: Price,
}

/// Compute the initial bracket for an entry
///
/// # Examples
///
/// ```
/// # use trailbot_domain::trailing::initial_bracket;
/// # use trailbot_domain::value_objects::{BracketConfig, Price, Side};
/// # use rust_decimal_macros::dec;
/// let config = BracketConfig::new(dec!(0.01), dec!(0.005), dec!(0.005)).unwrap();
/// let entry = Price::new(dec!(100)).unwrap();
///
/// let long = initial_bracket(Side::Long, entry, &config).unwrap();
/// assert_eq!(long.take_profit.as_decimal(), dec!(101));
/// assert_eq!(long.stop_loss.as_decimal(), dec!(99.5));
///
/// let short = initial_bracket(Side::Short, entry, &config).unwrap();
/// assert_eq!(short.take_profit.as_decimal(), dec!(99));
/// assert_eq!(short.stop_loss.as_decimal(), dec!(100.5));
/// ```
pub fn initial_bracket(
    side: Side,
    entry: Price,
    config: &BracketConfig,
) -> Result<Bracket, DomainError> {
    let tp = config.take_profit_pct();
    let sl = config.stop_loss_pct();

    let bracket = match side {
        Side::Long => Bracket {
            take_profit: entry.scaled(Decimal::ONE + tp)?,
            stop_loss: entry.scaled(Decimal::ONE - sl)?,
        },
        Side::Short => Bracket {
            take_profit: entry.scaled(Decimal::ONE - tp)?,
            stop_loss: entry.scaled(Decimal::ONE + sl)?,
        },
    };
    Ok(bracket)
}

/// Ratchet the trailing bracket for a new close
///
/// # Returns
///
/// * `Ok(Some(Bracket))` - When the close reached the trailing take-profit
/// * `Ok(None)` - When the bracket stays where it is
/// * `Err(DomainError)` - When the moved levels are not representable
///
/// # Examples
///
/// ```
/// # use trailbot_domain::trailing::{ratchet_bracket, Bracket};
/// # use trailbot_domain::value_objects::{BracketConfig, Price, Side};
/// # use rust_decimal_macros::dec;
/// let config = BracketConfig::new(dec!(0.01), dec!(0.005), dec!(0.005)).unwrap();
/// let current = Bracket {
///     take_profit: Price::new(dec!(102.01)).unwrap(),
///     stop_loss: Price::new(dec!(100.495)).unwrap(),
/// };
///
/// // Close jumps to 105: TP and SL both move up
/// let moved = ratchet_bracket(Side::Long, Price::new(dec!(105)).unwrap(), &current, &config)
///     .unwrap()
///     .unwrap();
/// assert_eq!(moved.take_profit.as_decimal(), dec!(105.525));
/// assert_eq!(moved.stop_loss.as_decimal(), dec!(104.475));
///
/// // Close below the trailing TP: no move
/// assert!(ratchet_bracket(Side::Long, Price::new(dec!(102)).unwrap(), &current, &config)
///     .unwrap()
///     .is_none());
/// ```
pub fn ratchet_bracket(
    side: Side,
    close: Price,
    current: &Bracket,
    config: &BracketConfig,
) -> Result<Option<Bracket>, DomainError> {
    let trail = config.trailing_pct();
    let sl = config.stop_loss_pct();

    let moved = match side {
        Side::Long if close >= current.take_profit => Some(Bracket {
            take_profit: close.scaled(Decimal::ONE + trail)?,
            stop_loss: close.scaled(Decimal::ONE - sl)?,
        }),
        Side::Short if close <= current.take_profit => Some(Bracket {
            take_profit: close.scaled(Decimal::ONE - trail)?,
            stop_loss: close.scaled(Decimal::ONE + sl)?,
        }),
        _ => None,
    };
    Ok(moved)
}

/// Check whether a close exits the position
///
/// Take-profit is checked before stop-loss; at most one reason is returned.
///
/// # Examples
///
/// ```
/// # use trailbot_domain::trailing::{evaluate_exit, Bracket};
/// # use trailbot_domain::value_objects::{Price, Side};
/// # use trailbot_domain::ExitReason;
/// # use rust_decimal_macros::dec;
/// let levels = Bracket {
///     take_profit: Price::new(dec!(101)).unwrap(),
///     stop_loss: Price::new(dec!(99.5)).unwrap(),
/// };
///
/// assert_eq!(evaluate_exit(Side::Long, Price::new(dec!(101)).unwrap(), &levels),
///     Some(ExitReason::TakeProfit));
/// assert_eq!(evaluate_exit(Side::Long, Price::new(dec!(99.5)).unwrap(), &levels),
///     Some(ExitReason::StopLoss));
/// assert_eq!(evaluate_exit(Side::Long, Price::new(dec!(100)).unwrap(), &levels), None);
/// ```
pub fn evaluate_exit(side: Side, close: Price, levels: &Bracket) -> Option<ExitReason> {
    match side {
        Side::Long => {
            if close >= levels.take_profit {
                Some(ExitReason::TakeProfit)
            } else if close <= levels.stop_loss {
                Some(ExitReason::StopLoss)
            } else {
                None
            }
        },
        Side::Short => {
            if close <= levels.take_profit {
                Some(ExitReason::TakeProfit)
            } else if close >= levels.stop_loss {
                Some(ExitReason::StopLoss)
            } else {
                None
            }
        },
    }
}

/// Profit or loss of closing `quantity` at `exit` after entering at `entry`
///
/// # Errors
/// Returns `DomainError::ArithmeticOverflow` if the result does not fit a `Decimal`
pub fn realized_pnl(
    side: Side,
    entry: Price,
    exit: Price,
    quantity: Quantity,
) -> Result<Decimal, DomainError> {
    let move_per_unit = match side {
        Side::Long => exit.as_decimal() - entry.as_decimal(),
        Side::Short => entry.as_decimal() - exit.as_decimal(),
    };
    move_per_unit.checked_mul(quantity.as_decimal()).ok_or_else(|| {
        DomainError::ArithmeticOverflow(format!("pnl {} × {}", move_per_unit, quantity))
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn price(value: Decimal) -> Price {
        Price::new(value).unwrap()
    }

    fn config() -> BracketConfig {
        BracketConfig::new(dec!(0.01), dec!(0.005), dec!(0.005)).unwrap()
    }

    // =========================================================================
    // LONG Position Tests
    // =========================================================================

    #[test]
    fn test_long_ratchet_fires_exactly_at_take_profit() {
        let current = initial_bracket(Side::Long, price(dec!(100)), &config()).unwrap();

        let moved = ratchet_bracket(Side::Long, price(dec!(101)), &current, &config()).unwrap().unwrap();

        assert_eq!(moved.take_profit.as_decimal(), dec!(101.505));
        assert_eq!(moved.stop_loss.as_decimal(), dec!(100.495));
    }

    #[test]
    fn test_long_ratchet_sequence_is_monotonic() {
        let mut current = initial_bracket(Side::Long, price(dec!(100)), &config()).unwrap();
        let closes = [dec!(101), dec!(101.2), dec!(102), dec!(101.9), dec!(103), dec!(110)];

        for close in closes {
            if let Some(moved) = ratchet_bracket(Side::Long, price(close), &current, &config()).unwrap() {
                assert!(moved.take_profit > current.take_profit);
                assert!(moved.stop_loss >= current.stop_loss);
                current = moved;
            }
        }

        assert_eq!(current.take_profit.as_decimal(), dec!(110.55));
        assert_eq!(current.stop_loss.as_decimal(), dec!(109.45));
    }

    #[test]
    fn test_long_no_ratchet_below_take_profit() {
        let current = initial_bracket(Side::Long, price(dec!(100)), &config()).unwrap();
        assert!(ratchet_bracket(Side::Long, price(dec!(100.99)), &current, &config()).unwrap().is_none());
        assert!(ratchet_bracket(Side::Long, price(dec!(90)), &current, &config()).unwrap().is_none());
    }

    #[test]
    fn test_long_exit_regions() {
        let levels = initial_bracket(Side::Long, price(dec!(100)), &config()).unwrap();

        assert_eq!(evaluate_exit(Side::Long, price(dec!(102)), &levels), Some(ExitReason::TakeProfit));
        assert_eq!(evaluate_exit(Side::Long, price(dec!(99.4)), &levels), Some(ExitReason::StopLoss));
        assert_eq!(evaluate_exit(Side::Long, price(dec!(100.5)), &levels), None);
    }

    // =========================================================================
    // SHORT Position Tests
    // =========================================================================

    #[test]
    fn test_short_ratchet_moves_levels_down() {
        let current = initial_bracket(Side::Short, price(dec!(100)), &config()).unwrap();

        let moved = ratchet_bracket(Side::Short, price(dec!(98)), &current, &config()).unwrap().unwrap();

        assert_eq!(moved.take_profit.as_decimal(), dec!(97.51));
        assert_eq!(moved.stop_loss.as_decimal(), dec!(98.49));
        assert!(moved.take_profit < current.take_profit);
        assert!(moved.stop_loss < current.stop_loss);
    }

    #[test]
    fn test_short_no_ratchet_above_take_profit() {
        let current = initial_bracket(Side::Short, price(dec!(100)), &config()).unwrap();
        assert!(ratchet_bracket(Side::Short, price(dec!(99.01)), &current, &config()).unwrap().is_none());
    }

    #[test]
    fn test_short_exit_regions() {
        let levels = initial_bracket(Side::Short, price(dec!(100)), &config()).unwrap();

        assert_eq!(evaluate_exit(Side::Short, price(dec!(99)), &levels), Some(ExitReason::TakeProfit));
        assert_eq!(evaluate_exit(Side::Short, price(dec!(100.5)), &levels), Some(ExitReason::StopLoss));
        assert_eq!(evaluate_exit(Side::Short, price(dec!(99.7)), &levels), None);
    }

    // =========================================================================
    // PnL
    // =========================================================================

    #[test]
    fn test_realized_pnl_signs() {
        let qty = Quantity::new(dec!(50)).unwrap();

        assert_eq!(realized_pnl(Side::Long, price(dec!(100)), price(dec!(99.4)), qty).unwrap(), dec!(-30));
        assert_eq!(realized_pnl(Side::Long, price(dec!(100)), price(dec!(102)), qty).unwrap(), dec!(100));
        assert_eq!(realized_pnl(Side::Short, price(dec!(100)), price(dec!(99)), qty).unwrap(), dec!(50));
        assert_eq!(realized_pnl(Side::Short, price(dec!(100)), price(dec!(100.5)), qty).unwrap(), dec!(-25));
    }

    #[test]
    fn test_realized_pnl_overflow_is_an_error() {
        let qty = Quantity::new(dec!(50)).unwrap();
        let result = realized_pnl(Side::Long, price(dec!(1)), price(Decimal::MAX), qty);
        assert!(matches!(result, Err(DomainError::ArithmeticOverflow(_))));
    }

    // =========================================================================
    // Unrepresentable levels
    // =========================================================================

    #[test]
    fn test_ratchet_on_huge_close_is_an_error() {
        let current = initial_bracket(Side::Long, price(dec!(100)), &config()).unwrap();

        let result = ratchet_bracket(Side::Long, price(Decimal::MAX), &current, &config());

        assert!(matches!(result, Err(DomainError::ArithmeticOverflow(_))));
    }

    #[test]
    fn test_initial_bracket_on_huge_entry_is_an_error() {
        assert!(initial_bracket(Side::Short, price(Decimal::MAX), &config()).is_err());
        assert!(initial_bracket(Side::Long, price(Decimal::MAX), &config()).is_err());
    }
}
