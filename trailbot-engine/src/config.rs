//! Strategy parameters, fixed for the lifetime of an engine.

use trailbot_domain::{BracketConfig, SizingConfig, Symbol};

use crate::error::{EngineError, EngineResult};
use crate::history::MIN_HISTORY_WINDOW;

/// Default number of closes kept for signal derivation.
pub const DEFAULT_HISTORY_WINDOW: usize = 100;

/// Everything the engine needs to trade one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Instrument traded
    pub symbol: Symbol,
    /// Capital and leverage
    pub sizing: SizingConfig,
    /// Take-profit, stop-loss and trailing fractions
    pub bracket: BracketConfig,
    /// Closes kept in the rolling history
    pub history_window: usize,
}

impl StrategyConfig {
    /// Create a validated strategy configuration.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the history window is below 2
    pub fn new(
        symbol: Symbol,
        sizing: SizingConfig,
        bracket: BracketConfig,
        history_window: usize,
    ) -> EngineResult<Self> {
        if history_window < MIN_HISTORY_WINDOW {
            return Err(EngineError::Config(format!(
                "History window must be at least {}, got {}",
                MIN_HISTORY_WINDOW, history_window
            )));
        }

        Ok(Self {
            symbol,
            sizing,
            bracket,
            history_window,
        })
    }

    /// Defaults of the reference bot for `symbol`: 1000 capital, 5x, 1% / 0.5% / 0.5%.
    pub fn with_defaults(symbol: Symbol) -> Self {
        Self {
            symbol,
            sizing: SizingConfig::default(),
            bracket: BracketConfig::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}
