//! Two-close momentum signal.
//!
//! The signal compares the latest close with the one before it:
//! - **Long**: latest close strictly above the previous close
//! - **Short**: latest close strictly below the previous close
//! - **None**: equal closes, or fewer than two closes observed
//!
//! Older history never influences the result.

use trailbot_domain::{Price, Side};

use crate::error::EngineResult;
use crate::history::PriceHistory;

/// Direction implied by two consecutive closes.
pub fn momentum_signal(previous: Price, latest: Price) -> Option<Side> {
    if latest > previous {
        Some(Side::Long)
    } else if latest < previous {
        Some(Side::Short)
    } else {
        None
    }
}

/// Rolling close history with signal derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalGenerator {
    history: PriceHistory,
}

impl SignalGenerator {
    /// Create a generator keeping at most `window` closes.
    pub fn new(window: usize) -> EngineResult<Self> {
        Ok(Self {
            history: PriceHistory::new(window)?,
        })
    }

    /// Record a close.
    pub fn observe(&mut self, close: Price) {
        self.history.push(close);
    }

    /// Signal for the closes observed so far.
    pub fn signal(&self) -> Option<Side> {
        match (self.history.previous(), self.history.latest()) {
            (Some(previous), Some(latest)) => momentum_signal(previous, latest),
            _ => None,
        }
    }

    /// Signal that [`signal`](Self::signal) would return after observing `close`.
    ///
    /// Lets the caller validate an entry before mutating the history.
    pub fn signal_after(&self, close: Price) -> Option<Side> {
        self.history
            .latest()
            .and_then(|latest| momentum_signal(latest, close))
    }

    /// Observed closes.
    pub fn history(&self) -> &PriceHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn price(value: Decimal) -> Price {
        Price::new(value).unwrap()
    }

    fn generator_with(closes: &[Decimal]) -> SignalGenerator {
        let mut generator = SignalGenerator::new(100).unwrap();
        for close in closes {
            generator.observe(price(*close));
        }
        generator
    }

    #[test]
    fn test_no_signal_before_two_closes() {
        assert_eq!(generator_with(&[]).signal(), None);
        assert_eq!(generator_with(&[dec!(100)]).signal(), None);
    }

    #[test]
    fn test_direction_from_last_two_closes() {
        assert_eq!(generator_with(&[dec!(100), dec!(101)]).signal(), Some(Side::Long));
        assert_eq!(generator_with(&[dec!(100), dec!(99.99)]).signal(), Some(Side::Short));
        assert_eq!(generator_with(&[dec!(100), dec!(100.00)]).signal(), None);
    }

    #[test]
    fn test_older_history_does_not_change_signal() {
        let tails = [
            [dec!(100), dec!(101)],
            [dec!(101), dec!(100)],
            [dec!(50), dec!(50)],
        ];
        let prefixes: [&[Decimal]; 3] = [
            &[],
            &[dec!(1000), dec!(1), dec!(500)],
            &[dec!(101), dec!(101), dec!(101), dec!(99)],
        ];

        for tail in tails {
            let expected = generator_with(&tail).signal();
            for prefix in prefixes {
                let mut closes = prefix.to_vec();
                closes.extend_from_slice(&tail);
                assert_eq!(generator_with(&closes).signal(), expected);
            }
        }
    }

    #[test]
    fn test_signal_after_matches_signal_once_observed() {
        let mut generator = generator_with(&[dec!(100)]);
        for close in [dec!(101), dec!(101), dec!(99), dec!(99.5)] {
            let preview = generator.signal_after(price(close));
            generator.observe(price(close));
            assert_eq!(preview, generator.signal());
        }
    }

    #[test]
    fn test_signal_with_minimum_window() {
        let mut generator = SignalGenerator::new(2).unwrap();
        for close in [dec!(10), dec!(20), dec!(15)] {
            generator.observe(price(close));
        }

        assert_eq!(generator.history().len(), 2);
        assert_eq!(generator.signal(), Some(Side::Short));
    }
}
