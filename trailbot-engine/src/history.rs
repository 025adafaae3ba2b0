//! Bounded rolling window of closing prices.

use std::collections::VecDeque;

use trailbot_domain::Price;

use crate::error::{EngineError, EngineResult};

/// Smallest window that can produce a signal.
pub const MIN_HISTORY_WINDOW: usize = 2;

/// Chronological closing prices, oldest first.
///
/// # Invariants
/// - `len() <= capacity()`
/// - Once full, each push evicts the oldest price
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    prices: VecDeque<Price>,
    capacity: usize,
}

impl PriceHistory {
    /// Create an empty history holding at most `capacity` prices.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if `capacity < 2`
    pub fn new(capacity: usize) -> EngineResult<Self> {
        if capacity < MIN_HISTORY_WINDOW {
            return Err(EngineError::Config(format!(
                "History window must be at least {}, got {}",
                MIN_HISTORY_WINDOW, capacity
            )));
        }

        Ok(Self {
            prices: VecDeque::with_capacity(capacity + 1),
            capacity,
        })
    }

    /// Append a close, evicting the oldest one if the window is exceeded.
    pub fn push(&mut self, price: Price) {
        self.prices.push_back(price);
        while self.prices.len() > self.capacity {
            self.prices.pop_front();
        }
    }

    /// Most recent close.
    pub fn latest(&self) -> Option<Price> {
        self.prices.back().copied()
    }

    /// Close before the most recent one.
    pub fn previous(&self) -> Option<Price> {
        let len = self.prices.len();
        if len < 2 {
            return None;
        }
        self.prices.get(len - 2).copied()
    }

    /// Number of stored closes.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no close has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Maximum number of stored closes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate closes oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Price> {
        self.prices.iter()
    }
}
