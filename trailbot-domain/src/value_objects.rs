//! Value Objects for the trailbot domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places used for simulated position quantities.
pub const QUANTITY_DECIMALS: u32 = 4;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Price must be positive
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Symbol must be valid trading pair
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// SizingConfig validation error
    #[error("Invalid sizing config: {0}")]
    InvalidSizingConfig(String),

    /// BracketConfig validation error
    #[error("Invalid bracket config: {0}")]
    InvalidBracketConfig(String),

    /// Position sizing error
    #[error("Position sizing error: {0}")]
    PositionSizingError(String),

    /// Decimal arithmetic left the representable range
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
}

// =============================================================================
// Price
// =============================================================================

/// Price represents a positive decimal price
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(format!("Price must be positive, got {}", value)));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Scale the price by `factor`.
    ///
    /// # Errors
    /// Returns `DomainError::ArithmeticOverflow` if the product does not fit a
    /// `Decimal`, and `DomainError::InvalidPrice` if it underflows to zero
    pub(crate) fn scaled(&self, factor: Decimal) -> Result<Self, DomainError> {
        let value = self.0.checked_mul(factor).ok_or_else(|| {
            DomainError::ArithmeticOverflow(format!("{} × {}", self.0, factor))
        })?;
        Self::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// Quantity represents a positive decimal quantity
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a new Quantity with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidQuantity("Quantity must be positive".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Symbol
// =============================================================================

/// Symbol represents a trading pair (e.g., SOLUSDT)
///
/// # Invariants
/// - Must be valid format (base + quote)
/// - Base and quote must be non-empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    base: String,
    quote: String,
}

impl Symbol {
    /// Create a Symbol from a trading pair string (case-insensitive)
    ///
    /// # Examples
    /// ```
    /// # use trailbot_domain::value_objects::Symbol;
    /// let symbol = Symbol::from_pair("solusdt").unwrap();
    /// assert_eq!(symbol.base(), "SOL");
    /// assert_eq!(symbol.quote(), "USDT");
    /// ```
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSymbol` if format is invalid
    pub fn from_pair(pair: &str) -> Result<Self, DomainError> {
        // Common quote currencies (extend as needed)
        const QUOTE_CURRENCIES: &[&str] = &["USDT", "USDC", "BUSD", "BTC", "ETH", "BNB"];

        let pair = pair.trim().to_uppercase();
        for quote in QUOTE_CURRENCIES {
            if let Some(base) = pair.strip_suffix(quote) {
                if !base.is_empty() {
                    return Ok(Self {
                        base: base.to_string(),
                        quote: quote.to_string(),
                    });
                }
            }
        }

        Err(DomainError::InvalidSymbol(format!("Cannot parse trading pair: {}", pair)))
    }

    /// Get the base currency
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Get the quote currency
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Get the trading pair as string (e.g., "SOLUSDT")
    pub fn as_pair(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_pair())
    }
}

// =============================================================================
// Side
// =============================================================================

/// Side represents the position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Long position (buy low, sell high)
    Long,
    /// Short position (sell high, buy low)
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

// =============================================================================
// SizingConfig
// =============================================================================

/// Capital and leverage used to size simulated positions
///
/// ```text
/// Quantity = round((Capital × Leverage) / Entry Price, 4)
/// ```
///
/// # Example
///
/// ```
/// # use trailbot_domain::value_objects::{Price, SizingConfig};
/// # use rust_decimal_macros::dec;
/// let config = SizingConfig::new(dec!(1000), dec!(5)).unwrap();
/// let qty = config.position_size(Price::new(dec!(200)).unwrap()).unwrap();
/// assert_eq!(qty.as_decimal(), dec!(25));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Capital in quote currency (e.g., USDT)
    capital: Decimal,
    /// Leverage multiplier (e.g., 5 = 5x)
    leverage: Decimal,
}

impl SizingConfig {
    /// Create a new SizingConfig with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSizingConfig` if capital or leverage is not positive
    pub fn new(capital: Decimal, leverage: Decimal) -> Result<Self, DomainError> {
        if capital <= Decimal::ZERO {
            return Err(DomainError::InvalidSizingConfig("Capital must be positive".to_string()));
        }

        if leverage <= Decimal::ZERO {
            return Err(DomainError::InvalidSizingConfig("Leverage must be positive".to_string()));
        }

        Ok(Self { capital, leverage })
    }

    /// Get capital
    pub fn capital(&self) -> Decimal {
        self.capital
    }

    /// Get leverage
    pub fn leverage(&self) -> Decimal {
        self.leverage
    }

    /// Notional exposure: Capital × Leverage
    ///
    /// # Errors
    /// Returns `DomainError::ArithmeticOverflow` if the product does not fit a `Decimal`
    pub fn notional(&self) -> Result<Decimal, DomainError> {
        self.capital.checked_mul(self.leverage).ok_or_else(|| {
            DomainError::ArithmeticOverflow(format!(
                "notional {} × {}",
                self.capital, self.leverage
            ))
        })
    }

    /// Calculate the simulated quantity for an entry at `entry_price`.
    ///
    /// Rounded to [`QUANTITY_DECIMALS`] places (half to even).
    ///
    /// # Errors
    /// Returns `DomainError::PositionSizingError` if the quantity rounds to zero,
    /// and `DomainError::ArithmeticOverflow` if the division overflows
    pub fn position_size(&self, entry_price: Price) -> Result<Quantity, DomainError> {
        let notional = self.notional()?;
        let raw = notional.checked_div(entry_price.as_decimal()).ok_or_else(|| {
            DomainError::ArithmeticOverflow(format!(
                "quantity {} / {}",
                notional, entry_price
            ))
        })?;
        let rounded = raw.round_dp(QUANTITY_DECIMALS);

        Quantity::new(rounded).map_err(|_| {
            DomainError::PositionSizingError(format!(
                "Quantity rounds to zero at entry price {} (notional {})",
                entry_price, notional
            ))
        })
    }
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            capital: Decimal::from(1000),
            leverage: Decimal::from(5),
        }
    }
}

impl fmt::Display for SizingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SizingConfig {{ capital: {}, leverage: {}x }}", self.capital, self.leverage)
    }
}

// =============================================================================
// BracketConfig
// =============================================================================

/// Take-profit, stop-loss and trailing distances as fractions of price
///
/// `0.01` means 1%.
///
/// # Invariants
/// - Take-profit and stop-loss fractions lie strictly between 0 and 1
/// - Trailing fraction lies in [0, 1); with 0 the take-profit fires on the
///   first close that reaches it, otherwise the ratchet keeps lifting it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketConfig {
    take_profit_pct: Decimal,
    stop_loss_pct: Decimal,
    trailing_pct: Decimal,
}

impl BracketConfig {
    /// Create a new BracketConfig with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidBracketConfig` if a fraction is out of range
    pub fn new(
        take_profit_pct: Decimal,
        stop_loss_pct: Decimal,
        trailing_pct: Decimal,
    ) -> Result<Self, DomainError> {
        for (name, value) in [("take profit", take_profit_pct), ("stop loss", stop_loss_pct)] {
            if value <= Decimal::ZERO || value >= Decimal::ONE {
                return Err(DomainError::InvalidBracketConfig(format!(
                    "{} fraction must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        if trailing_pct < Decimal::ZERO || trailing_pct >= Decimal::ONE {
            return Err(DomainError::InvalidBracketConfig(format!(
                "trailing fraction must be in [0, 1), got {}",
                trailing_pct
            )));
        }

        Ok(Self {
            take_profit_pct,
            stop_loss_pct,
            trailing_pct,
        })
    }

    /// Initial take-profit distance
    pub fn take_profit_pct(&self) -> Decimal {
        self.take_profit_pct
    }

    /// Stop-loss distance (initial and trailing)
    pub fn stop_loss_pct(&self) -> Decimal {
        self.stop_loss_pct
    }

    /// Trailing take-profit distance
    pub fn trailing_pct(&self) -> Decimal {
        self.trailing_pct
    }
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            take_profit_pct: Decimal::new(1, 2), // 1%
            stop_loss_pct: Decimal::new(5, 3),   // 0.5%
            trailing_pct: Decimal::new(5, 3),    // 0.5%
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
