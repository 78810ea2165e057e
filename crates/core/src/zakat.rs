//! Zakat arithmetic: a flat 2.5 % of declared wealth.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const ZAKAT_RATE: f64 = 0.025;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ZakatError {
    #[error("wealth must be a number, got {raw:?}")]
    NotANumber { raw: String },
    #[error("wealth cannot be negative, got {provided}")]
    Negative { provided: f64 },
    #[error("wealth must be finite")]
    NotFinite,
}

/// Non-negative, finite amount of wealth.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Wealth(f64);

impl Wealth {
    /// # Errors
    ///
    /// Returns `ZakatError` for negative, NaN or infinite amounts.
    pub fn new(amount: f64) -> Result<Self, ZakatError> {
        if !amount.is_finite() {
            return Err(ZakatError::NotFinite);
        }
        if amount < 0.0 {
            return Err(ZakatError::Negative { provided: amount });
        }
        // -0.0 passes the check above; store it as +0.0
        Ok(Self(amount + 0.0))
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl FromStr for Wealth {
    type Err = ZakatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s.trim().parse::<f64>().map_err(|_| ZakatError::NotANumber {
            raw: s.to_owned(),
        })?;
        Self::new(amount)
    }
}

/// Zakat due, displayed with two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ZakatAmount(f64);

impl ZakatAmount {
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for ZakatAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[must_use]
pub fn zakat_due(wealth: Wealth) -> ZakatAmount {
    ZakatAmount(wealth.0 * ZAKAT_RATE)
}
