//! Movement quantities.
//!
//! The form keeps quantities as raw text; this module is the one place that
//! turns that text into a number.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A strictly positive number of units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity is required")]
    Empty,
    #[error("quantity must be a whole number, got {0:?}")]
    NotANumber(String),
    #[error("quantity must be greater than zero, got {0}")]
    NotPositive(i64),
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            return Err(QuantityError::NotPositive(0));
        }
        Ok(Self(value))
    }

    /// Parse and validate raw field text.
    ///
    /// Surrounding whitespace is ignored; anything else that is not a whole
    /// number in `1..=u32::MAX` is rejected. Decimals and trailing junk are
    /// not truncated: "2.5" and "5abc" fail rather than becoming 2 and 5.
    pub fn parse(raw: &str) -> Result<Self, QuantityError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuantityError::Empty);
        }
        let value: i64 = trimmed
            .parse()
            .map_err(|_| QuantityError::NotANumber(trimmed.to_string()))?;
        Self::from_i64(value)
    }

    /// Step the raw text by `delta`, always landing on a valid quantity.
    ///
    /// Unparsable text counts as 0 and the result never drops below 1.
    pub fn adjusted(raw: &str, delta: i64) -> Self {
        let current = raw.trim().parse::<i64>().unwrap_or(0);
        let next = current.saturating_add(delta).clamp(1, i64::from(u32::MAX));
        // Clamped into range above.
        Self(next as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn from_i64(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge(value))
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Shortcut buttons next to the quantity field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Preset {
    Five,
    Ten,
    Twenty,
    Fifty,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Five, Preset::Ten, Preset::Twenty, Preset::Fifty];

    pub fn quantity(self) -> Quantity {
        Quantity(match self {
            Preset::Five => 5,
            Preset::Ten => 10,
            Preset::Twenty => 20,
            Preset::Fifty => 50,
        })
    }

    pub fn from_value(value: u32) -> Option<Preset> {
        Self::ALL.into_iter().find(|p| p.quantity().get() == value)
    }
}
