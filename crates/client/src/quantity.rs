//! The quantity field.

use stocklog_core::{Preset, Quantity, QuantityError};

/// Holds the quantity exactly as typed.
///
/// Text is kept raw so the field can be empty or half-typed; numeric
/// validation happens at submission via [`Quantity::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityEditor {
    raw: String,
}

impl QuantityEditor {
    pub const INITIAL: &'static str = "1";

    pub fn new() -> Self {
        Self {
            raw: Self::INITIAL.to_string(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Accept any text; nothing is validated here.
    pub fn set_raw(&mut self, text: impl Into<String>) {
        self.raw = text.into();
    }

    /// Step the current value by `delta`. Always leaves a valid quantity.
    pub fn adjust(&mut self, delta: i64) -> Quantity {
        let next = Quantity::adjusted(&self.raw, delta);
        self.raw = next.to_string();
        next
    }

    pub fn set_preset(&mut self, preset: Preset) {
        self.raw = preset.quantity().to_string();
    }

    pub fn parse(&self) -> Result<Quantity, QuantityError> {
        Quantity::parse(&self.raw)
    }

    pub fn reset(&mut self) {
        self.raw = Self::INITIAL.to_string();
    }
}

impl Default for QuantityEditor {
    fn default() -> Self {
        Self::new()
    }
}
