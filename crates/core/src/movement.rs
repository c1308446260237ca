//! Stock movements.

use serde::{Deserialize, Serialize};

use crate::product::ProductReference;
use crate::quantity::Quantity;

/// Which way stock moves. Fixed by the action the user invoked.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request to move stock, built at submission time only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementIntent {
    pub product: ProductReference,
    pub quantity: Quantity,
    pub direction: Direction,
}

impl MovementIntent {
    pub fn new(product: ProductReference, quantity: Quantity, direction: Direction) -> Self {
        Self {
            product,
            quantity,
            direction,
        }
    }
}
