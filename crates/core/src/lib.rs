//! `stocklog-core`: domain building blocks for recording stock movements.
//!
//! This crate contains **pure domain** primitives (no IO, no async). The
//! client crate drives these types against the remote inventory service.

pub mod error;
pub mod id;
pub mod movement;
pub mod product;
pub mod quantity;

pub use error::{DomainError, DomainResult};
pub use id::{ProductId, SubmissionId};
pub use movement::{Direction, MovementIntent};
pub use product::{CatalogEntry, ProductReference};
pub use quantity::{Preset, Quantity, QuantityError};
