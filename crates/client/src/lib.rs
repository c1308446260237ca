//! `stocklog-client`
//!
//! **Responsibility:** record stock movements against the remote inventory
//! service and show current stock levels.
//!
//! This crate provides:
//! - An HTTP client for the inventory service (`api`)
//! - The movement form: product resolution, quantity editing, and the
//!   single-flight submission workflow (`form`, `resolver`, `quantity`,
//!   `submitter`)
//! - Self-expiring success/error notices (`notice`) and the refresh signal
//!   that tells the stock listing to re-read (`refresh`, `listing`)
//! - The login gate (`session`)
//!
//! The service is the source of truth; the client never writes offline.

pub mod api;
pub mod cli;
pub mod config;
pub mod form;
pub mod listing;
pub mod notice;
pub mod quantity;
pub mod refresh;
pub mod resolver;
pub mod session;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, HttpInventoryService, InventoryService, MovementRequest};
pub use config::{ClientConfig, ConfigError, NoticeTimings};
pub use form::MovementForm;
pub use listing::{InventoryListing, StockLevel};
pub use notice::{NoticeKind, TransientNotice, TransientStatus};
pub use quantity::QuantityEditor;
pub use refresh::RefreshSignal;
pub use resolver::ProductResolver;
pub use session::{FileTokenStore, MemoryTokenStore, Session, SessionError, SessionState, TokenStore};
pub use submitter::{SubmissionOutcome, SubmitterState};
