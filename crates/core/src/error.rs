//! Errors raised by the pure stock-movement types.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures that can be detected without talking to the inventory service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. blank product name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A product identifier could not be read.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
