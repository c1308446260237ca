//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a product as assigned by the inventory service.
///
/// The service owns the identifier format. Some deployments hand out
/// document ids (strings), others integer keys; both are held as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("ProductId: empty"));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductId {
    Text(String),
    Number(i64),
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawProductId::deserialize(deserializer)? {
            RawProductId::Text(text) => text.parse().map_err(serde::de::Error::custom),
            RawProductId::Number(n) => Ok(Self(n.to_string())),
        }
    }
}

/// Identifier of a single submission attempt.
///
/// Never sent to the service; it only correlates the log lines of one attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Uses UUIDv7 (time-ordered) so attempts sort by start time.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
