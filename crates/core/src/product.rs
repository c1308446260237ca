//! Product references as seen by the movement form.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::ProductId;

/// A product the user picked, either from the catalog or by free text.
///
/// A reference without an id is *provisional*: the service creates the
/// product as a side effect of the first movement that names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReference {
    id: Option<ProductId>,
    name: String,
}

impl ProductReference {
    /// Reference to a product the service already knows.
    pub fn existing(id: ProductId, name: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            id: Some(id),
            name: validate_name(name.into())?,
        })
    }

    /// Reference to a product that does not exist yet.
    pub fn provisional(name: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            id: None,
            name: validate_name(name.into())?,
        })
    }

    pub fn id(&self) -> Option<&ProductId> {
        self.id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the service still has to create this product.
    pub fn is_provisional(&self) -> bool {
        self.id.is_none()
    }

    /// Text shown in pickers; provisional entries read as an "add new" option.
    pub fn label(&self) -> String {
        if self.is_provisional() {
            format!("Add new: \"{}\"", self.name)
        } else {
            self.name.clone()
        }
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("product name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// One row of `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl CatalogEntry {
    /// Case-insensitive substring match on the product name.
    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }

    pub fn reference(&self) -> DomainResult<ProductReference> {
        ProductReference::existing(self.id.clone(), self.name.clone())
    }

    /// On-hand quantity, treating an unreported level as empty.
    pub fn stock_or_zero(&self) -> i64 {
        self.stock.unwrap_or(0)
    }
}
