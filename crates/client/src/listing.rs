//! Current stock levels, re-read whenever a movement lands.

use std::sync::Arc;

use stocklog_core::CatalogEntry;
use tokio::sync::{Mutex, watch};

use crate::api::{ApiError, InventoryService};

/// At or below this many units a product counts as running low.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockLevel {
    Empty,
    Low,
    Healthy,
}

impl StockLevel {
    pub fn classify(stock: i64) -> Self {
        if stock <= 0 {
            StockLevel::Empty
        } else if stock <= LOW_STOCK_THRESHOLD {
            StockLevel::Low
        } else {
            StockLevel::Healthy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockLevel::Empty => "Out of Stock",
            StockLevel::Low => "Low Level",
            StockLevel::Healthy => "In Stock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRow {
    pub name: String,
    pub category: String,
    pub stock: i64,
    pub level: StockLevel,
}

impl From<&CatalogEntry> for StockRow {
    fn from(entry: &CatalogEntry) -> Self {
        let stock = entry.stock_or_zero();
        Self {
            name: entry.name.clone(),
            category: entry
                .category
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "Uncategorized".to_string()),
            stock,
            level: StockLevel::classify(stock),
        }
    }
}

#[derive(Debug, Default)]
pub struct InventoryListing {
    entries: Vec<CatalogEntry>,
    loading: bool,
    last_error: Option<ApiError>,
}

impl InventoryListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read the whole product list. On failure the previous rows stay.
    pub async fn reload(&mut self, service: &dyn InventoryService) -> Result<usize, ApiError> {
        self.begin_reload();
        let result = service.list_products().await;
        self.finish_reload(result)
    }

    pub fn begin_reload(&mut self) {
        self.loading = true;
    }

    /// Install the result of a product fetch started with `begin_reload`.
    pub fn finish_reload(
        &mut self,
        result: Result<Vec<CatalogEntry>, ApiError>,
    ) -> Result<usize, ApiError> {
        self.loading = false;
        match result {
            Ok(entries) => {
                self.entries = entries;
                self.last_error = None;
                tracing::debug!(products = self.entries.len(), "inventory listing reloaded");
                Ok(self.entries.len())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to reload inventory listing; keeping previous rows");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// Rows whose name contains `term`, ignoring case.
    pub fn rows(&self, term: &str) -> Vec<StockRow> {
        let term = term.trim();
        self.entries
            .iter()
            .filter(|entry| term.is_empty() || entry.matches(term))
            .map(StockRow::from)
            .collect()
    }
}

/// Reload a shared listing without holding its lock during the fetch, so
/// readers can see `is_loading` while the request is out.
pub async fn reload_shared(
    listing: &Mutex<InventoryListing>,
    service: &dyn InventoryService,
) -> Result<usize, ApiError> {
    listing.lock().await.begin_reload();
    let result = service.list_products().await;
    listing.lock().await.finish_reload(result)
}

/// Reload `listing` every time the refresh signal moves.
///
/// Returns once every sender of the signal is gone.
pub async fn follow(
    listing: Arc<Mutex<InventoryListing>>,
    service: Arc<dyn InventoryService>,
    mut refresh: watch::Receiver<u64>,
) {
    while refresh.changed().await.is_ok() {
        let generation = *refresh.borrow_and_update();
        if let Ok(products) = reload_shared(&listing, service.as_ref()).await {
            tracing::debug!(generation, products, "listing followed refresh");
        }
    }
    tracing::debug!("refresh signal closed; listing no longer follows");
}
