//! Resolving typed text to a product.

use stocklog_core::{CatalogEntry, ProductReference};

use crate::api::ApiError;

/// Incremental search over a catalog fetched once per open.
///
/// Fetch failures leave the catalog empty; typing is never blocked and any
/// non-blank query can still resolve to a provisional product.
#[derive(Debug, Clone, Default)]
pub struct ProductResolver {
    catalog: Vec<CatalogEntry>,
    loading: bool,
    selection: Option<ProductReference>,
}

impl ProductResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Install the result of `GET /api/products`.
    pub fn finish_loading(&mut self, result: Result<Vec<CatalogEntry>, ApiError>) {
        self.loading = false;
        self.catalog = match result {
            Ok(entries) => {
                let total = entries.len();
                let usable: Vec<CatalogEntry> = entries
                    .into_iter()
                    .filter(|entry| !entry.name.trim().is_empty())
                    .collect();
                if usable.len() < total {
                    tracing::warn!(
                        skipped = total - usable.len(),
                        "catalog entries without a name were skipped"
                    );
                }
                tracing::info!(products = usable.len(), "product catalog loaded");
                usable
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load product catalog; continuing with none");
                Vec::new()
            }
        };
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Hint for the search box.
    pub fn placeholder(&self) -> &'static str {
        if self.loading {
            "Loading products..."
        } else {
            "Search or add product..."
        }
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Catalog entries whose name contains `query`, ignoring case.
    ///
    /// A non-blank query with no match yields exactly one provisional
    /// "add new" reference named after the query.
    pub fn search(&self, query: &str) -> Vec<ProductReference> {
        let query = query.trim();
        let matches: Vec<ProductReference> = self
            .catalog
            .iter()
            .filter(|entry| query.is_empty() || entry.matches(query))
            .filter_map(|entry| entry.reference().ok())
            .collect();

        if matches.is_empty() && !query.is_empty() {
            return ProductReference::provisional(query).into_iter().collect();
        }
        matches
    }

    /// Commit `reference` as the current selection.
    pub fn select(&mut self, reference: ProductReference) {
        tracing::debug!(
            product = reference.name(),
            provisional = reference.is_provisional(),
            "product selected"
        );
        self.selection = Some(reference);
    }

    pub fn selection(&self) -> Option<&ProductReference> {
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}
