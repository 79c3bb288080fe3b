//! # Product Catalog
//!
//! Lookup boundary of the external product catalog. The shopping list generator
//! resolves every product id of a diet with a single `find_all_by_ids` call.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::ingredient_model::CatalogProduct;

/// External product catalog
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch the products with the given ids; unknown ids are left out
    async fn find_all_by_ids(&self, ids: &HashSet<String>) -> Result<Vec<CatalogProduct>, CatalogError>;
}

/// Catalog held in memory, optionally loaded from a JSON array of products
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: HashMap<String, CatalogProduct>,
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryProductCatalog {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect(),
            lookups: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Load the catalog from a JSON file; a missing file gives an empty catalog
    pub async fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No product catalog file, using an empty catalog");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let products: Vec<CatalogProduct> = serde_json::from_str(&content)?;
        info!(path = %path.display(), products = products.len(), "Loaded product catalog");
        Ok(Self::new(products))
    }

    /// Make lookups fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `find_all_by_ids` calls served
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_all_by_ids(&self, ids: &HashSet<String>) -> Result<Vec<CatalogProduct>, CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("product catalog is offline".to_string()));
        }
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let found: Vec<CatalogProduct> = ids
            .iter()
            .filter_map(|id| self.products.get(id).cloned())
            .collect();
        debug!(requested = ids.len(), found = found.len(), "Product lookup");
        Ok(found)
    }
}
