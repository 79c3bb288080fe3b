//! # Configuration Module
//!
//! Configuration structures for the categorizer, the category store and the
//! shopping list generator. Every value has a default; `AppConfig::from_env`
//! applies overrides from the environment (after `.env` has been loaded).

use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

// Constants for matching and persistence
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const MIN_SIMILARITY_LENGTH: usize = 3;
pub const DEFAULT_SAVE_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CATEGORY: &str = "other";
pub const DEFAULT_CATEGORY_STORE_PATH: &str = "./data/learned_products.json";
pub const DEFAULT_PRODUCT_CATALOG_PATH: &str = "./data/products.json";

/// Matching configuration for the product categorizer
#[derive(Debug, Clone)]
pub struct CategorizerConfig {
    /// Minimum normalized similarity for a fuzzy match
    pub similarity_threshold: f64,
    /// Names shorter than this never match fuzzily
    pub min_similarity_length: usize,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_similarity_length: MIN_SIMILARITY_LENGTH,
        }
    }
}

/// Persistence configuration for the learned category store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of records written per batch
    pub save_chunk_size: usize,
    /// Location of the JSON file backing the learned catalog
    pub category_store_path: PathBuf,
    /// Location of the JSON product catalog
    pub product_catalog_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_chunk_size: DEFAULT_SAVE_CHUNK_SIZE,
            category_store_path: PathBuf::from(DEFAULT_CATEGORY_STORE_PATH),
            product_catalog_path: PathBuf::from(DEFAULT_PRODUCT_CATALOG_PATH),
        }
    }
}

/// Configuration for shopping list generation
#[derive(Debug, Clone)]
pub struct ShoppingListConfig {
    /// Category bucket for items without a category
    pub default_category: String,
}

impl Default for ShoppingListConfig {
    fn default() -> Self {
        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub categorizer: CategorizerConfig,
    pub store: StoreConfig,
    pub shopping_list: ShoppingListConfig,
}

impl AppConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(threshold) = parse_var::<f64, _>(&lookup, "PANTRY_SIMILARITY_THRESHOLD") {
            if (0.0..=1.0).contains(&threshold) {
                config.categorizer.similarity_threshold = threshold;
            } else {
                warn!("Ignoring PANTRY_SIMILARITY_THRESHOLD={threshold}: must be within 0..=1");
            }
        }

        if let Some(chunk_size) = parse_var::<usize, _>(&lookup, "PANTRY_SAVE_CHUNK_SIZE") {
            if chunk_size > 0 {
                config.store.save_chunk_size = chunk_size;
            } else {
                warn!("Ignoring PANTRY_SAVE_CHUNK_SIZE=0");
            }
        }

        if let Some(path) = lookup("PANTRY_CATEGORY_STORE") {
            config.store.category_store_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PANTRY_PRODUCT_CATALOG") {
            config.store.product_catalog_path = PathBuf::from(path);
        }

        if let Some(category) = lookup("PANTRY_DEFAULT_CATEGORY") {
            let category = category.trim();
            if !category.is_empty() {
                config.shopping_list.default_category = category.to_string();
            }
        }

        config
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {key}={raw}: not a valid value");
            None
        }
    }
}
