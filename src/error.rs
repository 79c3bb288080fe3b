//! # Error Types Module
//!
//! Errors raised by the two external collaborators: the learned category store and
//! the product catalog. Parsing and detection never fail, so they have no error type.

use thiserror::Error;

/// Errors from the learned category store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored catalog could not be encoded or decoded
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The store refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the product catalog lookup
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}
