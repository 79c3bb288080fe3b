//! # Category Store
//!
//! Persistence boundary of the learned product catalog. The categorizer loads the
//! whole catalog once at startup and writes it back as a full overwrite.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::DEFAULT_SAVE_CHUNK_SIZE;
use crate::error::StoreError;
use crate::ingredient_model::LearnedProductEntry;

/// Learned catalog keyed by normalized product name
pub type LearnedCatalog = HashMap<String, LearnedProductEntry>;

/// Backing store of the learned product catalog
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Load every learned entry
    async fn load_all(&self) -> Result<LearnedCatalog, StoreError>;

    /// Replace the stored catalog with `entries`
    async fn save_all(&self, entries: &LearnedCatalog) -> Result<(), StoreError>;
}

/// In-process store, written in batches of at most `chunk_size` records
#[derive(Debug)]
pub struct InMemoryCategoryStore {
    entries: Mutex<LearnedCatalog>,
    chunk_size: usize,
    batches_written: AtomicUsize,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::with_entries(LearnedCatalog::new())
    }

    /// Create a store pre-filled with `entries`
    pub fn with_entries(entries: LearnedCatalog) -> Self {
        Self {
            entries: Mutex::new(entries),
            chunk_size: DEFAULT_SAVE_CHUNK_SIZE,
            batches_written: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `save_all` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of batches written over all saves
    pub fn batches_written(&self) -> usize {
        self.batches_written.load(Ordering::SeqCst)
    }

    /// Copy of the stored catalog
    pub fn stored(&self) -> LearnedCatalog {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for InMemoryCategoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn load_all(&self) -> Result<LearnedCatalog, StoreError> {
        Ok(self.stored())
    }

    async fn save_all(&self, entries: &LearnedCatalog) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("saves are disabled".to_string()));
        }

        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();

        let mut replacement = LearnedCatalog::with_capacity(entries.len());
        let mut batches = 0;
        for chunk in keys.chunks(self.chunk_size) {
            for key in chunk {
                replacement.insert((*key).clone(), entries[*key].clone());
            }
            batches += 1;
        }

        *self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = replacement;
        self.batches_written.fetch_add(batches, Ordering::SeqCst);
        self.saves.fetch_add(1, Ordering::SeqCst);
        debug!(entries = entries.len(), batches, "Saved learned catalog in memory");
        Ok(())
    }
}

/// Store backed by a JSON file holding an array of entries.
///
/// Entries are streamed to the file in batches of `chunk_size`.
#[derive(Debug, Clone)]
pub struct JsonFileCategoryStore {
    path: PathBuf,
    chunk_size: usize,
}

impl JsonFileCategoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_SAVE_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CategoryStore for JsonFileCategoryStore {
    async fn load_all(&self) -> Result<LearnedCatalog, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No learned catalog file yet, starting empty");
                return Ok(LearnedCatalog::new());
            }
            Err(e) => return Err(e.into()),
        };

        let entries: Vec<LearnedProductEntry> = serde_json::from_str(&content)?;
        info!(
            path = %self.path.display(),
            entries = entries.len(),
            "Loaded learned catalog"
        );
        Ok(entries
            .into_iter()
            .map(|entry| (entry.normalized_name.clone(), entry))
            .collect())
    }

    async fn save_all(&self, entries: &LearnedCatalog) -> Result<(), StoreError> {
        let mut sorted: Vec<LearnedProductEntry> = entries.values().cloned().collect();
        sorted.sort_by(|a, b| a.normalized_name.cmp(&b.normalized_name));

        let path = self.path.clone();
        let chunk_size = self.chunk_size;
        let batches =
            tokio::task::spawn_blocking(move || write_atomically(&path, &sorted, chunk_size))
                .await
                .map_err(|e| StoreError::Unavailable(format!("save task failed: {e}")))??;

        debug!(
            path = %self.path.display(),
            entries = entries.len(),
            batches,
            "Saved learned catalog"
        );
        Ok(())
    }
}

/// Write `entries` as a JSON array to a temporary file next to `path`, then
/// rename it over `path`. Returns the number of batches written.
fn write_atomically(
    path: &Path,
    entries: &[LearnedProductEntry],
    chunk_size: usize,
) -> Result<usize, StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut temp_file = NamedTempFile::new_in(&dir)?;
    let mut batches = 0;
    {
        let mut writer = BufWriter::new(&mut temp_file);
        writer.write_all(b"[")?;
        for (index, entry) in entries.iter().enumerate() {
            if index > 0 {
                writer.write_all(b",")?;
            }
            writer.write_all(b"\n  ")?;
            serde_json::to_writer(&mut writer, entry)?;
            if (index + 1) % chunk_size == 0 || index + 1 == entries.len() {
                writer.flush()?;
                batches += 1;
            }
        }
        writer.write_all(b"\n]\n")?;
        writer.flush()?;
    }
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(batches)
}
