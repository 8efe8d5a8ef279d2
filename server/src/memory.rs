//! Agent memory integration
//!
//! Holds the agent's long-term [`VectorMemory`], persisted under
//! `<storage-dir>/memory` so it never mixes with the document index.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

pub use recall_memory::{MemoryKind, MemoryRecord, RetrieveOptions, SearchResult, VectorEngine};
use recall_memory::VectorMemory;

use crate::error::{ServerError, ServerResult};

/// Subdirectory of the storage directory holding agent memory
pub const MEMORY_SUBDIR: &str = "memory";

/// Where an added record landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredRecord {
    pub position: usize,
    /// False when the record is only in memory until the next save
    pub persisted: bool,
}

/// Memory manager for the MCP server
///
/// Wraps `VectorMemory` behind an explicit initialization step. Every
/// operation fails with [`ServerError::NotInitialized`] until
/// [`initialize`](Self::initialize) succeeds.
pub struct MemoryManager {
    store: Arc<RwLock<Option<Arc<VectorMemory>>>>,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(None)),
        }
    }

    /// Open (or create) the agent memory under `storage_dir`
    pub async fn initialize(
        &self,
        storage_dir: &Path,
        engine: Arc<VectorEngine>,
    ) -> ServerResult<PathBuf> {
        let data_dir = storage_dir.join(MEMORY_SUBDIR);
        std::fs::create_dir_all(&data_dir)?;

        let store = VectorMemory::open(engine, &data_dir).map_err(|e| {
            tracing::error!("Failed to open agent memory at {:?}: {}", data_dir, e);
            e
        })?;
        tracing::info!(
            "Agent memory initialized at {:?} ({} records)",
            data_dir,
            store.len()
        );

        *self.store.write().await = Some(Arc::new(store));
        Ok(data_dir)
    }

    pub async fn is_initialized(&self) -> bool {
        self.store.read().await.is_some()
    }

    /// Embed, append and persist a record.
    ///
    /// Once appended the record is stored, so a failed save is reported in the
    /// outcome instead of as an error; the next successful save writes it out.
    pub async fn add(&self, record: MemoryRecord) -> ServerResult<StoredRecord> {
        let store = self.get_store().await?;
        let position = store.add(record).await?;
        let persisted = match store.save() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Stored memory {} but could not persist it: {}", position, e);
                false
            }
        };
        Ok(StoredRecord {
            position,
            persisted,
        })
    }

    /// Filtered nearest-neighbour retrieval
    pub async fn search(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> ServerResult<Vec<SearchResult>> {
        let store = self.get_store().await?;
        Ok(store.search(query, options).await?)
    }

    pub async fn stats(&self) -> ServerResult<serde_json::Value> {
        let store = self.get_store().await?;
        Ok(store.stats())
    }

    async fn get_store(&self) -> ServerResult<Arc<VectorMemory>> {
        self.store
            .read()
            .await
            .clone()
            .ok_or(ServerError::NotInitialized)
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}
