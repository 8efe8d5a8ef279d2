//! Embedding-backed vector memory
//!
//! One exclusive lock guards the vector index, the record store and the
//! fingerprint map as a unit. Embedding happens before the lock is taken, so a
//! slow provider never blocks readers; appends then run as a single critical
//! section, keeping `index.len() == records.len()` with aligned positions.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::embedding::VectorEngine;
use crate::error::{MemoryError, Result};
use crate::fingerprint::FingerprintMap;
use crate::index::FlatIndex;
use crate::persistence::{PersistedState, StorageLayout};
use crate::record::{MemoryRecord, RecordStore};
use crate::search::{filtered_search, RetrieveOptions, SearchResult};

#[derive(Default)]
struct MemoryState {
    index: FlatIndex,
    records: RecordStore,
    fingerprints: FingerprintMap,
}

impl MemoryState {
    /// Validate every vector, then append all pairs
    fn append_all(&mut self, pairs: Vec<(MemoryRecord, Vec<f32>)>) -> Result<Vec<usize>> {
        let mut expected = self.index.dimension();
        for (_, vector) in &pairs {
            let dim = *expected.get_or_insert(vector.len());
            if vector.is_empty() || vector.len() != dim {
                return Err(MemoryError::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
        }

        let mut positions = Vec::with_capacity(pairs.len());
        for (record, vector) in pairs {
            let position = self.index.insert(&vector)?;
            let record_position = self.records.append(record);
            debug_assert_eq!(position, record_position);
            positions.push(position);
        }
        Ok(positions)
    }
}

impl From<PersistedState> for MemoryState {
    fn from(state: PersistedState) -> Self {
        Self {
            index: state.index,
            records: state.records,
            fingerprints: state.fingerprints,
        }
    }
}

/// Vector index + record store + fingerprints behind one lock
pub struct VectorMemory {
    state: RwLock<MemoryState>,
    engine: Arc<VectorEngine>,
    layout: Option<StorageLayout>,
}

impl VectorMemory {
    /// Unpersisted memory; `save` and `load` are no-ops
    pub fn in_memory(engine: Arc<VectorEngine>) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            engine,
            layout: None,
        }
    }

    /// Memory persisted under `storage_dir`, loading any existing artifacts
    pub fn open(engine: Arc<VectorEngine>, storage_dir: impl AsRef<Path>) -> Result<Self> {
        let memory = Self {
            state: RwLock::new(MemoryState::default()),
            engine,
            layout: Some(StorageLayout::new(storage_dir.as_ref())),
        };
        memory.load()?;
        Ok(memory)
    }

    /// Replace in-memory state with what is on disk
    pub fn load(&self) -> Result<()> {
        let Some(layout) = &self.layout else {
            return Ok(());
        };
        let loaded = layout.load()?;
        *self.state.write() = loaded.into();
        Ok(())
    }

    /// Persist index, metadata and fingerprints
    pub fn save(&self) -> Result<()> {
        let Some(layout) = &self.layout else {
            log::debug!("In-memory store, nothing to save");
            return Ok(());
        };
        let state = self.state.read();
        layout.save(&state.index, state.records.as_slice(), &state.fingerprints)
    }

    /// Embed and append one record, returning its position
    pub async fn add(&self, record: MemoryRecord) -> Result<usize> {
        let vector = self.engine.embed(&record.text).await?;
        self.insert_embedded(record, vector)
    }

    /// Embed every record, then append all of them or none
    pub async fn add_batch(&self, records: Vec<MemoryRecord>) -> Result<Vec<usize>> {
        let mut pairs = Vec::with_capacity(records.len());
        for record in records {
            let vector = self.engine.embed(&record.text).await?;
            pairs.push((record, vector));
        }
        self.state.write().append_all(pairs)
    }

    /// Append a record with a pre-computed embedding
    pub fn insert_embedded(&self, record: MemoryRecord, vector: Vec<f32>) -> Result<usize> {
        let positions = self.state.write().append_all(vec![(record, vector)])?;
        Ok(positions[0])
    }

    /// Append a document's chunks and mark it ingested, atomically
    pub(crate) fn commit_document(
        &self,
        name: &str,
        hash: &str,
        pairs: Vec<(MemoryRecord, Vec<f32>)>,
    ) -> Result<usize> {
        let mut state = self.state.write();
        let positions = state.append_all(pairs)?;
        state.fingerprints.record(name, hash);
        Ok(positions.len())
    }

    /// Nearest records passing the filters, nearest first
    pub async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<Vec<MemoryRecord>> {
        Ok(self
            .search(query, options)
            .await?
            .into_iter()
            .map(|r| r.record)
            .collect())
    }

    /// Like [`retrieve`](Self::retrieve), keeping distances and positions
    pub async fn search(&self, query: &str, options: &RetrieveOptions) -> Result<Vec<SearchResult>> {
        if self.is_empty() || options.top_k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.engine.embed_query(query).await?;
        self.search_by_vector(&vector, options)
    }

    /// Filtered search with an already-embedded query
    pub fn search_by_vector(
        &self,
        vector: &[f32],
        options: &RetrieveOptions,
    ) -> Result<Vec<SearchResult>> {
        let state = self.state.read();
        filtered_search(&state.index, &state.records, vector, options)
    }

    /// Record at `position`
    pub fn get(&self, position: usize) -> Result<MemoryRecord> {
        self.state.read().records.get(position).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector index length, for alignment checks
    pub fn vector_count(&self) -> usize {
        self.state.read().index.len()
    }

    /// Stored content hash for a source file
    pub fn fingerprint(&self, name: &str) -> Option<String> {
        self.state.read().fingerprints.get(name).map(str::to_string)
    }

    pub(crate) fn fingerprints(&self) -> FingerprintMap {
        self.state.read().fingerprints.clone()
    }

    /// Get store statistics
    pub fn stats(&self) -> serde_json::Value {
        let state = self.state.read();

        let mut by_kind: HashMap<String, usize> = HashMap::new();
        let mut by_tag: HashMap<String, usize> = HashMap::new();
        for record in state.records.iter() {
            *by_kind.entry(record.kind.to_string()).or_insert(0) += 1;
            for tag in &record.tags {
                *by_tag.entry(tag.clone()).or_insert(0) += 1;
            }
        }

        serde_json::json!({
            "totalRecords": state.records.len(),
            "dimension": state.index.dimension(),
            "documents": state.fingerprints.len(),
            "byKind": by_kind,
            "byTag": by_tag,
        })
    }

    /// Get the vector engine reference
    pub fn engine(&self) -> &Arc<VectorEngine> {
        &self.engine
    }

    /// Storage directory, if persisted
    pub fn storage_dir(&self) -> Option<&Path> {
        self.layout.as_ref().map(StorageLayout::root)
    }
}
