//! Recall Memory Layer
//!
//! Embedding-backed vector memory shared by two front ends: an agent memory
//! store that accumulates free-text records, and a document index kept in sync
//! with a folder of source files.
//!
//! ## Features
//!
//! - **Exact L2 search** - flat index with deterministic tie-breaking
//! - **Filtered retrieval** - 2x over-fetch, then kind/tag/group filters
//! - **Change detection** - BLAKE3 fingerprints skip unchanged documents
//! - **Crash-safe persistence** - artifacts replaced via temp file and rename
//!
//! ## Example
//!
//! ```ignore
//! use recall_memory::{HttpEmbedder, MemoryRecord, RetrieveOptions, VectorEngine, VectorMemory};
//!
//! let provider = HttpEmbedder::new(&EmbeddingConfig::default())?;
//! let engine = Arc::new(VectorEngine::new(Arc::new(provider)));
//! let memory = VectorMemory::open(engine, "faiss_index/memory")?;
//!
//! memory.add(MemoryRecord::fact("The user prefers concise summaries")?).await?;
//! memory.save()?;
//!
//! let hits = memory.retrieve("summary style", &RetrieveOptions::new(3)).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod index;
pub mod ingest;
pub mod memory;
pub mod persistence;
pub mod record;
pub mod search;

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

// Re-exports for convenience
pub use chunking::{chunk_words, Chunk};
pub use config::{ChunkingConfig, EmbeddingConfig, IndexConfig};
pub use embedding::{Embedder, HttpEmbedder, VectorEngine};
pub use error::{MemoryError, Result};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use fingerprint::{content_hash, FingerprintMap};
pub use index::FlatIndex;
pub use ingest::{DocumentIndexer, FailedDocument, IngestReport, SourceDocument};
pub use memory::VectorMemory;
pub use persistence::StorageLayout;
pub use record::{MemoryKind, MemoryRecord, MemoryRecordBuilder, RecordStore, GENERAL_GROUP};
pub use search::{RetrieveOptions, SearchResult};
