//! Static configuration for the embedding provider, chunker and document index
//!
//! All values are fixed at startup; nothing here is mutated at runtime.

use std::path::PathBuf;

use crate::error::{MemoryError, Result};

/// Default Ollama embeddings endpoint
pub const DEFAULT_EMBED_URL: &str = "http://localhost:11434/api/embeddings";
/// Default embedding model
pub const DEFAULT_EMBED_MODEL: &str = "bge-m3";

/// Embedding provider configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Endpoint accepting `{model, prompt}` and returning a vector
    pub url: String,
    /// Model name sent with every request; must stay fixed for the life of an index
    pub model: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EMBED_URL.to_string(),
            model: DEFAULT_EMBED_MODEL.to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(MemoryError::configuration("embedding URL is empty"));
        }
        if self.model.trim().is_empty() {
            return Err(MemoryError::configuration("embedding model name is empty"));
        }
        if self.timeout_ms == 0 {
            return Err(MemoryError::configuration("embedding timeout must be positive"));
        }
        Ok(())
    }
}

/// Word-window chunking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Words per chunk (default: 180)
    pub size: usize,
    /// Words shared by consecutive chunks (default: 40)
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 180,
            overlap: 40,
        }
    }
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let config = Self { size, overlap };
        config.validate()?;
        Ok(config)
    }

    /// Reject window settings that would never advance
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(MemoryError::configuration("chunk size must be positive"));
        }
        if self.overlap >= self.size {
            return Err(MemoryError::configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }

    /// Word distance between the starts of consecutive chunks
    pub fn stride(&self) -> usize {
        self.size - self.overlap
    }
}

/// Document index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Folder of source documents
    pub source_dir: PathBuf,
    /// Folder holding the persisted artifacts
    pub storage_dir: PathBuf,
    /// Descend into subdirectories of `source_dir`
    pub recursive: bool,
    pub chunking: ChunkingConfig,
}

impl IndexConfig {
    pub fn new(source_dir: impl Into<PathBuf>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            storage_dir: storage_dir.into(),
            recursive: false,
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.storage_dir.as_os_str().is_empty() {
            return Err(MemoryError::configuration("storage directory is empty"));
        }
        if self.storage_dir.exists() && !self.storage_dir.is_dir() {
            return Err(MemoryError::configuration(format!(
                "storage path {} is not a directory",
                self.storage_dir.display()
            )));
        }
        if self.source_dir.exists() && !self.source_dir.is_dir() {
            return Err(MemoryError::configuration(format!(
                "source path {} is not a directory",
                self.source_dir.display()
            )));
        }
        Ok(())
    }
}
