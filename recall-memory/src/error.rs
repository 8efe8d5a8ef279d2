//! Error types for recall-memory

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the memory system
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Embedding provider could not be reached or returned an unusable response
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Vector length differs from the index dimension
    #[error("Dimension mismatch: index has {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Record lookup past the end of the record store
    #[error("Position {position} out of range (record store holds {len})")]
    OutOfRange { position: usize, len: usize },

    /// A persisted artifact exists but cannot be decoded
    #[error("Corrupted persisted state: {0}")]
    CorruptedState(String),

    /// A source document could not be converted to text
    #[error("Extraction failed for {}: {reason}", path.display())]
    ExtractionFailed { path: PathBuf, reason: String },

    /// Invalid chunking parameters or storage paths
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record failed builder validation
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Binary index serialization error
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MemoryError {
    /// Create an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a corrupted-state error
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::CorruptedState(msg.into())
    }

    /// Create an extraction error
    pub fn extraction(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Errors that must halt an ingestion pass instead of being isolated per file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::OutOfRange { .. }
                | Self::CorruptedState(_)
        )
    }
}

/// Result type for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = MemoryError::DimensionMismatch {
            expected: 1024,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: index has 1024 dimensions, got 768"
        );
    }

    #[test]
    fn test_extraction_display_includes_path() {
        let err = MemoryError::extraction("/docs/report.bin", "not valid UTF-8");
        let msg = err.to_string();
        assert!(msg.contains("/docs/report.bin"));
        assert!(msg.contains("not valid UTF-8"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(MemoryError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
        .is_fatal());
        assert!(MemoryError::corrupted("bad blob").is_fatal());
        assert!(!MemoryError::embedding("connection refused").is_fatal());
        assert!(!MemoryError::extraction("a.txt", "bad").is_fatal());
    }
}
