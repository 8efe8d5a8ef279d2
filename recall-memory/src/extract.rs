//! Source file to plain text

use std::path::Path;

use crate::error::{MemoryError, Result};

/// Converts a source file to plain text
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Reads files as UTF-8 text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).map_err(|e| MemoryError::extraction(path, e.to_string()))?;
        String::from_utf8(bytes)
            .map_err(|e| MemoryError::extraction(path, format!("not valid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.md");
        std::fs::write(&path, "héllo wörld").unwrap();

        assert_eq!(PlainTextExtractor.extract(&path).unwrap(), "héllo wörld");
    }

    #[test]
    fn test_binary_and_missing_files_fail() {
        let temp_dir = TempDir::new().unwrap();
        let binary = temp_dir.path().join("blob.bin");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        match PlainTextExtractor.extract(&binary) {
            Err(MemoryError::ExtractionFailed { path, .. }) => assert_eq!(path, binary),
            other => panic!("expected ExtractionFailed, got {other:?}"),
        }
        assert!(matches!(
            PlainTextExtractor.extract(&temp_dir.path().join("missing.txt")),
            Err(MemoryError::ExtractionFailed { .. })
        ));
    }
}
