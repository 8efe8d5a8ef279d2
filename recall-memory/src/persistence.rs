//! On-disk artifacts for a vector memory
//!
//! Three independently loadable files share one storage directory:
//! - `index.bin`: bincode blob of the [`FlatIndex`]
//! - `metadata.json`: records in position order
//! - `doc_index_cache.json`: file name -> content hash
//!
//! Every artifact is written to a temp file in the same directory and renamed over
//! the target, so a crash mid-write leaves the previous version intact.
//!
//! Saves go index, then metadata, then fingerprints. Records are append-only, so an
//! interrupted save leaves each artifact a prefix of the next one in that order, and
//! a fingerprint is never on disk before the chunks it vouches for. Load trims the
//! longer of index and metadata back to the shorter.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{MemoryError, Result};
use crate::fingerprint::FingerprintMap;
use crate::index::FlatIndex;
use crate::record::{MemoryRecord, RecordStore};

pub const INDEX_FILE: &str = "index.bin";
pub const METADATA_FILE: &str = "metadata.json";
pub const FINGERPRINT_FILE: &str = "doc_index_cache.json";

/// Everything guarded by the memory lock, as loaded from disk
#[derive(Debug, Default)]
pub struct PersistedState {
    pub index: FlatIndex,
    pub records: RecordStore,
    pub fingerprints: FingerprintMap,
}

/// Paths of the three artifacts inside a storage directory
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn fingerprint_path(&self) -> PathBuf {
        self.root.join(FINGERPRINT_FILE)
    }

    /// Load whichever artifacts exist; a missing artifact means empty
    pub fn load(&self) -> Result<PersistedState> {
        let index = match read_if_exists(&self.index_path())? {
            Some(bytes) => FlatIndex::from_bytes(&bytes)?,
            None => FlatIndex::new(),
        };
        let records: Vec<MemoryRecord> = match read_if_exists(&self.metadata_path())? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };
        let fingerprints: FingerprintMap = match read_if_exists(&self.fingerprint_path())? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => FingerprintMap::new(),
        };

        let (index, records, fingerprints) = reconcile(index, records, fingerprints);

        if !records.is_empty() {
            log::info!(
                "Loaded {} records ({} fingerprints) from {}",
                records.len(),
                fingerprints.len(),
                self.root.display()
            );
        }

        Ok(PersistedState {
            index,
            records: RecordStore::from_records(records),
            fingerprints,
        })
    }

    /// Write all three artifacts
    pub fn save(
        &self,
        index: &FlatIndex,
        records: &[MemoryRecord],
        fingerprints: &FingerprintMap,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;

        write_atomic(&self.index_path(), &index.to_bytes()?)?;
        write_atomic(&self.metadata_path(), &serde_json::to_vec_pretty(records)?)?;
        write_atomic(&self.fingerprint_path(), &serde_json::to_vec_pretty(fingerprints)?)?;

        log::info!(
            "Saved index and metadata ({} records) to {}",
            records.len(),
            self.root.display()
        );
        Ok(())
    }
}

/// Trim index and metadata to their common prefix after an interrupted save.
///
/// Documents that lost chunks in the trim also lose their fingerprint so the next
/// ingestion pass picks them up again.
fn reconcile(
    mut index: FlatIndex,
    mut records: Vec<MemoryRecord>,
    mut fingerprints: FingerprintMap,
) -> (FlatIndex, Vec<MemoryRecord>, FingerprintMap) {
    let aligned = index.len().min(records.len());

    if index.len() > aligned {
        log::warn!(
            "Index holds {} vectors but metadata only {} records; dropping the extra vectors",
            index.len(),
            records.len()
        );
        index.truncate(aligned);
    }

    if records.len() > aligned {
        log::warn!(
            "Metadata holds {} records but index only {} vectors; dropping the extra records",
            records.len(),
            index.len()
        );
        for orphan in records.drain(aligned..) {
            if let Some(name) = orphan.source_name {
                if fingerprints.remove(&name).is_some() {
                    log::warn!("Forgetting fingerprint of {} so it is ingested again", name);
                }
            }
        }
    }

    (index, records, fingerprints)
}

fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replace `path` with `bytes` via a sibling temp file and rename
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| MemoryError::configuration(format!("{} has no parent", path.display())))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| MemoryError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MemoryKind;
    use tempfile::TempDir;

    fn sample_state() -> (FlatIndex, Vec<MemoryRecord>, FingerprintMap) {
        let mut index = FlatIndex::new();
        index.insert(&[1.0, 0.0]).unwrap();
        index.insert(&[0.0, 1.0]).unwrap();

        let records = vec![
            MemoryRecord::builder()
                .text("first chunk")
                .kind(MemoryKind::DocumentChunk)
                .source_name("notes.txt")
                .chunk_id("notes_0")
                .build()
                .unwrap(),
            MemoryRecord::builder()
                .text("second chunk")
                .kind(MemoryKind::DocumentChunk)
                .source_name("notes.txt")
                .chunk_id("notes_1")
                .build()
                .unwrap(),
        ];

        let mut fingerprints = FingerprintMap::new();
        fingerprints.record("notes.txt", "abc123");

        (index, records, fingerprints)
    }

    #[test]
    fn test_missing_artifacts_load_empty() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path().join("never_created"));

        let state = layout.load().unwrap();
        assert!(state.index.is_empty());
        assert!(state.records.is_empty());
        assert!(state.fingerprints.is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        let (index, records, fingerprints) = sample_state();

        layout.save(&index, &records, &fingerprints).unwrap();
        let state = layout.load().unwrap();

        assert_eq!(state.index.len(), 2);
        assert_eq!(state.index.vector(1), Some(&[0.0, 1.0][..]));
        assert_eq!(state.records.as_slice(), records.as_slice());
        assert_eq!(state.fingerprints, fingerprints);
    }

    #[test]
    fn test_metadata_is_json_array_in_position_order() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        let (index, records, fingerprints) = sample_state();
        layout.save(&index, &records, &fingerprints).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(layout.metadata_path()).unwrap()).unwrap();
        let array = raw.as_array().unwrap();
        assert_eq!(array[0]["chunk_id"], "notes_0");
        assert_eq!(array[1]["chunk_id"], "notes_1");
        assert_eq!(array[0]["kind"], "document_chunk");

        let cache: serde_json::Value =
            serde_json::from_slice(&std::fs::read(layout.fingerprint_path()).unwrap()).unwrap();
        assert_eq!(cache["notes.txt"], "abc123");
    }

    #[test]
    fn test_index_ahead_of_metadata_is_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        let (index, records, fingerprints) = sample_state();

        // Index written, crash before the metadata caught up
        layout.save(&index, &records[..1], &fingerprints).unwrap();
        let state = layout.load().unwrap();

        assert_eq!(state.index.len(), 1);
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.index.vector(0), Some(&[1.0, 0.0][..]));
        assert_eq!(state.fingerprints, fingerprints);
    }

    #[test]
    fn test_missing_index_discards_orphaned_records_and_fingerprints() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        let (mut index, mut records, mut fingerprints) = sample_state();
        records.push(
            MemoryRecord::builder()
                .text("prefers dark mode")
                .kind(MemoryKind::Preference)
                .build()
                .unwrap(),
        );
        fingerprints.record("empty.txt", "e3b0c4");
        index.insert(&[1.0, 1.0]).unwrap();

        layout.save(&index, &records, &fingerprints).unwrap();
        std::fs::remove_file(layout.index_path()).unwrap();

        let state = layout.load().unwrap();
        assert!(state.index.is_empty());
        assert!(state.records.is_empty());
        assert_eq!(state.fingerprints.get("notes.txt"), None);
        // No chunks were lost for a document that never had any
        assert_eq!(state.fingerprints.get("empty.txt"), Some("e3b0c4"));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        let (index, records, fingerprints) = sample_state();
        layout.save(&index, &records, &fingerprints).unwrap();
        layout.save(&index, &records, &fingerprints).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![FINGERPRINT_FILE, INDEX_FILE, METADATA_FILE]);
    }
}
