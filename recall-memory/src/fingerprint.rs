//! Content fingerprints for change detection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// BLAKE3 hex digest of raw file bytes
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// File name -> content hash of the last successful ingestion
///
/// Entries survive the source file disappearing; they are only dropped when the
/// chunks they vouch for are lost from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintMap(BTreeMap<String, String>);

impl FingerprintMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `name` was ingested with exactly this hash
    pub fn is_current(&self, name: &str, hash: &str) -> bool {
        self.0.get(name).is_some_and(|stored| stored == hash)
    }

    pub fn record(&mut self, name: impl Into<String>, hash: impl Into<String>) {
        self.0.insert(name.into(), hash.into());
    }

    /// Forget `name`, returning its hash if it was recorded
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
