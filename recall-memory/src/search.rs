//! Filtered nearest-neighbour retrieval
//!
//! Requests `2 * top_k` neighbours, then walks them nearest-first and keeps
//! records passing every filter until `top_k` are collected. Selective filters
//! may legitimately return fewer than `top_k`.

use crate::error::Result;
use crate::index::FlatIndex;
use crate::record::{MemoryKind, MemoryRecord, RecordStore};

/// Candidates requested per wanted result
pub const OVERFETCH_FACTOR: usize = 2;

/// Retrieval options
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Maximum results to return (default: 3)
    pub top_k: usize,
    /// Exact kind match
    pub kind: Option<MemoryKind>,
    /// Accept records sharing at least one of these tags
    pub tags: Vec<String>,
    /// Exact group match
    pub group: Option<String>,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            kind: None,
            tags: vec![],
            group: None,
        }
    }
}

impl RetrieveOptions {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: MemoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// True if `record` passes every supplied filter
    pub fn accepts(&self, record: &MemoryRecord) -> bool {
        if self.kind.is_some_and(|kind| record.kind != kind) {
            return false;
        }
        if !self.tags.is_empty() && !record.has_any_tag(&self.tags) {
            return false;
        }
        if let Some(group) = &self.group {
            if record.group_id.as_deref() != Some(group.as_str()) {
                return false;
            }
        }
        true
    }

    fn candidate_count(&self) -> usize {
        self.top_k.saturating_mul(OVERFETCH_FACTOR)
    }
}

/// A retrieved record with its distance to the query
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub record: MemoryRecord,
    /// Squared L2 distance
    pub distance: f32,
    pub position: usize,
}

/// Over-fetch from `index`, then filter through `records`
pub(crate) fn filtered_search(
    index: &FlatIndex,
    records: &RecordStore,
    query: &[f32],
    options: &RetrieveOptions,
) -> Result<Vec<SearchResult>> {
    if options.top_k == 0 || records.is_empty() {
        return Ok(Vec::new());
    }

    let candidates = index.search(query, options.candidate_count())?;
    let mut results = Vec::with_capacity(options.top_k);

    for (position, distance) in candidates {
        let record = records.get(position)?;
        if !options.accepts(record) {
            continue;
        }
        results.push(SearchResult {
            record: record.clone(),
            distance,
            position,
        });
        if results.len() >= options.top_k {
            break;
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;

    fn store_with(
        entries: Vec<(&str, MemoryKind, Vec<&str>, Option<&str>, [f32; 2])>,
    ) -> (FlatIndex, RecordStore) {
        let mut index = FlatIndex::new();
        let mut records = RecordStore::new();
        for (text, kind, tags, group, vector) in entries {
            let mut builder = MemoryRecord::builder()
                .text(text)
                .kind(kind)
                .tags(tags.iter().map(|t| t.to_string()).collect());
            if let Some(group) = group {
                builder = builder.group_id(group);
            }
            index.insert(&vector).unwrap();
            records.append(builder.build().unwrap());
        }
        (index, records)
    }

    #[test]
    fn test_retrieve_options_default() {
        let options = RetrieveOptions::default();
        assert_eq!(options.top_k, 3);
        assert!(options.kind.is_none());
        assert!(options.tags.is_empty());
        assert!(options.group.is_none());
    }

    #[test]
    fn test_kind_filter_never_leaks() {
        let (index, records) = store_with(vec![
            ("near tool", MemoryKind::ToolOutput, vec![], None, [0.0, 0.1]),
            ("fact a", MemoryKind::Fact, vec![], None, [0.0, 0.2]),
            ("near pref", MemoryKind::Preference, vec![], None, [0.0, 0.3]),
            ("fact b", MemoryKind::Fact, vec![], None, [0.0, 0.4]),
        ]);

        let options = RetrieveOptions::new(2).kind(MemoryKind::Fact);
        let results = filtered_search(&index, &records, &[0.0, 0.0], &options).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.record.kind == MemoryKind::Fact));
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_overfetch_is_bounded() {
        // Only 2 * top_k candidates are inspected, so a matching record ranked
        // beyond them is not returned.
        let (index, records) = store_with(vec![
            ("pref 0", MemoryKind::Preference, vec![], None, [0.0, 0.1]),
            ("pref 1", MemoryKind::Preference, vec![], None, [0.0, 0.2]),
            ("system", MemoryKind::System, vec![], None, [0.0, 0.3]),
        ]);

        let options = RetrieveOptions::new(1).kind(MemoryKind::System);
        let results = filtered_search(&index, &records, &[0.0, 0.0], &options).unwrap();
        assert!(results.is_empty());

        let wider = RetrieveOptions::new(2).kind(MemoryKind::System);
        let results = filtered_search(&index, &records, &[0.0, 0.0], &wider).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.text, "system");
    }

    #[test]
    fn test_tag_filter_any_overlap() {
        let (index, records) = store_with(vec![
            ("vip policy", MemoryKind::System, vec!["policy", "VIP"], None, [0.0, 0.1]),
            ("tone", MemoryKind::Preference, vec!["tone"], None, [0.0, 0.2]),
            ("network", MemoryKind::Fact, vec!["VIP", "network"], None, [0.0, 0.3]),
        ]);

        let options = RetrieveOptions::new(5).tag("VIP").tag("missing");
        let texts: Vec<String> = filtered_search(&index, &records, &[0.0, 0.0], &options)
            .unwrap()
            .into_iter()
            .map(|r| r.record.text)
            .collect();
        assert_eq!(texts, vec!["vip policy", "network"]);
    }

    #[test]
    fn test_group_filter_exact() {
        let (index, records) = store_with(vec![
            ("session a", MemoryKind::Fact, vec![], Some("12345"), [0.0, 0.1]),
            ("general", MemoryKind::Fact, vec![], Some("general"), [0.0, 0.2]),
            ("no group", MemoryKind::Fact, vec![], None, [0.0, 0.3]),
        ]);

        let options = RetrieveOptions::new(3).group("12345");
        let results = filtered_search(&index, &records, &[0.0, 0.0], &options).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.text, "session a");
    }

    #[test]
    fn test_zero_top_k_and_empty_store() {
        let (index, records) = store_with(vec![("x", MemoryKind::Fact, vec![], None, [1.0, 1.0])]);
        assert!(filtered_search(&index, &records, &[0.0, 0.0], &RetrieveOptions::new(0))
            .unwrap()
            .is_empty());

        let empty = filtered_search(
            &FlatIndex::new(),
            &RecordStore::new(),
            &[0.0, 0.0],
            &RetrieveOptions::default(),
        )
        .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_desynchronized_lookup_is_out_of_range() {
        let mut index = FlatIndex::new();
        index.insert(&[0.0, 0.0]).unwrap();
        index.insert(&[0.0, 1.0]).unwrap();
        let mut records = RecordStore::new();
        records.append(MemoryRecord::fact("only one").unwrap());

        let options = RetrieveOptions::new(1).kind(MemoryKind::System);
        assert!(matches!(
            filtered_search(&index, &records, &[0.0, 0.0], &options),
            Err(MemoryError::OutOfRange { position: 1, len: 1 })
        ));
    }
}
