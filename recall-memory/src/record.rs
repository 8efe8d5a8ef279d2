//! Memory record types, builder and the position-ordered record store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};

/// Group shared by cross-session facts
pub const GENERAL_GROUP: &str = "general";

/// Category of a memory record, used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Preference,
    ToolOutput,
    #[default]
    Fact,
    Query,
    System,
    DocumentChunk,
}

impl MemoryKind {
    pub const ALL: [MemoryKind; 6] = [
        MemoryKind::Preference,
        MemoryKind::ToolOutput,
        MemoryKind::Fact,
        MemoryKind::Query,
        MemoryKind::System,
        MemoryKind::DocumentChunk,
    ];

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preference => "preference",
            Self::ToolOutput => "tool_output",
            Self::Fact => "fact",
            Self::Query => "query",
            Self::System => "system",
            Self::DocumentChunk => "document_chunk",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MemoryError::InvalidRecord(format!("unknown memory kind: {s}")))
    }
}

/// One unit of retrievable text
///
/// Immutable once inserted: the vector index only appends, so a revision is a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// The literal content that was embedded
    pub text: String,
    #[serde(default)]
    pub kind: MemoryKind,
    pub created_at: DateTime<Utc>,
    /// Originating tool name or document file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Query that produced this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_query: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Session id, or [`GENERAL_GROUP`] for cross-session facts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// `<document-stem>_<sequence>` for document chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
}

impl MemoryRecord {
    /// Create a new builder for MemoryRecord
    pub fn builder() -> MemoryRecordBuilder {
        MemoryRecordBuilder::new()
    }

    /// Shorthand for a plain fact
    pub fn fact(text: impl Into<String>) -> Result<Self> {
        Self::builder().text(text).build()
    }

    /// True if the record shares at least one tag with `tags`
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }
}

/// Builder for MemoryRecord with fluent API
#[derive(Debug, Default)]
pub struct MemoryRecordBuilder {
    text: Option<String>,
    kind: MemoryKind,
    created_at: Option<DateTime<Utc>>,
    source_name: Option<String>,
    origin_query: Option<String>,
    tags: Vec<String>,
    group_id: Option<String>,
    chunk_id: Option<String>,
}

impl MemoryRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn kind(mut self, kind: MemoryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Override the creation time (defaults to now)
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn origin_query(mut self, query: impl Into<String>) -> Self {
        self.origin_query = Some(query.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn group_id(mut self, group: impl Into<String>) -> Self {
        self.group_id = Some(group.into());
        self
    }

    /// Place the record in the shared cross-session bucket
    pub fn general(self) -> Self {
        self.group_id(GENERAL_GROUP)
    }

    pub fn chunk_id(mut self, id: impl Into<String>) -> Self {
        self.chunk_id = Some(id.into());
        self
    }

    /// Build the MemoryRecord
    pub fn build(self) -> Result<MemoryRecord> {
        let text = self
            .text
            .ok_or_else(|| MemoryError::InvalidRecord("missing required field: text".into()))?;
        if text.trim().is_empty() {
            return Err(MemoryError::InvalidRecord("text must not be empty".into()));
        }

        Ok(MemoryRecord {
            text,
            kind: self.kind,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            source_name: self.source_name,
            origin_query: self.origin_query,
            tags: self.tags,
            group_id: self.group_id,
            chunk_id: self.chunk_id,
        })
    }
}

/// Position-ordered store of records, parallel to the vector index
///
/// Exposes no removal or in-place update.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<MemoryRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: Vec<MemoryRecord>) -> Self {
        Self { records }
    }

    /// Append a record and return its position
    pub fn append(&mut self, record: MemoryRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn get(&self, position: usize) -> Result<&MemoryRecord> {
        self.records.get(position).ok_or(MemoryError::OutOfRange {
            position,
            len: self.records.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryRecord> {
        self.records.iter()
    }

    pub(crate) fn as_slice(&self) -> &[MemoryRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let record = MemoryRecord::builder().text("cats are mammals").build().unwrap();
        assert_eq!(record.kind, MemoryKind::Fact);
        assert!(record.tags.is_empty());
        assert!(record.group_id.is_none());
        assert!(record.chunk_id.is_none());
    }

    #[test]
    fn test_builder_tool_output() {
        let record = MemoryRecord::builder()
            .text("get_customer_data failed: timeout after 10s")
            .kind(MemoryKind::ToolOutput)
            .source_name("get_customer_data")
            .origin_query("latest billing details")
            .group_id("12345")
            .tag("billing")
            .build()
            .unwrap();

        assert_eq!(record.kind, MemoryKind::ToolOutput);
        assert_eq!(record.source_name.as_deref(), Some("get_customer_data"));
        assert_eq!(record.origin_query.as_deref(), Some("latest billing details"));
        assert_eq!(record.group_id.as_deref(), Some("12345"));
        assert_eq!(record.tags, vec!["billing".to_string()]);
    }

    #[test]
    fn test_builder_rejects_blank_text() {
        assert!(matches!(
            MemoryRecord::builder().text("   \n").build(),
            Err(MemoryError::InvalidRecord(_))
        ));
        assert!(matches!(
            MemoryRecord::builder().build(),
            Err(MemoryError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_kind_wire_names() {
        for kind in MemoryKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<MemoryKind>().unwrap(), kind);
        }
        assert!("opinion".parse::<MemoryKind>().is_err());
    }

    #[test]
    fn test_record_json_omits_empty_optionals() {
        let record = MemoryRecord::builder().text("Paris is a city").general().build().unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["group_id"], "general");
        assert!(json.get("chunk_id").is_none());
        assert!(json.get("source_name").is_none());

        let back: MemoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_store_out_of_range() {
        let mut store = RecordStore::new();
        assert_eq!(store.append(MemoryRecord::fact("one").unwrap()), 0);
        assert_eq!(store.append(MemoryRecord::fact("two").unwrap()), 1);
        assert_eq!(store.get(1).unwrap().text, "two");
        assert!(matches!(
            store.get(2),
            Err(MemoryError::OutOfRange { position: 2, len: 2 })
        ));
    }

    #[test]
    fn test_has_any_tag() {
        let record = MemoryRecord::builder()
            .text("VIP customers get a credit")
            .tag("policy")
            .tag("VIP")
            .build()
            .unwrap();
        assert!(record.has_any_tag(&["VIP".to_string(), "other".to_string()]));
        assert!(!record.has_any_tag(&["network".to_string()]));
        assert!(!record.has_any_tag(&[]));
    }
}
