//! Deterministic embedder for tests
//!
//! Bag-of-words vectors with one dimension per distinct token, so texts sharing
//! words are closer than texts that share none. Trailing plural `s` is folded
//! (`mammals` and `mammal` share a dimension).

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::embedding::Embedder;
use crate::error::{MemoryError, Result};

const DEFAULT_DIMENSION: usize = 128;

/// In-process embedder with call counting and scripted failures
pub struct KeywordEmbedder {
    dimension: usize,
    vocabulary: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
    fail_marker: Option<String>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    /// Vectors of a specific length, for dimension-mismatch scenarios
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            vocabulary: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            fail_marker: None,
        }
    }

    /// Fail with `EmbeddingUnavailable` for any text containing `marker`
    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Number of `embed` calls so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn slot(&self, token: &str) -> usize {
        let mut vocabulary = self.vocabulary.lock();
        let next = vocabulary.len();
        *vocabulary.entry(token.to_string()).or_insert(next) % self.dimension
    }
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_token(raw: &str) -> Option<String> {
    let token = raw.to_lowercase();
    if token.is_empty() {
        return None;
    }
    match token.strip_suffix('s') {
        Some(stem) if stem.len() >= 3 => Some(stem.to_string()),
        _ => Some(token),
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(MemoryError::embedding("scripted provider failure"));
            }
        }

        let mut vector = vec![0.0_f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter_map(normalize_token)
        {
            vector[self.slot(&token)] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}
