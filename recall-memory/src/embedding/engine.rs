//! Vector embedding engine
//!
//! High-level API over an embedding provider, with a query cache.

use super::Embedder;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// Vector embedding engine with query caching
///
/// Document and record text goes through [`VectorEngine::embed`] uncached; only
/// query strings are memoised.
pub struct VectorEngine {
    provider: Arc<dyn Embedder>,
    query_cache: DashMap<String, Vec<f32>>,
}

impl VectorEngine {
    pub fn new(provider: Arc<dyn Embedder>) -> Self {
        log::info!("VectorEngine ready (model {})", provider.model_name());

        Self {
            provider,
            query_cache: DashMap::new(),
        }
    }

    /// Generate an embedding
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.provider.embed(text).await
    }

    /// Embed every text in order, failing on the first provider error
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.provider.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Generate a query embedding with caching
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.query_cache.get(query) {
            return Ok(cached.clone());
        }

        let embedding = self.provider.embed(query).await?;
        self.query_cache
            .insert(query.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// Model name of the underlying provider
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.query_cache.len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.query_cache.clear();
    }
}
