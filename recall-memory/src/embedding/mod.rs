//! Embedding module for semantic search
//!
//! The provider is an external collaborator reached through [`Embedder`]; every vector
//! feeding one index must come from the same provider and model.

mod engine;
mod http;

pub use engine::VectorEngine;
pub use http::HttpEmbedder;

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one piece of text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// Squared Euclidean distance
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
