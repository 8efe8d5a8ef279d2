//! Remote embedding provider over HTTP
//!
//! Speaks the Ollama `/api/embeddings` shape (`{model, prompt}` -> `{embedding}`) and
//! also accepts OpenAI-style `{data: [{embedding}]}` responses.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{MemoryError, Result};

/// Embedding client for a network endpoint
pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| MemoryError::configuration(format!("HTTP client: {e}")))?;

        log::info!(
            "Embedding provider: {} (model {})",
            config.url,
            config.model
        );

        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": text,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MemoryError::embedding(format!("request failed: {e}")))?;
        let json: Value = response
            .error_for_status()
            .map_err(|e| MemoryError::embedding(format!("provider rejected request: {e}")))?
            .json()
            .await
            .map_err(|e| MemoryError::embedding(format!("unreadable response: {e}")))?;

        parse_embedding_response(&json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn parse_embedding_response(json: &Value) -> Result<Vec<f32>> {
    let values = json
        .get("embedding")
        .and_then(|v| v.as_array())
        .or_else(|| {
            json.get("data")
                .and_then(|d| d.get(0))
                .and_then(|item| item.get("embedding"))
                .and_then(|v| v.as_array())
        })
        .ok_or_else(|| MemoryError::embedding("response is missing an embedding array"))?;

    if values.is_empty() {
        return Err(MemoryError::embedding("provider returned an empty embedding"));
    }

    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| MemoryError::embedding("embedding value must be numeric"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_ollama_shape() {
        let json = serde_json::json!({ "embedding": [0.25, -1.0, 3.5] });
        assert_eq!(
            parse_embedding_response(&json).unwrap(),
            vec![0.25, -1.0, 3.5]
        );
    }

    #[test]
    fn test_parses_openai_shape() {
        let json = serde_json::json!({
            "data": [{ "index": 0, "embedding": [1.0, 2.0] }]
        });
        assert_eq!(parse_embedding_response(&json).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_rejects_malformed_bodies() {
        for json in [
            serde_json::json!({ "error": "model not found" }),
            serde_json::json!({ "embedding": [] }),
            serde_json::json!({ "embedding": [1.0, "two"] }),
        ] {
            assert!(matches!(
                parse_embedding_response(&json),
                Err(MemoryError::EmbeddingUnavailable(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_embedding_unavailable() {
        let embedder = HttpEmbedder::new(&EmbeddingConfig {
            url: "http://127.0.0.1:1/api/embeddings".to_string(),
            timeout_ms: 500,
            ..Default::default()
        })
        .unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, MemoryError::EmbeddingUnavailable(_)));
    }
}
