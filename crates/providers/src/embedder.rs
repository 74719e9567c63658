//! Embedder backed by a provider's embeddings endpoint.

use async_trait::async_trait;
use rolecast_core::embedding::Embedder;
use rolecast_core::error::MemoryError;
use rolecast_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Embeds one text per request through [`Provider::embed`].
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    name: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let model = model.into();
        let name = format!("{}:{}", provider.name(), model);
        Self {
            provider,
            model,
            name,
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, MemoryError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![text.to_string()],
            })
            .await
            .map_err(|e| MemoryError::EmbeddingFailed(e.to_string()))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::EmbeddingFailed("empty embedding response".into()))
    }
}
