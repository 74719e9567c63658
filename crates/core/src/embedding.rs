//! Embedder trait: text to fixed-length vector.

use async_trait::async_trait;
use crate::error::MemoryError;

/// Converts text into an embedding vector.
///
/// Every vector produced by one embedder has the same length.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The embedder name (e.g., "openai:text-embedding-ada-002").
    fn name(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, MemoryError>;
}
