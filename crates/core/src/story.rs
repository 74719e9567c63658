//! Story store trait: the vector database of story passages.
//!
//! A story store holds (embedding, text) pairs, answers nearest-neighbour
//! queries, and owns its own persistence format. The orchestrator only
//! reads from it during a turn; seeding happens at construction time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::MemoryError;

/// A single story passage with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEntry {
    /// The passage text (e.g., one scene).
    pub text: String,

    /// Embedding of `text`.
    pub embedding: Vec<f32>,
}

/// The core StoryStore trait.
///
/// Implementations: in-memory cosine store with JSONL persistence.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// The store name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Replace the store contents with entries read from `path`.
    async fn load(&mut self, path: &Path) -> std::result::Result<(), MemoryError>;

    /// Persist the store contents to `path`.
    async fn save(&self, path: &Path) -> std::result::Result<(), MemoryError>;

    /// Seed the store from parallel lists of embeddings and texts.
    async fn init_from_docs(
        &mut self,
        embeddings: Vec<Vec<f32>>,
        texts: Vec<String>,
    ) -> std::result::Result<(), MemoryError>;

    /// Return up to `k` passage texts, most similar first.
    async fn search(&self, query_embedding: &[f32], k: usize) -> std::result::Result<Vec<String>, MemoryError>;

    /// Number of stored passages.
    async fn len(&self) -> std::result::Result<usize, MemoryError>;
}
