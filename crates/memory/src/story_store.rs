//! In-memory story store with JSON-lines persistence.
//!
//! Each line of a saved story database is one JSON-encoded [`StoryEntry`],
//! in insertion order. Loading skips corrupted lines with a warning.

use async_trait::async_trait;
use rolecast_core::error::MemoryError;
use rolecast_core::story::{StoryEntry, StoryStore};
use std::path::Path;
use tracing::{debug, warn};

use crate::vector::rank_by_similarity;

/// A story store that keeps every entry in memory and searches by cosine
/// similarity.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStoryStore {
    entries: Vec<StoryEntry>,
}

impl InMemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a saved story database.
    pub async fn open(path: &Path) -> Result<Self, MemoryError> {
        let mut store = Self::new();
        store.load(path).await?;
        Ok(store)
    }

    pub fn entries(&self) -> &[StoryEntry] {
        &self.entries
    }

    fn parse_jsonl(content: &str) -> Vec<StoryEntry> {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<StoryEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted story entry");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl StoryStore for InMemoryStoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&mut self, path: &Path) -> Result<(), MemoryError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| MemoryError::SourceUnreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;

        self.entries = Self::parse_jsonl(&content);
        debug!(path = %path.display(), count = self.entries.len(), "Story database loaded");
        Ok(())
    }

    async fn save(&self, path: &Path) -> Result<(), MemoryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create story db directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for entry in &self.entries {
            let line = serde_json::to_string(entry).map_err(|e| {
                MemoryError::Storage(format!("Failed to serialize story entry: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        tokio::fs::write(path, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write story db: {e}")))?;

        debug!(path = %path.display(), count = self.entries.len(), "Story database saved");
        Ok(())
    }

    async fn init_from_docs(
        &mut self,
        embeddings: Vec<Vec<f32>>,
        texts: Vec<String>,
    ) -> Result<(), MemoryError> {
        if embeddings.len() != texts.len() {
            return Err(MemoryError::Storage(format!(
                "{} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        if let Some(first) = embeddings.first() {
            let dim = first.len();
            if let Some(bad) = embeddings.iter().position(|e| e.len() != dim) {
                return Err(MemoryError::Storage(format!(
                    "embedding {bad} has dimension {}, expected {dim}",
                    embeddings[bad].len()
                )));
            }
        }

        self.entries = embeddings
            .into_iter()
            .zip(texts)
            .map(|(embedding, text)| StoryEntry { text, embedding })
            .collect();
        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<String>, MemoryError> {
        let ranked = rank_by_similarity(&self.entries, query_embedding, k);
        Ok(ranked
            .into_iter()
            .map(|(i, _)| self.entries[i].text.clone())
            .collect())
    }

    async fn len(&self) -> Result<usize, MemoryError> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryStoryStore {
        let mut store = InMemoryStoryStore::new();
        store
            .init_from_docs(
                vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
                vec!["clubroom".into(), "rooftop".into(), "station".into()],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn search_returns_best_first() {
        let store = seeded().await;
        let results = store.search(&[1.0, 0.1], 2).await.unwrap();
        assert_eq!(results, vec!["clubroom", "station"]);
    }

    #[tokio::test]
    async fn search_on_empty_store() {
        let store = InMemoryStoryStore::new();
        assert!(store.search(&[1.0, 0.0], 19).await.unwrap().is_empty());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn init_replaces_contents() {
        let mut store = seeded().await;
        store
            .init_from_docs(vec![vec![1.0]], vec!["only".into()])
            .await
            .unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn init_rejects_length_mismatch() {
        let mut store = InMemoryStoryStore::new();
        let err = store
            .init_from_docs(vec![vec![1.0]], vec!["a".into(), "b".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Storage(_)));
    }

    #[tokio::test]
    async fn init_rejects_mixed_dimensions() {
        let mut store = InMemoryStoryStore::new();
        let err = store
            .init_from_docs(vec![vec![1.0, 0.0], vec![1.0]], vec!["a".into(), "b".into()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension"));
    }

    #[tokio::test]
    async fn save_then_load_reproduces_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("story.jsonl");

        let store = seeded().await;
        store.save(&path).await.unwrap();

        let loaded = InMemoryStoryStore::open(&path).await.unwrap();
        assert_eq!(loaded.entries(), store.entries());

        for query in [[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]] {
            assert_eq!(
                loaded.search(&query, 3).await.unwrap(),
                store.search(&query, 3).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn load_skips_corrupted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.jsonl");
        std::fs::write(
            &path,
            "{\"text\":\"good\",\"embedding\":[1.0]}\nnot json\n\n{\"text\":\"also good\",\"embedding\":[0.5]}\n",
        )
        .unwrap();

        let store = InMemoryStoryStore::open(&path).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(store.entries()[1].text, "also good");
    }

    #[tokio::test]
    async fn load_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = InMemoryStoryStore::open(&dir.path().join("missing.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::SourceUnreadable { .. }));
    }
}
