//! Story folder loader: one passage per `.txt` file.

use rolecast_core::embedding::Embedder;
use rolecast_core::error::MemoryError;
use rolecast_core::story::StoryStore;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read every `.txt` file in `folder` as one UTF-8 passage.
///
/// Files are returned in sorted file-name order. Subdirectories and other
/// extensions are ignored.
pub async fn read_story_texts(folder: &Path) -> Result<Vec<String>, MemoryError> {
    let unreadable = |path: &Path, e: std::io::Error| MemoryError::SourceUnreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut dir = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| unreadable(folder, e))?;

    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(|e| unreadable(folder, e))? {
        let path = entry.path();
        let is_txt = path.extension().is_some_and(|ext| ext == "txt");
        if is_txt && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut texts = Vec::with_capacity(files.len());
    for path in &files {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| unreadable(path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "Read story passage");
        texts.push(text);
    }

    Ok(texts)
}

/// Embed every passage in `folder` and seed `store` with them.
///
/// Returns the number of passages stored.
pub async fn seed_from_folder(
    store: &mut dyn StoryStore,
    embedder: &dyn Embedder,
    folder: &Path,
) -> Result<usize, MemoryError> {
    let texts = read_story_texts(folder).await?;

    let mut embeddings = Vec::with_capacity(texts.len());
    for text in &texts {
        embeddings.push(embedder.embed(text).await?);
    }

    let count = texts.len();
    store.init_from_docs(embeddings, texts).await?;
    info!(folder = %folder.display(), passages = count, embedder = embedder.name(), "Story store seeded");
    Ok(count)
}
