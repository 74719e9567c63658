//! `rolecast build-db`: Embed a story folder and save it.

use rolecast_config::AppConfig;
use rolecast_core::story::StoryStore;
use rolecast_memory::{InMemoryStoryStore, seed_from_folder};
use rolecast_providers::registry::build_from_config;
use std::path::PathBuf;

pub async fn run(
    folder: PathBuf,
    output: PathBuf,
    backend: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    super::require_api_key(&config)?;

    let registry = build_from_config(&config);
    let profile = registry
        .resolve(backend.as_deref())
        .ok_or("No usable backend configured")?;

    println!("📚 Embedding passages from {} ...", folder.display());
    let mut store = InMemoryStoryStore::new();
    let count = seed_from_folder(&mut store, profile.embedder.as_ref(), &folder).await?;
    store.save(&output).await?;

    println!("✅ Saved {count} passages to {}", output.display());
    println!("   Embedder: {}", profile.embedder.name());
    Ok(())
}
