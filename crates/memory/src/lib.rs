//! Story store implementations for rolecast.

pub mod loader;
pub mod story_store;
pub mod vector;

pub use loader::{read_story_texts, seed_from_folder};
pub use story_store::InMemoryStoryStore;
pub use vector::{cosine_similarity, rank_by_similarity};
