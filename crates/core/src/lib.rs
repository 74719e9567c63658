//! # rolecast core
//!
//! Domain types, collaborator traits, and error definitions for the rolecast
//! role-play chat orchestrator. This crate has **no framework dependencies**:
//! it defines the narrow contracts the orchestrator talks to.
//!
//! ## Collaborators
//!
//! Every external service is a trait here. Implementations live in their
//! respective crates:
//! - [`Provider`]: LLM transport (`rolecast-providers`)
//! - [`ChatClient`]: stateful message buffer on top of a provider
//! - [`Embedder`] / [`Tokenizer`]: text → vector / text → token count
//! - [`StoryStore`]: vector store of story passages (`rolecast-memory`)

pub mod error;
pub mod message;
pub mod dialogue;
pub mod provider;
pub mod chat;
pub mod embedding;
pub mod tokenizer;
pub mod story;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use dialogue::{History, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use chat::{ChatClient, Completion};
pub use embedding::Embedder;
pub use tokenizer::Tokenizer;
pub use story::{StoryEntry, StoryStore};
