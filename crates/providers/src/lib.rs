//! LLM backends for rolecast.
//!
//! - [`OpenAiCompatProvider`] implements `rolecast_core::Provider` over HTTP.
//! - [`BufferedChatClient`] and [`PrintChatClient`] implement the stateful
//!   `ChatClient` contract the session drives.
//! - [`ProviderEmbedder`] and [`HeuristicTokenizer`] are the default
//!   embedding and token-counting adapters.
//! - [`BackendRegistry`] maps a backend name to everything a session needs.

pub mod chat_client;
pub mod embedder;
pub mod openai_compat;
pub mod registry;
pub mod tokenizer;

pub use chat_client::{BufferedChatClient, PrintChatClient};
pub use embedder::ProviderEmbedder;
pub use openai_compat::OpenAiCompatProvider;
pub use registry::{BackendProfile, BackendRegistry, ClientFactory, check_backends};
pub use tokenizer::HeuristicTokenizer;
