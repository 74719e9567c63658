//! Shared test doubles for assembler and session tests.

use async_trait::async_trait;
use rolecast_core::chat::{ChatClient, Completion};
use rolecast_core::embedding::Embedder;
use rolecast_core::error::{MemoryError, TokenizerError};
use rolecast_core::message::Message;
use rolecast_core::story::StoryStore;
use rolecast_core::tokenizer::Tokenizer;
use rolecast_memory::InMemoryStoryStore;
use rolecast_providers::{BackendProfile, BackendRegistry};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const KEYWORDS: [&str; 3] = ["clubroom", "rooftop", "station"];

pub const PASSAGES: [&str; 3] = [
    "Haruhi paces the clubroom.",
    "Kyon waits on the rooftop.",
    "Mikuru arrives at the station.",
];

/// Counts whitespace-separated words.
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn name(&self) -> &str {
        "words"
    }

    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(text.split_whitespace().count())
    }
}

pub struct FailingTokenizer;

impl Tokenizer for FailingTokenizer {
    fn name(&self) -> &str {
        "failing"
    }

    fn count_tokens(&self, _text: &str) -> Result<usize, TokenizerError> {
        Err(TokenizerError::Unavailable("vocabulary missing".into()))
    }
}

/// One dimension per keyword, plus a small constant so no vector is zero.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keywords"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let mut v: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| if text.contains(k) { 1.0 } else { 0.0 })
            .collect();
        v.push(0.1);
        Ok(v)
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, MemoryError> {
        Err(MemoryError::EmbeddingFailed("401 Unauthorized".into()))
    }
}

/// A store whose search always fails.
pub struct UnreachableStore;

#[async_trait]
impl StoryStore for UnreachableStore {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn load(&mut self, _path: &Path) -> Result<(), MemoryError> {
        Err(MemoryError::Storage("unreachable".into()))
    }

    async fn save(&self, _path: &Path) -> Result<(), MemoryError> {
        Err(MemoryError::Storage("unreachable".into()))
    }

    async fn init_from_docs(
        &mut self,
        _embeddings: Vec<Vec<f32>>,
        _texts: Vec<String>,
    ) -> Result<(), MemoryError> {
        Err(MemoryError::Storage("unreachable".into()))
    }

    async fn search(&self, _query_embedding: &[f32], _k: usize) -> Result<Vec<String>, MemoryError> {
        Err(MemoryError::QueryFailed("connection refused".into()))
    }

    async fn len(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }
}

/// A store seeded with [`PASSAGES`], embedded by [`KeywordEmbedder`].
pub async fn seeded_store() -> InMemoryStoryStore {
    let mut embeddings = Vec::new();
    for passage in PASSAGES {
        embeddings.push(KeywordEmbedder.embed(passage).await.unwrap());
    }
    let mut store = InMemoryStoryStore::new();
    store
        .init_from_docs(embeddings, PASSAGES.iter().map(|p| p.to_string()).collect())
        .await
        .unwrap();
    store
}

/// Shared script and call log behind every [`ScriptedChatClient`] a factory makes.
#[derive(Clone, Default)]
pub struct Script {
    replies: Arc<Mutex<VecDeque<Completion>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl Script {
    pub fn new(replies: Vec<Completion>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::default(),
        }
    }

    /// Buffers sent on each `get_response`, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

/// A chat client that answers from a [`Script`]. Replies `""` once the
/// script runs out.
pub struct ScriptedChatClient {
    script: Script,
    buffer: Vec<Message>,
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn initialize_message(&mut self) {
        self.buffer.clear();
    }

    fn system_message(&mut self, text: &str) {
        self.buffer.push(Message::system(text));
    }

    fn user_message(&mut self, text: &str) {
        self.buffer.push(Message::user(text));
    }

    fn ai_message(&mut self, text: &str) {
        self.buffer.push(Message::assistant(text));
    }

    fn messages(&self) -> &[Message] {
        &self.buffer
    }

    async fn get_response(&mut self) -> Completion {
        self.script.calls.lock().unwrap().push(self.buffer.clone());
        self.script
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Completion::Reply(String::new()))
    }
}

/// A registry whose only backend, `scripted`, is the default.
pub fn scripted_registry(script: &Script) -> BackendRegistry {
    let script = script.clone();
    let mut registry = BackendRegistry::new("scripted");
    registry.register(
        BackendProfile::new(
            "scripted",
            Arc::new(move || {
                Box::new(ScriptedChatClient {
                    script: script.clone(),
                    buffer: Vec::new(),
                }) as Box<dyn ChatClient>
            }),
            Arc::new(KeywordEmbedder),
            Arc::new(WordTokenizer),
        )
        .with_budgets(100, 50),
    );
    registry
}
