//! The session orchestrator.
//!
//! A [`Session`] owns one conversation: the system prompt, the budgets, the
//! history, a chat client and a story store. Each call to
//! [`Session::respond`] runs the full turn:
//!
//! 1. **Reset** the client's message buffer
//! 2. **Assemble** system prompt, story and history; the query drives retrieval
//! 3. **Complete** once
//! 4. **Record** `(query, reply)` in history
//!
//! LLM failures do not abort the turn: the reply is recorded as `""`.

use crate::context::{
    AssemblyInput, AssemblyMetadata, AssemblySettings, ContextAssembler, NarratorAliases,
};
use rolecast_config::{AppConfig, DEFAULT_DIALOGUE_DIVIDER, DEFAULT_K_SEARCH, DEFAULT_STORY_PREFIX};
use rolecast_core::chat::{ChatClient, Completion};
use rolecast_core::dialogue::{History, Turn};
use rolecast_core::embedding::Embedder;
use rolecast_core::error::{Error, ProviderError, Result};
use rolecast_core::message::Role;
use rolecast_core::story::StoryStore;
use rolecast_core::tokenizer::Tokenizer;
use rolecast_memory::{InMemoryStoryStore, seed_from_folder};
use rolecast_providers::BackendRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// The two token budgets of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
    pub story: usize,
    pub history: usize,
}

/// The full record of one turn.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The formatted query stored in history.
    pub query: String,
    /// The reply stored in history; empty when the completion failed.
    pub reply: String,
    /// Why the completion failed, if it did.
    pub failure: Option<ProviderError>,
    pub metadata: AssemblyMetadata,
}

/// One role-play conversation.
pub struct Session {
    system_prompt: String,
    assembler: ContextAssembler,
    store: Box<dyn StoryStore>,
    client: Box<dyn ChatClient>,
    embedder: Arc<dyn Embedder>,
    tokenizer: Arc<dyn Tokenizer>,
    history: History,
    backend: String,
}

impl Session {
    pub fn builder(system_prompt: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(system_prompt)
    }

    /// Respond to `text` spoken by `speaker`.
    pub async fn respond(&mut self, text: &str, speaker: &str) -> Result<String> {
        Ok(self.exchange(text, speaker).await?.reply)
    }

    /// Like [`respond`](Self::respond), but returns the whole turn record.
    pub async fn exchange(&mut self, text: &str, speaker: &str) -> Result<Exchange> {
        self.client.initialize_message();

        let context = self
            .assembler
            .assemble(AssemblyInput {
                system_prompt: &self.system_prompt,
                text,
                speaker,
                history: &self.history,
                store: self.store.as_ref(),
                embedder: self.embedder.as_ref(),
                tokenizer: self.tokenizer.as_ref(),
            })
            .await?;

        for message in &context.messages {
            match message.role {
                Role::System => self.client.system_message(&message.content),
                Role::User => self.client.user_message(&message.content),
                Role::Assistant => self.client.ai_message(&message.content),
            }
        }

        let (reply, failure) = match self.client.get_response().await {
            Completion::Reply(reply) => (reply, None),
            Completion::Failed(e) => {
                warn!(backend = %self.backend, error = %e, "LLM call failed, recording empty reply");
                (String::new(), Some(e))
            }
        };

        self.history.push(Turn::new(context.query.clone(), reply.clone()));

        Ok(Exchange {
            query: context.query,
            reply,
            failure,
            metadata: context.metadata,
        })
    }

    /// Persist the story store to `path`.
    pub async fn save_story_db(&self, path: &Path) -> Result<()> {
        self.store.save(path).await?;
        info!(path = %path.display(), "Story database saved");
        Ok(())
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Name of the backend actually in use (after any fallback).
    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn budgets(&self) -> Budgets {
        let settings = self.assembler.settings();
        Budgets {
            story: settings.max_story_tokens,
            history: settings.max_history_tokens,
        }
    }

    pub fn story_store(&self) -> &dyn StoryStore {
        self.store.as_ref()
    }

    pub fn client(&self) -> &dyn ChatClient {
        self.client.as_ref()
    }
}

/// Builds a [`Session`].
///
/// Exactly one story source is used. When several are given, the store
/// handle wins over the database path, which wins over the text folder.
pub struct SessionBuilder {
    system_prompt: String,
    store: Option<Box<dyn StoryStore>>,
    story_db: Option<PathBuf>,
    story_folder: Option<PathBuf>,
    backend: Option<String>,
    max_story_tokens: Option<usize>,
    max_history_tokens: Option<usize>,
    k_search: usize,
    story_prefix: String,
    divider: String,
    narrators: NarratorAliases,
}

impl SessionBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            store: None,
            story_db: None,
            story_folder: None,
            backend: None,
            max_story_tokens: None,
            max_history_tokens: None,
            k_search: DEFAULT_K_SEARCH,
            story_prefix: DEFAULT_STORY_PREFIX.into(),
            divider: DEFAULT_DIALOGUE_DIVIDER.into(),
            narrators: NarratorAliases::default(),
        }
    }

    /// Start from the `[session]` section of the configuration.
    ///
    /// The backend is left unset so the registry default applies.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let session = &config.session;
        let system_prompt = session
            .resolve_system_prompt()
            .map_err(|e| Error::config(e.to_string()))?
            .unwrap_or_default();

        Ok(Self {
            system_prompt,
            store: None,
            story_db: session.story_db.clone(),
            story_folder: session.story_folder.clone(),
            backend: None,
            max_story_tokens: session.max_story_tokens,
            max_history_tokens: session.max_history_tokens,
            k_search: session.k_search,
            story_prefix: session.story_prefix.clone(),
            divider: session.dialogue_divider.clone(),
            narrators: NarratorAliases::new(session.narrator_aliases.iter().cloned()),
        })
    }

    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn story_store(mut self, store: Box<dyn StoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn story_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.story_db = Some(path.into());
        self
    }

    pub fn story_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.story_folder = Some(folder.into());
        self
    }

    pub fn backend(mut self, name: impl Into<String>) -> Self {
        self.backend = Some(name.into());
        self
    }

    pub fn max_story_tokens(mut self, tokens: usize) -> Self {
        self.max_story_tokens = Some(tokens);
        self
    }

    pub fn max_history_tokens(mut self, tokens: usize) -> Self {
        self.max_history_tokens = Some(tokens);
        self
    }

    pub fn k_search(mut self, k: usize) -> Self {
        self.k_search = k;
        self
    }

    pub fn story_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.story_prefix = prefix.into();
        self
    }

    pub fn divider(mut self, divider: impl Into<String>) -> Self {
        self.divider = divider.into();
        self
    }

    pub fn narrators(mut self, narrators: NarratorAliases) -> Self {
        self.narrators = narrators;
        self
    }

    /// Resolve the backend, open or seed the story store, and build the session.
    pub async fn build(self, registry: &BackendRegistry) -> Result<Session> {
        let profile = registry.resolve(self.backend.as_deref()).ok_or_else(|| {
            Error::config(format!(
                "no usable backend: default '{}' is not registered",
                registry.default_backend()
            ))
        })?;

        let store: Box<dyn StoryStore> = match (self.store, self.story_db, self.story_folder) {
            (Some(store), db, folder) => {
                if db.is_some() || folder.is_some() {
                    info!("Story store handle given; ignoring story database and folder");
                }
                store
            }
            (None, Some(db), folder) => {
                if folder.is_some() {
                    info!("Story database given; ignoring story folder");
                }
                Box::new(InMemoryStoryStore::open(&db).await?)
            }
            (None, None, Some(folder)) => {
                let mut store = InMemoryStoryStore::new();
                seed_from_folder(&mut store, profile.embedder.as_ref(), &folder).await?;
                Box::new(store)
            }
            (None, None, None) => {
                return Err(Error::config(
                    "a story source is required: a store handle, a story database, or a text folder",
                ));
            }
        };

        let settings = AssemblySettings {
            max_story_tokens: self.max_story_tokens.unwrap_or(profile.default_story_budget),
            max_history_tokens: self
                .max_history_tokens
                .unwrap_or(profile.default_history_budget),
            k_search: self.k_search,
            story_prefix: self.story_prefix,
            divider: self.divider,
            narrators: self.narrators,
        };

        info!(
            backend = %profile.name,
            store = store.name(),
            max_story_tokens = settings.max_story_tokens,
            max_history_tokens = settings.max_history_tokens,
            "Session ready"
        );

        Ok(Session {
            system_prompt: self.system_prompt,
            assembler: ContextAssembler::new(settings),
            store,
            client: profile.new_client(),
            embedder: profile.embedder.clone(),
            tokenizer: profile.tokenizer.clone(),
            history: History::new(),
            backend: profile.name.clone(),
        })
    }
}
