//! Backend registry: maps a backend name to a client factory, embedder,
//! tokenizer and default budgets.
//!
//! Unknown names resolve to the default backend with a warning.

use std::collections::HashMap;
use std::sync::Arc;

use rolecast_config::AppConfig;
use rolecast_core::chat::ChatClient;
use rolecast_core::embedding::Embedder;
use rolecast_core::error::ProviderError;
use rolecast_core::provider::Provider;
use rolecast_core::tokenizer::Tokenizer;
use tracing::warn;

use crate::chat_client::{BufferedChatClient, PrintChatClient};
use crate::embedder::ProviderEmbedder;
use crate::openai_compat::{MOONSHOT_BASE_URL, OPENAI_BASE_URL, OpenAiCompatProvider};
use crate::tokenizer::HeuristicTokenizer;

/// Builds a fresh chat client for one session.
pub type ClientFactory = Arc<dyn Fn() -> Box<dyn ChatClient> + Send + Sync>;

pub const DEFAULT_STORY_BUDGET: usize = 1500;
pub const DEFAULT_HISTORY_BUDGET: usize = 1200;

const MOONSHOT_DEFAULT_MODEL: &str = "moonshot-v1-8k";

/// Everything a session needs from one backend.
#[derive(Clone)]
pub struct BackendProfile {
    pub name: String,
    pub client_factory: ClientFactory,
    pub embedder: Arc<dyn Embedder>,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub default_story_budget: usize,
    pub default_history_budget: usize,
}

impl BackendProfile {
    pub fn new(
        name: impl Into<String>,
        client_factory: ClientFactory,
        embedder: Arc<dyn Embedder>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Self {
        Self {
            name: name.into(),
            client_factory,
            embedder,
            tokenizer,
            default_story_budget: DEFAULT_STORY_BUDGET,
            default_history_budget: DEFAULT_HISTORY_BUDGET,
        }
    }

    pub fn with_budgets(mut self, story: usize, history: usize) -> Self {
        self.default_story_budget = story;
        self.default_history_budget = history;
        self
    }

    /// Create a new chat client for this backend.
    pub fn new_client(&self) -> Box<dyn ChatClient> {
        (self.client_factory)()
    }
}

impl std::fmt::Debug for BackendProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendProfile")
            .field("name", &self.name)
            .field("embedder", &self.embedder.name())
            .field("tokenizer", &self.tokenizer.name())
            .field("default_story_budget", &self.default_story_budget)
            .field("default_history_budget", &self.default_history_budget)
            .finish()
    }
}

/// Named backend profiles with a default.
pub struct BackendRegistry {
    profiles: HashMap<String, BackendProfile>,
    default_backend: String,
}

impl BackendRegistry {
    pub fn new(default_backend: impl Into<String>) -> Self {
        Self {
            profiles: HashMap::new(),
            default_backend: default_backend.into(),
        }
    }

    /// Register a profile under its own name, replacing any previous one.
    pub fn register(&mut self, profile: BackendProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&BackendProfile> {
        self.profiles.get(name)
    }

    pub fn default_backend(&self) -> &str {
        &self.default_backend
    }

    pub fn default_profile(&self) -> Option<&BackendProfile> {
        self.profiles.get(&self.default_backend)
    }

    /// Resolve a backend by name. `None` or an unknown name yields the default.
    pub fn resolve(&self, name: Option<&str>) -> Option<&BackendProfile> {
        match name {
            None => self.default_profile(),
            Some(name) => match self.profiles.get(name) {
                Some(profile) => Some(profile),
                None => {
                    warn!(
                        requested = name,
                        fallback = %self.default_backend,
                        "Unknown backend, falling back to default"
                    );
                    self.default_profile()
                }
            },
        }
    }

    /// List all registered backend names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build the standard backends from configuration.
///
/// Always registers `openai`, `debug` and `moonshot`. Any other entry under
/// `[providers]` with an `api_url` becomes an OpenAI-compatible backend.
/// Embeddings always go through the OpenAI provider.
pub fn build_from_config(config: &AppConfig) -> BackendRegistry {
    let mut registry = BackendRegistry::new(&config.default_backend);
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(HeuristicTokenizer);

    let openai = openai_compatible(config, "openai", OPENAI_BASE_URL);
    let embedder: Arc<dyn Embedder> = Arc::new(ProviderEmbedder::new(
        openai,
        config.embedding_model.clone(),
    ));

    registry.register(BackendProfile::new(
        "debug",
        Arc::new(|| Box::new(PrintChatClient::new()) as Box<dyn ChatClient>),
        embedder.clone(),
        tokenizer.clone(),
    ));

    for (name, provider) in remote_providers(config) {
        let fallback = if name == "moonshot" {
            MOONSHOT_DEFAULT_MODEL
        } else {
            config.default_model.as_str()
        };
        let model = model_for(config, &name, fallback);
        registry.register(BackendProfile::new(
            name,
            chat_factory(config, provider, model),
            embedder.clone(),
            tokenizer.clone(),
        ));
    }

    registry
}

/// Ping every remote backend. Results follow registration order.
pub async fn check_backends(config: &AppConfig) -> Vec<(String, Result<bool, ProviderError>)> {
    let mut results = Vec::new();
    for (name, provider) in remote_providers(config) {
        let status = provider.health_check().await;
        results.push((name, status));
    }
    results
}

/// `openai`, `moonshot`, then custom `[providers]` entries with an `api_url`
/// in name order.
fn remote_providers(config: &AppConfig) -> Vec<(String, Arc<dyn Provider>)> {
    let mut providers = vec![
        (
            "openai".to_string(),
            openai_compatible(config, "openai", OPENAI_BASE_URL),
        ),
        (
            "moonshot".to_string(),
            openai_compatible(config, "moonshot", MOONSHOT_BASE_URL),
        ),
    ];

    let mut custom: Vec<(&String, &String)> = config
        .providers
        .iter()
        .filter(|(name, _)| !matches!(name.as_str(), "openai" | "moonshot" | "debug"))
        .filter_map(|(name, p)| p.api_url.as_ref().map(|url| (name, url)))
        .collect();
    custom.sort();

    for (name, url) in custom {
        providers.push((name.clone(), openai_compatible(config, name, url)));
    }
    providers
}

fn openai_compatible(config: &AppConfig, name: &str, default_url: &str) -> Arc<dyn Provider> {
    let api_key = config.provider_api_key(name).unwrap_or_default();
    let base_url = config
        .providers
        .get(name)
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_url.to_string());
    Arc::new(OpenAiCompatProvider::new(name, base_url, api_key))
}

fn model_for(config: &AppConfig, name: &str, fallback: &str) -> String {
    config
        .providers
        .get(name)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| fallback.to_string())
}

fn chat_factory(config: &AppConfig, provider: Arc<dyn Provider>, model: String) -> ClientFactory {
    let temperature = config.default_temperature;
    let max_tokens = config.default_max_tokens;
    Arc::new(move || {
        Box::new(
            BufferedChatClient::new(provider.clone(), model.clone())
                .with_temperature(temperature)
                .with_max_tokens(max_tokens),
        ) as Box<dyn ChatClient>
    })
}
