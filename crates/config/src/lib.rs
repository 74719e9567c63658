//! Configuration loading, validation, and management for rolecast.
//!
//! Loads configuration from `~/.rolecast/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default prefix placed at the top of every story block.
pub const DEFAULT_STORY_PREFIX: &str = "Classic scenes for the role are as follows:";

/// Default divider appended after every story passage.
pub const DEFAULT_DIALOGUE_DIVIDER: &str = "\n###\n";

/// Default number of passages retrieved per query.
pub const DEFAULT_K_SEARCH: usize = 19;

/// The root configuration structure.
///
/// Maps directly to `~/.rolecast/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key shared by providers that don't set their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Backend selector (see the backend registry)
    #[serde(default = "default_backend")]
    pub default_backend: String,

    /// Chat model used by the `openai` backend
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Embedding model used for story retrieval
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per LLM response (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Role-play session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_backend() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_backend", &self.default_backend)
            .field("default_model", &self.default_model)
            .field("embedding_model", &self.embedding_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("session", &self.session)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Settings for a role-play session: prompt, story source, budgets, formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inline system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// File containing the system prompt (used when `system_prompt` is unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_file: Option<PathBuf>,

    /// Saved story database to load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_db: Option<PathBuf>,

    /// Folder of `.txt` passages to embed at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_folder: Option<PathBuf>,

    /// Story budget override (backend default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_story_tokens: Option<usize>,

    /// History budget override (backend default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_tokens: Option<usize>,

    #[serde(default = "default_k_search")]
    pub k_search: usize,

    #[serde(default = "default_story_prefix")]
    pub story_prefix: String,

    #[serde(default = "default_dialogue_divider")]
    pub dialogue_divider: String,

    /// Speaker names treated as the narrator
    #[serde(default = "default_narrator_aliases")]
    pub narrator_aliases: Vec<String>,
}

fn default_k_search() -> usize {
    DEFAULT_K_SEARCH
}
fn default_story_prefix() -> String {
    DEFAULT_STORY_PREFIX.into()
}
fn default_dialogue_divider() -> String {
    DEFAULT_DIALOGUE_DIVIDER.into()
}

/// The built-in narrator aliases.
pub fn default_narrator_aliases() -> Vec<String> {
    ["旁白", "", "scene", "Scene", "narrator", "Narrator"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            system_prompt_file: None,
            story_db: None,
            story_folder: None,
            max_story_tokens: None,
            max_history_tokens: None,
            k_search: default_k_search(),
            story_prefix: default_story_prefix(),
            dialogue_divider: default_dialogue_divider(),
            narrator_aliases: default_narrator_aliases(),
        }
    }
}

impl SessionConfig {
    /// Resolve the system prompt: inline text first, then the prompt file.
    pub fn resolve_system_prompt(&self) -> Result<Option<String>, ConfigError> {
        if let Some(prompt) = &self.system_prompt {
            return Ok(Some(prompt.clone()));
        }
        match &self.system_prompt_file {
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .map_err(|e| ConfigError::ReadError {
                    path: path.clone(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.rolecast/config.toml).
    ///
    /// Also checks environment variables:
    /// - `ROLECAST_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `MOONSHOT_API_KEY` for the moonshot provider
    /// - `ROLECAST_BACKEND`, `ROLECAST_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("ROLECAST_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(key) = std::env::var("MOONSHOT_API_KEY") {
            let moonshot = self.providers.entry("moonshot".into()).or_default();
            if moonshot.api_key.is_none() {
                moonshot.api_key = Some(key);
            }
        }

        if let Ok(backend) = std::env::var("ROLECAST_BACKEND") {
            self.default_backend = backend;
        }

        if let Ok(model) = std::env::var("ROLECAST_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".rolecast")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.session.k_search == 0 {
            return Err(ConfigError::ValidationError(
                "session.k_search must be at least 1".into(),
            ));
        }

        if self.session.dialogue_divider.is_empty() {
            return Err(ConfigError::ValidationError(
                "session.dialogue_divider must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// API key for a named provider: provider-specific key first, then the shared key.
    pub fn provider_api_key(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_backend: default_backend(),
            default_model: default_model(),
            embedding_model: default_embedding_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            session: SessionConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
