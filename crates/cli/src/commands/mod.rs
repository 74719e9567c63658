pub mod build_db;
pub mod chat;
pub mod config_cmd;
pub mod onboard;

use rolecast_config::AppConfig;

/// Fail early with setup instructions when no embedding key is available.
pub(crate) fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.provider_api_key("openai").is_some() {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Story retrieval embeds every query, so an OpenAI key is required.");
    eprintln!("  Set one of these environment variables:");
    eprintln!("    ROLECAST_API_KEY = 'sk-...'");
    eprintln!("    OPENAI_API_KEY   = 'sk-...'");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}
