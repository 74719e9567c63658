//! `rolecast config`: Configuration management commands.

use rolecast_config::AppConfig;
use rolecast_providers::check_backends;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if config.provider_api_key("openai").is_none() {
                warnings.push("No OpenAI API key set (needed for story embeddings)".to_string());
            }

            if config.default_backend == "moonshot" && config.provider_api_key("moonshot").is_none() {
                warnings.push("Default backend is moonshot but no Moonshot key is set".to_string());
            }

            let session = &config.session;
            if session.story_db.is_none() && session.story_folder.is_none() {
                warnings.push("No story_db or story_folder in [session]; pass one to `chat`".to_string());
            }

            for (label, path) in [
                ("story_db", &session.story_db),
                ("story_folder", &session.story_folder),
                ("system_prompt_file", &session.system_prompt_file),
            ] {
                if let Some(path) = path {
                    if !path.exists() {
                        warnings.push(format!("{label} does not exist: {}", path.display()));
                    }
                }
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            let budget = |b: Option<usize>| b.map_or_else(|| "backend default".to_string(), |n| n.to_string());

            println!();
            println!("   Backend:   {}", config.default_backend);
            println!("   Model:     {}", config.default_model);
            println!("   Embedding: {}", config.embedding_model);
            println!("   Story:     {} tokens", budget(session.max_story_tokens));
            println!("   History:   {} tokens", budget(session.max_history_tokens));
            println!("   k_search:  {}", session.k_search);
            println!("   Narrators: {:?}", session.narrator_aliases);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    // Never print secrets.
    if config.api_key.is_some() {
        config.api_key = Some("***".into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("***".into());
        }
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn check() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("🩺 Checking backends...");

    let mut unreachable = 0;
    for (name, status) in check_backends(&config).await {
        match status {
            Ok(true) => println!("   ✅ {name}"),
            Ok(false) => {
                unreachable += 1;
                println!("   ⚠️  {name}: endpoint answered with an error (check the API key)");
            }
            Err(e) => {
                unreachable += 1;
                println!("   ❌ {name}: {e}");
            }
        }
    }

    if unreachable > 0 {
        println!();
        println!("   {unreachable} backend(s) unavailable; `debug` needs no network.");
    }
    Ok(())
}
