//! `rolecast onboard`: First-time setup.

use rolecast_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let stories_dir = config_dir.join("stories");

    println!("🎭 rolecast: First-Time Setup");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !stories_dir.exists() {
        std::fs::create_dir_all(&stories_dir)?;
        println!("✅ Created story folder: {}", stories_dir.display());
    }

    let prompt_path = config_dir.join("system_prompt.txt");
    if !prompt_path.exists() {
        std::fs::write(
            &prompt_path,
            concat!(
                "You are playing a character from a story.\n",
                "Stay in character and answer in the character's voice.\n",
                "Use the classic scenes provided as reference for tone and facts.\n",
            ),
        )?;
        println!("✅ Created system_prompt.txt");
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set OPENAI_API_KEY or edit {}", config_path.display());
        println!("   2. Put one scene per .txt file in {}", stories_dir.display());
        println!(
            "   3. Run: rolecast chat --story-folder {} --system-prompt-file {}\n",
            stories_dir.display(),
            prompt_path.display()
        );
    }

    println!("🎉 Setup complete!\n");

    Ok(())
}
