//! `rolecast chat`: Interactive or single-message role-play.

use clap::Args;
use rolecast_agent::{Session, SessionBuilder};
use rolecast_config::AppConfig;
use rolecast_providers::registry::build_from_config;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{self, AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Send a single message instead of entering interactive mode
    #[arg(short, long)]
    pub message: Option<String>,

    /// Who is speaking (a narrator alias such as "旁白" for scene text)
    #[arg(short, long, default_value = "User")]
    pub role: String,

    /// Backend to use (openai, moonshot, debug, ...)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Saved story database to load
    #[arg(long)]
    pub story_db: Option<PathBuf>,

    /// Folder of .txt story passages to embed at startup
    #[arg(long)]
    pub story_folder: Option<PathBuf>,

    /// File containing the character's system prompt
    #[arg(long)]
    pub system_prompt_file: Option<PathBuf>,

    #[arg(long)]
    pub max_story_tokens: Option<usize>,

    #[arg(long)]
    pub max_history_tokens: Option<usize>,

    /// Save the story database here after startup
    #[arg(long)]
    pub save_db: Option<PathBuf>,
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    super::require_api_key(&config)?;

    if let Some(file) = &args.system_prompt_file {
        config.session.system_prompt = None;
        config.session.system_prompt_file = Some(file.clone());
    }
    if let Some(db) = &args.story_db {
        config.session.story_db = Some(db.clone());
    }
    if let Some(folder) = &args.story_folder {
        config.session.story_folder = Some(folder.clone());
    }

    let registry = build_from_config(&config);
    let mut builder = SessionBuilder::from_config(&config)?;
    if let Some(backend) = &args.backend {
        builder = builder.backend(backend);
    }
    if let Some(tokens) = args.max_story_tokens {
        builder = builder.max_story_tokens(tokens);
    }
    if let Some(tokens) = args.max_history_tokens {
        builder = builder.max_history_tokens(tokens);
    }

    let mut session = builder.build(&registry).await?;

    if let Some(path) = &args.save_db {
        session.save_story_db(path).await?;
    }

    if let Some(msg) = args.message {
        eprint!("  Thinking...");
        let exchange = session.exchange(&msg, &args.role).await?;
        eprint!("\r              \r");
        if let Some(e) = &exchange.failure {
            eprintln!("  [LLM call failed] {e}");
        }
        println!("{}", exchange.reply);
        return Ok(());
    }

    interactive(&mut session, args.role).await
}

async fn interactive(session: &mut Session, mut role: String) -> Result<(), Box<dyn std::error::Error>> {
    let budgets = session.budgets();
    let passages = session.story_store().len().await?;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          rolecast: Interactive Mode          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Backend:   {}", session.backend());
    println!("  Story:     {passages} passages");
    println!("  Budgets:   story {} / history {} tokens", budgets.story, budgets.history);
    println!("  Speaking:  {role}");
    println!();
    println!("  Type your line and press Enter.");
    println!("  '/role NAME' changes speaker; 'exit' or Ctrl+C quits.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    prompt(&role)?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt(&role)?;
            continue;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }
        if let Some(name) = line.strip_prefix("/role") {
            role = name.trim().to_string();
            println!("  Now speaking as: {role:?}");
            prompt(&role)?;
            continue;
        }

        eprint!("  ...");
        match session.exchange(line, &role).await {
            Ok(exchange) => {
                eprint!("\r     \r");
                if let Some(e) = &exchange.failure {
                    eprintln!("  [LLM call failed] {e}");
                }
                println!();
                for reply_line in exchange.reply.lines() {
                    println!("  > {reply_line}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        prompt(&role)?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn prompt(role: &str) -> std::io::Result<()> {
    print!("  {role} > ");
    std::io::stdout().flush()
}
