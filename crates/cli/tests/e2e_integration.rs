//! End-to-end tests for the rolecast pipeline.
//!
//! These wire the real config, backend registry, OpenAI-compatible provider,
//! story store and session together against a mock HTTP server.

use rolecast_agent::{Session, SessionBuilder};
use rolecast_config::{AppConfig, ProviderConfig};
use rolecast_core::error::{Error, MemoryError};
use rolecast_core::story::StoryStore;
use rolecast_memory::{InMemoryStoryStore, seed_from_folder};
use rolecast_providers::registry::build_from_config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ── Mock OpenAI server ───────────────────────────────────────────────────

async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": [1.0, 0.0, 0.5], "index": 0}],
            "model": "text-embedding-ada-002",
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        })))
        .mount(server)
        .await;
}

async fn mount_chat(server: &MockServer, status: u16, reply: &str) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "gpt-3.5-turbo",
            "choices": [{"message": {"role": "assistant", "content": reply}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 6, "total_tokens": 46}
        }))
    } else {
        ResponseTemplate::new(status).set_body_string(reply)
    };
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(template)
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.api_key = Some("sk-test".into());
    config.providers.insert(
        "openai".into(),
        ProviderConfig {
            api_url: Some(server.uri()),
            ..Default::default()
        },
    );
    config.session.system_prompt = Some("You are Haruhi Suzumiya.".into());
    config
}

fn story_folder() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("01.txt"), "Haruhi kicks open the clubroom door.").unwrap();
    std::fs::write(dir.path().join("02.txt"), "Kyon sighs on the hill road.").unwrap();
    dir
}

async fn chat_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r: &&Request| r.url.path() == "/chat/completions")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

async fn session_for(config: &AppConfig) -> Session {
    SessionBuilder::from_config(config)
        .unwrap()
        .build(&build_from_config(config))
        .await
        .unwrap()
}

// ── E2E ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_two_turns_over_openai_backend() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;
    mount_chat(&server, 200, "Haruhi:「You're late!」").await;

    let folder = story_folder();
    let mut config = config_for(&server);
    config.session.story_folder = Some(folder.path().to_path_buf());

    let mut session = session_for(&config).await;
    assert_eq!(session.backend(), "openai");

    let first = session.respond("Good morning", "Kyon").await.unwrap();
    assert_eq!(first, "Haruhi:「You're late!」");
    session.respond("The bell is ringing.", "旁白").await.unwrap();

    let queries: Vec<&str> = session.history().iter().map(|t| t.query()).collect();
    assert_eq!(queries, vec!["Kyon:「Good morning」", ":The bell is ringing."]);

    let bodies = chat_bodies(&server).await;
    assert_eq!(bodies.len(), 2);

    let second = bodies[1]["messages"].as_array().unwrap();
    let roles: Vec<&str> = second.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, vec!["system", "user", "user", "assistant"]);
    assert_eq!(second[0]["content"], "You are Haruhi Suzumiya.");
    let story = second[1]["content"].as_str().unwrap();
    assert!(story.starts_with("Classic scenes for the role are as follows:"));
    assert!(story.contains("clubroom door.\n###\n"));
    assert_eq!(second[2]["content"], "Kyon:「Good morning」");
    assert_eq!(second[3]["content"], "Haruhi:「You're late!」");
}

#[tokio::test]
async fn e2e_llm_error_records_empty_turn() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;
    mount_chat(&server, 500, "upstream overloaded").await;

    let folder = story_folder();
    let mut config = config_for(&server);
    config.session.story_folder = Some(folder.path().to_path_buf());

    let mut session = session_for(&config).await;
    let exchange = session.exchange("Hello?", "Kyon").await.unwrap();

    assert_eq!(exchange.reply, "");
    assert!(exchange.failure.is_some());
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().last().unwrap().response(), "");
}

#[tokio::test]
async fn e2e_embedding_failure_is_fatal_for_turn() {
    let server = MockServer::start().await;
    mount_chat(&server, 200, "unused").await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("story.jsonl");
    let mut store = InMemoryStoryStore::new();
    store
        .init_from_docs(vec![vec![1.0, 0.0]], vec!["a scene".into()])
        .await
        .unwrap();
    store.save(&db).await.unwrap();

    let mut config = config_for(&server);
    config.session.story_db = Some(db);

    let mut session = session_for(&config).await;
    let err = session.respond("Hi", "Kyon").await.unwrap_err();

    assert!(matches!(err, Error::Memory(MemoryError::EmbeddingFailed(_))));
    assert!(session.history().is_empty());
    assert!(chat_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn e2e_build_db_then_chat_from_db() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;
    mount_chat(&server, 200, "Hmph.").await;

    let folder = story_folder();
    let out = tempfile::tempdir().unwrap();
    let db = out.path().join("haruhi.jsonl");
    let config = config_for(&server);

    // Same steps as `rolecast build-db`.
    let registry = build_from_config(&config);
    let profile = registry.resolve(None).unwrap();
    let mut store = InMemoryStoryStore::new();
    let count = seed_from_folder(&mut store, profile.embedder.as_ref(), folder.path())
        .await
        .unwrap();
    store.save(&db).await.unwrap();
    assert_eq!(count, 2);

    let mut config = config;
    config.session.story_db = Some(db);
    let mut session = session_for(&config).await;

    assert_eq!(session.story_store().len().await.unwrap(), 2);
    assert_eq!(session.respond("Hi", "Kyon").await.unwrap(), "Hmph.");
}

#[tokio::test]
async fn e2e_unknown_backend_uses_openai_defaults() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;
    mount_chat(&server, 200, "ok").await;

    let folder = story_folder();
    let config = config_for(&server);
    let session = SessionBuilder::from_config(&config)
        .unwrap()
        .story_folder(folder.path())
        .backend("gpt-99")
        .build(&build_from_config(&config))
        .await
        .unwrap();

    assert_eq!(session.backend(), "openai");
    let budgets = session.budgets();
    assert_eq!((budgets.story, budgets.history), (1500, 1200));
}

#[tokio::test]
async fn e2e_no_story_source_is_config_error() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    let err = SessionBuilder::from_config(&config)
        .unwrap()
        .build(&build_from_config(&config))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn e2e_config_round_trip_through_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_backend = "debug"

[session]
system_prompt = "You are Kyon."
story_folder = "/tmp/stories"
max_history_tokens = 600
narrator_aliases = ["旁白", "narrator"]
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.default_backend, "debug");
    assert_eq!(config.session.max_history_tokens, Some(600));
    assert_eq!(config.session.k_search, 19);

    let registry = build_from_config(&config);
    assert_eq!(registry.resolve(None).unwrap().name, "debug");
}
