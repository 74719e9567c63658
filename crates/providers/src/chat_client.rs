//! Chat clients: message buffers that turn into one completion request.

use async_trait::async_trait;
use rolecast_core::chat::{ChatClient, Completion};
use rolecast_core::message::{Message, Role};
use rolecast_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// A chat client that buffers messages and sends them to a [`Provider`].
///
/// Provider errors never escape `get_response`; they are logged and
/// returned as [`Completion::Failed`].
pub struct BufferedChatClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    buffer: Vec<Message>,
}

impl BufferedChatClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            buffer: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn push(&mut self, role: Role, text: &str) {
        self.buffer.push(Message::new(role, text));
    }
}

#[async_trait]
impl ChatClient for BufferedChatClient {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn initialize_message(&mut self) {
        self.buffer.clear();
    }

    fn system_message(&mut self, text: &str) {
        self.push(Role::System, text);
    }

    fn user_message(&mut self, text: &str) {
        self.push(Role::User, text);
    }

    fn ai_message(&mut self, text: &str) {
        self.push(Role::Assistant, text);
    }

    fn messages(&self) -> &[Message] {
        &self.buffer
    }

    async fn get_response(&mut self) -> Completion {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: self.buffer.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: vec![],
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    debug!(
                        provider = %self.provider.name(),
                        model = %response.model,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Completion received"
                    );
                }
                Completion::Reply(response.message.content)
            }
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "Completion failed");
                Completion::Failed(e)
            }
        }
    }
}

/// A debug client: prints the buffered prompt to stdout and replies with nothing.
#[derive(Default)]
pub struct PrintChatClient {
    buffer: Vec<Message>,
}

impl PrintChatClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatClient for PrintChatClient {
    fn name(&self) -> &str {
        "debug"
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
        println!("{}", self.render_prompt());
        Completion::Reply(String::new())
    }
}
