//! Chat client: a stateful message buffer with a single-shot completion.
//!
//! The session orchestrator resets the buffer at the start of every turn,
//! pushes the assembled fragments in order, then asks for one completion.

use async_trait::async_trait;
use crate::error::ProviderError;
use crate::message::Message;

/// Outcome of a completion request.
///
/// LLM failures are caught at the client boundary and surfaced as a value,
/// not an error; the caller decides what to record.
#[derive(Debug, Clone)]
pub enum Completion {
    /// The model produced a reply.
    Reply(String),
    /// The request failed; no reply text is available.
    Failed(ProviderError),
}

impl Completion {
    /// Reply text, or the empty string when the request failed.
    pub fn into_text(self) -> String {
        match self {
            Completion::Reply(text) => text,
            Completion::Failed(_) => String::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Completion::Failed(_))
    }
}

/// A stateful LLM client.
#[async_trait]
pub trait ChatClient: Send {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Clear the message buffer.
    fn initialize_message(&mut self);

    /// Append a system-role message.
    fn system_message(&mut self, text: &str);

    /// Append a user-role message.
    fn user_message(&mut self, text: &str);

    /// Append an assistant-role message.
    fn ai_message(&mut self, text: &str);

    /// The current buffer, in push order.
    fn messages(&self) -> &[Message];

    /// Issue one completion request over the current buffer.
    async fn get_response(&mut self) -> Completion;

    /// Human-readable dump of the buffer, one `role: content` block per message.
    fn render_prompt(&self) -> String {
        self.messages()
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
