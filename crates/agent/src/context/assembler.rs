//! Context assembly: the per-turn prompt builder.
//!
//! Builds the ordered message list for one completion:
//!
//! 1. **System**: the session prompt, never trimmed
//! 2. **Story**: a fixed prefix followed by retrieved passages, filled
//!    greedily in store order until the next passage would overflow
//! 3. **History**: the longest suffix of past turns that fits, oldest first
//!
//! The formatted utterance itself is only used for retrieval and is recorded
//! with the turn; it is not sent as a separate message.
//!
//! # Budgets
//!
//! The story prefix always counts toward the story budget and is always
//! included, even if it alone exceeds the budget. A passage costs its own
//! tokens plus the divider's. A turn costs its query tokens plus its response
//! tokens. Both scans stop at the first unit that does not fit; nothing
//! after it is considered.
//!
//! # Determinism
//!
//! Given the same store results and tokenizer, assembly is deterministic.

use crate::context::speaker::{NarratorAliases, format_query};
use rolecast_config::{DEFAULT_DIALOGUE_DIVIDER, DEFAULT_K_SEARCH, DEFAULT_STORY_PREFIX};
use rolecast_core::dialogue::{History, Turn};
use rolecast_core::embedding::Embedder;
use rolecast_core::error::{Result, TokenizerError};
use rolecast_core::message::Message;
use rolecast_core::story::StoryStore;
use rolecast_core::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ── Types ─────────────────────────────────────────────────────────────────

/// Budgets and fixed strings used by the assembler.
#[derive(Debug, Clone)]
pub struct AssemblySettings {
    pub max_story_tokens: usize,
    pub max_history_tokens: usize,
    /// Number of passages requested from the story store.
    pub k_search: usize,
    pub story_prefix: String,
    pub divider: String,
    pub narrators: NarratorAliases,
}

impl AssemblySettings {
    pub fn new(max_story_tokens: usize, max_history_tokens: usize) -> Self {
        Self {
            max_story_tokens,
            max_history_tokens,
            k_search: DEFAULT_K_SEARCH,
            story_prefix: DEFAULT_STORY_PREFIX.into(),
            divider: DEFAULT_DIALOGUE_DIVIDER.into(),
            narrators: NarratorAliases::default(),
        }
    }
}

/// All inputs required by the assembler for a single turn.
pub struct AssemblyInput<'a> {
    pub system_prompt: &'a str,
    /// The raw utterance, before formatting.
    pub text: &'a str,
    pub speaker: &'a str,
    pub history: &'a History,
    pub store: &'a dyn StoryStore,
    pub embedder: &'a dyn Embedder,
    pub tokenizer: &'a dyn Tokenizer,
}

/// The assembled context, ready to push into a chat client.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// The formatted query, as it will be recorded in history.
    pub query: String,
    /// System, story, then history pairs oldest first.
    pub messages: Vec<Message>,
    pub metadata: AssemblyMetadata,
}

/// What the assembler included and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    pub story: LayerStats,
    pub history: LayerStats,
    pub warnings: Vec<AssemblyWarning>,
}

/// Statistics for a single budgeted section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStats {
    pub name: String,
    /// Tokens consumed, including the story prefix and dividers.
    pub tokens: usize,
    pub budget: usize,
    pub items_included: usize,
    pub items_total: usize,
}

/// Non-fatal conditions raised during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssemblyWarning {
    /// No history turn fit the budget. `newest_turn_tokens` is `None` when
    /// the history was empty.
    EmptyHistorySelection {
        newest_turn_tokens: Option<usize>,
        budget: usize,
    },
}

impl std::fmt::Display for AssemblyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyHistorySelection {
                newest_turn_tokens: Some(tokens),
                budget,
            } => write!(
                f,
                "No history included: newest turn ({tokens} tokens) exceeds budget ({budget} tokens)"
            ),
            Self::EmptyHistorySelection {
                newest_turn_tokens: None,
                budget,
            } => write!(f, "No history included: history is empty (budget {budget} tokens)"),
        }
    }
}

/// The filled story section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoryBlock {
    pub(crate) text: String,
    pub(crate) tokens: usize,
    pub(crate) passages_included: usize,
    pub(crate) passages_total: usize,
}

/// The selected suffix of history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HistoryWindow<'a> {
    /// Selected turns, oldest first.
    pub(crate) turns: &'a [Turn],
    pub(crate) tokens: usize,
    /// Cost of the most recent turn, if any.
    pub(crate) newest_turn_tokens: Option<usize>,
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The context assembler. Stateless apart from its settings.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    settings: AssemblySettings,
}

impl ContextAssembler {
    pub fn new(settings: AssemblySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AssemblySettings {
        &self.settings
    }

    /// Assemble the context for one utterance.
    ///
    /// Embedding, search and tokenizer failures propagate.
    pub async fn assemble(&self, input: AssemblyInput<'_>) -> Result<AssembledContext> {
        let query = format_query(input.speaker, input.text, &self.settings.narrators);

        let embedding = input.embedder.embed(&query).await?;
        let passages = input.store.search(&embedding, self.settings.k_search).await?;

        let story = self.fill_story(&passages, input.tokenizer)?;
        let window = self.select_history(input.history.as_slice(), input.tokenizer)?;

        let mut warnings = Vec::new();
        if window.turns.is_empty() {
            let warning = AssemblyWarning::EmptyHistorySelection {
                newest_turn_tokens: window.newest_turn_tokens,
                budget: self.settings.max_history_tokens,
            };
            warn!(
                newest_turn_tokens = ?window.newest_turn_tokens,
                budget = self.settings.max_history_tokens,
                "{warning}"
            );
            warnings.push(warning);
        }

        let mut messages = Vec::with_capacity(2 + window.turns.len() * 2);
        messages.push(Message::system(input.system_prompt));
        messages.push(Message::user(story.text.clone()));
        for turn in window.turns {
            messages.push(Message::user(turn.query()));
            messages.push(Message::assistant(turn.response()));
        }

        debug!(
            story_tokens = story.tokens,
            passages = story.passages_included,
            history_tokens = window.tokens,
            turns = window.turns.len(),
            "Context assembled"
        );

        Ok(AssembledContext {
            query,
            messages,
            metadata: AssemblyMetadata {
                story: LayerStats {
                    name: "story".into(),
                    tokens: story.tokens,
                    budget: self.settings.max_story_tokens,
                    items_included: story.passages_included,
                    items_total: story.passages_total,
                },
                history: LayerStats {
                    name: "history".into(),
                    tokens: window.tokens,
                    budget: self.settings.max_history_tokens,
                    items_included: window.turns.len(),
                    items_total: input.history.len(),
                },
                warnings,
            },
        })
    }

    /// Fill the story block from passages in store order.
    pub(crate) fn fill_story(
        &self,
        passages: &[String],
        tokenizer: &dyn Tokenizer,
    ) -> std::result::Result<StoryBlock, TokenizerError> {
        let budget = self.settings.max_story_tokens;
        let divider = &self.settings.divider;
        let divider_tokens = tokenizer.count_tokens(divider)?;

        let mut text = self.settings.story_prefix.clone();
        let mut used = tokenizer.count_tokens(&text)?;
        let mut included = 0;

        for passage in passages {
            let cost = tokenizer.count_tokens(passage)? + divider_tokens;
            if used + cost > budget {
                break;
            }
            text.push_str(passage);
            text.push_str(divider);
            used += cost;
            included += 1;
        }

        Ok(StoryBlock {
            text,
            tokens: used,
            passages_included: included,
            passages_total: passages.len(),
        })
    }

    /// Select the longest suffix of `turns` that fits the history budget.
    pub(crate) fn select_history<'a>(
        &self,
        turns: &'a [Turn],
        tokenizer: &dyn Tokenizer,
    ) -> std::result::Result<HistoryWindow<'a>, TokenizerError> {
        let budget = self.settings.max_history_tokens;
        let mut used = 0;
        let mut start = turns.len();
        let mut newest_turn_tokens = None;

        // Newest → oldest; stop at the first turn that overflows.
        for (i, turn) in turns.iter().enumerate().rev() {
            let cost = tokenizer.count_tokens(turn.query())? + tokenizer.count_tokens(turn.response())?;
            if newest_turn_tokens.is_none() {
                newest_turn_tokens = Some(cost);
            }
            if used + cost > budget {
                break;
            }
            used += cost;
            start = i;
        }

        Ok(HistoryWindow {
            turns: &turns[start..],
            tokens: used,
            newest_turn_tokens,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
