//! Tokenizer trait: text to language-model token count.

use crate::error::TokenizerError;

/// Counts the language-model tokens in a piece of text.
pub trait Tokenizer: Send + Sync {
    /// The tokenizer name (e.g., "heuristic").
    fn name(&self) -> &str;

    /// Count tokens in `text`.
    fn count_tokens(&self, text: &str) -> std::result::Result<usize, TokenizerError>;
}
