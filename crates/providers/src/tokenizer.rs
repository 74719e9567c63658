//! Heuristic token counter.

use rolecast_core::error::TokenizerError;
use rolecast_core::tokenizer::Tokenizer;

/// Approximates BPE token counts as one token per four bytes, rounded up.
///
/// Not exact for any model, but monotone in text length and free of
/// external vocabulary files.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicTokenizer;

impl Tokenizer for HeuristicTokenizer {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn count_tokens(&self, text: &str) -> std::result::Result<usize, TokenizerError> {
        Ok(text.len().div_ceil(4))
    }
}
