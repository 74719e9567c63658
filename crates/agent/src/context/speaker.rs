//! Speaker classification and query formatting.

use std::collections::HashSet;

/// Opening corner bracket around a character's utterance.
pub const OPEN_QUOTE: char = '「';
/// Closing corner bracket around a character's utterance.
pub const CLOSE_QUOTE: char = '」';

/// How an utterance is attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerRole {
    /// Scene description; no speaker name is shown.
    Narrator,
    /// A named character.
    Character,
}

/// The set of speaker names treated as the narrator.
///
/// Matching is exact; list every case or locale variant explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarratorAliases {
    aliases: HashSet<String>,
}

impl NarratorAliases {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_narrator(&self, speaker: &str) -> bool {
        self.aliases.contains(speaker)
    }

    pub fn classify(&self, speaker: &str) -> SpeakerRole {
        if self.is_narrator(speaker) {
            SpeakerRole::Narrator
        } else {
            SpeakerRole::Character
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for NarratorAliases {
    fn default() -> Self {
        Self::new(rolecast_config::default_narrator_aliases())
    }
}

/// Format an utterance as it appears in the prompt and in history.
///
/// Narrator lines become `:text`; character lines become `Speaker:「text」`.
pub fn format_query(speaker: &str, text: &str, narrators: &NarratorAliases) -> String {
    match narrators.classify(speaker) {
        SpeakerRole::Narrator => format!(":{text}"),
        SpeakerRole::Character => format!("{speaker}:{OPEN_QUOTE}{text}{CLOSE_QUOTE}"),
    }
}
