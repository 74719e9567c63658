//! Per-turn context assembly.
//!
//! | Section | Source | Trim Strategy |
//! |---------|--------|---------------|
//! | System | Session prompt | Never trimmed |
//! | Story | Story store search | Stop at first passage that overflows |
//! | History | Recent turns | Stop at first (newest-first) turn that overflows |

pub mod assembler;
pub mod speaker;

pub use assembler::{
    AssembledContext, AssemblyInput, AssemblyMetadata, AssemblySettings, AssemblyWarning,
    ContextAssembler, LayerStats,
};
pub use speaker::{NarratorAliases, SpeakerRole, format_query};
