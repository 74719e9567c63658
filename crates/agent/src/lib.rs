//! The role-play orchestrator.
//!
//! Each turn follows one fixed sequence:
//!
//! 1. **Format** the utterance (narrator or character)
//! 2. **Retrieve** story passages similar to it
//! 3. **Assemble** system prompt, story block and history window
//!    within the story and history token budgets
//! 4. **Complete** once via the backend's chat client
//! 5. **Record** the turn in history, with an empty reply if the call failed

pub mod context;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{
    AssembledContext, AssemblyInput, AssemblyMetadata, AssemblySettings, AssemblyWarning,
    ContextAssembler, LayerStats, NarratorAliases, SpeakerRole, format_query,
};
pub use session::{Budgets, Exchange, Session, SessionBuilder};
