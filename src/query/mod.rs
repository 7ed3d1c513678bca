//! Query orchestration
//!
//! Turns one question into a live sequence of [`StreamEvent`]s: embed the
//! query, retrieve the nearest chunks, assemble an augmented prompt, then
//! relay the upstream generation as it arrives.
//!
//! [`StreamEvent`]: crate::core::types::StreamEvent

mod error;
mod orchestrator;
mod prompt;

#[cfg(test)]
mod tests;

pub use error::QueryError;
pub use orchestrator::{relay_events, AnswerStream, QueryOrchestrator};
pub use prompt::{build_prompt, format_context, CITATION_INSTRUCTION};

/// Progress notices emitted between stages
pub mod progress {
    pub const UNDERSTANDING: &str = "understanding query intent...";
    pub const RETRIEVING: &str = "retrieving from knowledge base...";
    pub const NO_DOCUMENTS: &str =
        "no relevant documents found, answering from general knowledge...";
    pub const GENERATING: &str = "generating answer...";

    pub fn found(count: usize) -> String {
        format!("found {} relevant fragments...", count)
    }
}
