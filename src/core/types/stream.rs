//! Query request and streaming event types

use serde::{Deserialize, Serialize};

/// Caller's question, scoped to a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,

    /// Opaque conversation identifier, passed through untouched
    #[serde(default)]
    pub session_id: String,

    #[serde(default)]
    pub use_graph: bool,
}

impl AskRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: String::new(),
            use_graph: false,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }
}

/// Request sent to the generation capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Augmented prompt (context + question + citation instruction)
    pub prompt: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub use_graph: bool,
}

/// A cited source reported by the generation capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub filename: String,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub score: f32,
}

/// One item yielded by a generation stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationItem {
    #[serde(default)]
    pub thinking_log: String,
    #[serde(default)]
    pub answer_delta: String,
    #[serde(default)]
    pub source_docs: Vec<SourceRef>,
}

impl GenerationItem {
    /// Item carrying only answer text
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            answer_delta: text.into(),
            ..Default::default()
        }
    }
}

/// Unit relayed to the transport layer, in arrival order.
///
/// A sequence ends either when the producer closes the bridge or after a
/// single `Error`; no `AnswerDelta` follows an `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Progress notice
    Thinking { text: String },
    /// Incremental answer text
    AnswerDelta { text: String },
    /// A source cited by the answer
    SourceDoc { filename: String, page: i32 },
    /// Terminal failure
    Error { message: String },
}

impl StreamEvent {
    pub fn thinking(text: impl Into<String>) -> Self {
        StreamEvent::Thinking { text: text.into() }
    }

    pub fn answer_delta(text: impl Into<String>) -> Self {
        StreamEvent::AnswerDelta { text: text.into() }
    }

    pub fn source_doc(filename: impl Into<String>, page: i32) -> Self {
        StreamEvent::SourceDoc {
            filename: filename.into(),
            page,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StreamEvent::Error { .. })
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, StreamEvent::AnswerDelta { .. })
    }
}
