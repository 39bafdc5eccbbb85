#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Shared types for the banter turn engine.
//!
//! Everything that crosses a crate boundary lives here: conversation
//! messages, the stage-tagged [`TurnEvent`], and the traits the engine uses
//! to talk to its external collaborators (text generation, web retrieval,
//! summarization).

use serde::{Deserialize, Serialize};

pub mod backend;
pub mod error;
pub mod event;

pub use backend::{Document, FragmentStream, GenerationBackend, RetrievalBackend, Summarizer};
pub use error::BackendError;
pub use event::TurnEvent;

/// Opaque, caller-supplied conversation identifier.
pub type SessionKey = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

impl Role {
    /// Speaker label used when a message is rendered into a prompt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Assistant => "AI",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.role, self.content)
    }
}

/// Render messages as prompt transcript lines, one `Speaker: content` per line.
#[must_use]
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
