//! Contracts for the engine's external collaborators.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::{BackendError, Message};

/// Lazy, finite, non-restartable sequence of generated text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

/// Text-generation backend.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Start generating a completion for `prompt`.
    ///
    /// Failures, including a failure to connect at all, surface as an `Err`
    /// item; the stream ends after the first error.
    fn stream(&self, prompt: String) -> FragmentStream;

    /// Generate a completion and collect it into one string.
    async fn complete(&self, prompt: String) -> Result<String, BackendError> {
        let mut fragments = self.stream(prompt);
        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

/// A retrieved piece of web evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Where the content came from, usually a URL.
    pub source: String,
    pub content: String,
}

impl Document {
    #[must_use]
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Web-evidence retrieval backend.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// Return up to `result_count` documents for `text`, most relevant first.
    /// An empty result is not an error.
    async fn query(&self, text: &str, result_count: usize) -> Result<Vec<Document>, BackendError>;
}

/// Folds newly committed messages into a conversation summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce the replacement for `existing_summary` after `new_messages`.
    async fn summarize(
        &self,
        existing_summary: &str,
        new_messages: &[Message],
    ) -> Result<String, BackendError>;
}
