use std::sync::Arc;

use async_trait::async_trait;
use banter_core::{BackendError, GenerationBackend, Message, Summarizer, render_transcript};
use tracing::debug;

/// Build the progressive-summarization prompt.
///
/// # Arguments
/// * `existing_summary` - Summary produced by the previous fold, may be empty
/// * `new_messages` - Messages committed since that summary was produced
///
/// # Returns
/// * Prompt string for the generation backend
#[must_use]
pub fn build_summary_prompt(existing_summary: &str, new_messages: &[Message]) -> String {
    let new_lines = render_transcript(new_messages);

    format!(
        r"# Task
Progressively summarize the lines of conversation provided, adding onto the current summary and returning a new summary.

# Rules
- Keep facts the human shared about themselves and any decisions reached
- Drop greetings and filler
- Write in third person, present tense
- Output only the new summary

# Current Summary
{current_summary}

# New Lines of Conversation
{new_lines}

# New Summary
",
        current_summary = if existing_summary.is_empty() {
            "(empty)"
        } else {
            existing_summary
        },
        new_lines = if new_lines.is_empty() {
            "(none)"
        } else {
            &new_lines
        },
    )
}

/// Summarizer that folds messages into the summary with a generation call.
pub struct GenerationSummarizer {
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationSummarizer {
    #[must_use]
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Summarizer for GenerationSummarizer {
    async fn summarize(
        &self,
        existing_summary: &str,
        new_messages: &[Message],
    ) -> Result<String, BackendError> {
        let prompt = build_summary_prompt(existing_summary, new_messages);
        let summary = self.backend.complete(prompt).await?;

        debug!(
            "Summarized {} new messages into {} chars",
            new_messages.len(),
            summary.len()
        );

        Ok(summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_providers::scripted::ScriptedGenerator;

    #[test]
    fn test_build_summary_prompt() {
        let messages = vec![Message::human("I live in Oslo"), Message::assistant("Nice!")];
        let prompt = build_summary_prompt("The human is called Ada.", &messages);

        assert!(prompt.contains("# Current Summary\nThe human is called Ada."));
        assert!(prompt.contains("Human: I live in Oslo\nAI: Nice!"));
        assert!(prompt.ends_with("# New Summary\n"));
    }

    #[test]
    fn test_build_summary_prompt_placeholders() {
        let prompt = build_summary_prompt("", &[]);
        assert!(prompt.contains("# Current Summary\n(empty)"));
        assert!(prompt.contains("# New Lines of Conversation\n(none)"));
    }

    #[tokio::test]
    async fn test_summarize_collects_and_trims_completion() {
        let backend = Arc::new(ScriptedGenerator::new(vec![vec![
            " Ada lives ".to_string(),
            "in Oslo.\n".to_string(),
        ]]));
        let summarizer = GenerationSummarizer::new(backend.clone());

        let summary = summarizer
            .summarize("", &[Message::human("I live in Oslo")])
            .await
            .unwrap();

        assert_eq!(summary, "Ada lives in Oslo.");
        assert_eq!(backend.prompts().len(), 1);
        assert!(backend.prompts()[0].contains("Human: I live in Oslo"));
    }

    #[tokio::test]
    async fn test_summarize_propagates_backend_failure() {
        let backend = Arc::new(ScriptedGenerator::new(vec![]));
        let summarizer = GenerationSummarizer::new(backend);

        let err = summarizer.summarize("", &[]).await.unwrap_err();
        assert_eq!(err, BackendError::Exhausted(0));
    }
}
