//! Prompt assembly.
//!
//! Block order is fixed: web evidence, conversation summary, system
//! message, verbatim window, then the `Human: ...\nAI:` cue. Optional
//! blocks that are absent or empty are left out entirely, header included.
//! Inputs are inserted verbatim.

use banter_core::{Message, render_transcript};

/// System message used when none is configured.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "System: The following is a conversation between a human and an AI. \
The AI is curious and candid, with opinions and an imagination of its own. \
It listens to other views without pressing its own, helps as well as it can, and speaks as an equal rather than a servant. \
It talks naturally, the way a thoughtful person would.";

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_message: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PromptAssembler {
    /// Create an assembler; `None` or an empty message selects
    /// [`DEFAULT_SYSTEM_MESSAGE`].
    #[must_use]
    pub fn new(system_message: Option<String>) -> Self {
        let system_message = system_message
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string());
        Self { system_message }
    }

    #[must_use]
    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    /// Build the model-ready prompt for `utterance`.
    #[must_use]
    pub fn assemble(
        &self,
        utterance: &str,
        window: &[Message],
        summary: Option<&str>,
        evidence: Option<&str>,
    ) -> String {
        let mut prompt = String::new();

        if let Some(evidence) = evidence.filter(|e| !e.is_empty()) {
            prompt.push_str("WEB RESOURCES:\n");
            prompt.push_str(evidence);
            prompt.push_str("\n\n");
        }
        if let Some(summary) = summary.filter(|s| !s.is_empty()) {
            prompt.push_str("SUMMARY OF CONVERSATION:\n");
            prompt.push_str(summary);
            prompt.push_str("\n\n");
        }

        prompt.push_str(&self.system_message);
        prompt.push('\n');

        if !window.is_empty() {
            prompt.push_str(&render_transcript(window));
            prompt.push('\n');
        }

        prompt.push_str("Human: ");
        prompt.push_str(utterance);
        prompt.push_str("\nAI:");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_prompt() {
        let assembler = PromptAssembler::new(Some("System: be brief".to_string()));
        assert_eq!(
            assembler.assemble("Hello", &[], None, None),
            "System: be brief\nHuman: Hello\nAI:"
        );
    }

    #[test]
    fn test_full_prompt_block_order() {
        let assembler = PromptAssembler::new(Some("System: be brief".to_string()));
        let window = vec![Message::human("Hi"), Message::assistant("Hello!")];

        let prompt = assembler.assemble(
            "What did I say?",
            &window,
            Some("The human greeted the AI."),
            Some("https://a.example: A\n\nhttps://b.example: B"),
        );

        assert_eq!(
            prompt,
            "WEB RESOURCES:\nhttps://a.example: A\n\nhttps://b.example: B\n\n\
             SUMMARY OF CONVERSATION:\nThe human greeted the AI.\n\n\
             System: be brief\n\
             Human: Hi\nAI: Hello!\n\
             Human: What did I say?\nAI:"
        );
    }

    #[test]
    fn test_empty_optional_blocks_are_omitted() {
        let assembler = PromptAssembler::new(Some("S".to_string()));
        let prompt = assembler.assemble("u", &[], Some(""), Some(""));
        assert_eq!(prompt, "S\nHuman: u\nAI:");
        assert!(!prompt.contains("WEB RESOURCES"));
        assert!(!prompt.contains("SUMMARY OF CONVERSATION"));
    }

    #[test]
    fn test_default_system_message() {
        assert_eq!(
            PromptAssembler::default().system_message(),
            DEFAULT_SYSTEM_MESSAGE
        );
        assert_eq!(
            PromptAssembler::new(Some(String::new())).system_message(),
            DEFAULT_SYSTEM_MESSAGE
        );
        assert!(
            PromptAssembler::default()
                .assemble("x", &[], None, None)
                .starts_with("System: ")
        );
    }

    #[test]
    fn test_assemble_is_deterministic_and_passes_input_through() {
        let assembler = PromptAssembler::default();
        let window = vec![Message::human("a"), Message::assistant("b")];
        let first = assembler.assemble("", &window, Some("sum"), None);
        let second = assembler.assemble("", &window, Some("sum"), None);
        assert_eq!(first, second);
        assert!(first.ends_with("Human: \nAI:"));
    }
}
