//! Deterministic in-process backends for tests and offline runs.
//!
//! Each double replays pre-programmed responses in call order and records
//! what it was asked, so tests can assert on prompts and queries.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use banter_core::{
    BackendError, Document, FragmentStream, GenerationBackend, Message, RetrievalBackend,
    Summarizer, render_transcript,
};
use futures::stream;
use parking_lot::Mutex;

/// Pre-programmed behaviour for one generation call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Yield the fragments, then end normally.
    Fragments(Vec<String>),
    /// Yield the fragments, then fail.
    FailAfter(Vec<String>, BackendError),
    /// Yield the fragments, then never produce another item.
    Stall(Vec<String>),
}

impl Script {
    #[must_use]
    pub fn fragments<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        Self::Fragments(fragments.into_iter().map(Into::into).collect())
    }
}

/// Generation backend that replays one [`Script`] per call.
pub struct ScriptedGenerator {
    scripts: Vec<Script>,
    calls: AtomicUsize,
    pulled: Arc<AtomicUsize>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    /// Each inner vector is the fragment sequence of one call.
    #[must_use]
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self::with_scripts(responses.into_iter().map(Script::Fragments).collect())
    }

    #[must_use]
    pub fn with_scripts(scripts: Vec<Script>) -> Self {
        Self {
            scripts,
            calls: AtomicUsize::new(0),
            pulled: Arc::new(AtomicUsize::new(0)),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Wait `delay` before every fragment.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fragments actually handed to consumers across all calls.
    pub fn fragments_pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedGenerator {
    fn stream(&self, prompt: String) -> FragmentStream {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt);

        let Some(script) = self.scripts.get(idx).cloned() else {
            return Box::pin(stream::iter([Err::<String, _>(BackendError::Exhausted(idx))]));
        };
        let pulled = Arc::clone(&self.pulled);
        let delay = self.delay;

        Box::pin(async_stream::stream! {
            let (fragments, failure, stall) = match script {
                Script::Fragments(f) => (f, None, false),
                Script::FailAfter(f, e) => (f, Some(e), false),
                Script::Stall(f) => (f, None, true),
            };

            for fragment in fragments {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                pulled.fetch_add(1, Ordering::SeqCst);
                yield Ok(fragment);
            }

            if let Some(e) = failure {
                yield Err(e);
            } else if stall {
                futures::future::pending::<()>().await;
            }
        })
    }
}

/// Retrieval backend that replays one result per call.
pub struct ScriptedRetriever {
    responses: Vec<Result<Vec<Document>, BackendError>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<(String, usize)>>,
}

impl ScriptedRetriever {
    #[must_use]
    pub fn new(responses: Vec<Result<Vec<Document>, BackendError>>) -> Self {
        Self {
            responses,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every recorded `(query, result_count)` pair.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl RetrievalBackend for ScriptedRetriever {
    async fn query(&self, text: &str, result_count: usize) -> Result<Vec<Document>, BackendError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push((text.to_string(), result_count));

        self.responses
            .get(idx)
            .cloned()
            .unwrap_or(Err(BackendError::Exhausted(idx)))
    }
}

/// Summarizer that appends the rendered transcript to the existing summary.
#[derive(Default)]
pub struct ScriptedSummarizer {
    calls: AtomicUsize,
    failing_calls: HashSet<usize>,
    delay: Option<Duration>,
    inputs: Mutex<Vec<(String, Vec<Message>)>>,
}

impl ScriptedSummarizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `call`-th summarization (zero-based).
    #[must_use]
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.failing_calls.insert(call);
        self
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every recorded `(existing_summary, new_messages)` pair.
    pub fn inputs(&self) -> Vec<(String, Vec<Message>)> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(
        &self,
        existing_summary: &str,
        new_messages: &[Message],
    ) -> Result<String, BackendError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs
            .lock()
            .push((existing_summary.to_string(), new_messages.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_calls.contains(&idx) {
            return Err(BackendError::Request(format!(
                "scripted failure on summarization call {idx}"
            )));
        }

        let transcript = render_transcript(new_messages);
        Ok(if existing_summary.is_empty() {
            transcript
        } else {
            format!("{existing_summary}\n{transcript}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_generator_replays_scripts_in_order() {
        let generator = ScriptedGenerator::with_scripts(vec![
            Script::fragments(["a", "b"]),
            Script::FailAfter(vec!["c".to_string()], BackendError::Stream("x".to_string())),
        ]);

        assert_eq!(generator.complete("p1".to_string()).await.unwrap(), "ab");
        let items: Vec<_> = generator.stream("p2".to_string()).collect().await;
        assert_eq!(
            items,
            vec![Ok("c".to_string()), Err(BackendError::Stream("x".to_string()))]
        );
        assert_eq!(
            generator.complete("p3".to_string()).await.unwrap_err(),
            BackendError::Exhausted(2)
        );
        assert_eq!(generator.prompts(), vec!["p1", "p2", "p3"]);
        assert_eq!(generator.fragments_pulled(), 3);
    }

    #[tokio::test]
    async fn test_retriever_records_queries() {
        let retriever = ScriptedRetriever::new(vec![Ok(vec![Document::new("u", "c")])]);
        assert_eq!(retriever.query("q", 3).await.unwrap().len(), 1);
        assert!(retriever.query("q", 3).await.is_err());
        assert_eq!(retriever.queries()[0], ("q".to_string(), 3));
    }

    #[tokio::test]
    async fn test_summarizer_folds_and_fails_on_request() {
        let summarizer = ScriptedSummarizer::new().fail_on_call(1);
        let first = summarizer
            .summarize("", &[Message::human("a")])
            .await
            .unwrap();
        assert_eq!(first, "Human: a");
        assert!(summarizer.summarize(&first, &[]).await.is_err());
        let third = summarizer
            .summarize(&first, &[Message::assistant("b")])
            .await
            .unwrap();
        assert_eq!(third, "Human: a\nAI: b");
        assert_eq!(summarizer.call_count(), 3);
    }
}
