//! Turn orchestration.
//!
//! The `TurnOrchestrator` is the entry point for running one conversation
//! turn against a session's memory.

use std::pin::Pin;
use std::sync::Arc;

use banter_core::{
    Document, GenerationBackend, Message, RetrievalBackend, SessionKey, TurnEvent,
};
use banter_memory::MemoryStore;
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::evidence::{build_search_query, distinct_sources, format_evidence};
use crate::prompt::PromptAssembler;
use crate::TurnError;

/// Ordered events of one turn. Dropping it abandons the turn.
pub type TurnStream = Pin<Box<dyn Stream<Item = TurnEvent> + Send>>;

/// Configuration shared by every turn.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// System message; `None` selects the built-in instruction
    pub system_message: Option<String>,
    /// Documents requested from the retrieval backend per turn
    pub search_results: usize,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            system_message: None,
            search_results: 5,
        }
    }
}

impl TurnConfig {
    #[must_use]
    pub fn with_system_message(mut self, message: String) -> Self {
        self.system_message = Some(message);
        self
    }

    #[must_use]
    pub const fn with_search_results(mut self, count: usize) -> Self {
        self.search_results = count;
        self
    }
}

/// Drives turns through their stages.
///
/// Backends are shared across all turns and sessions; the only per-session
/// state is the memory entry owned by the [`MemoryStore`]. Evidence
/// augmentation is enabled by attaching a retrieval backend.
#[derive(Clone)]
pub struct TurnOrchestrator {
    generator: Arc<dyn GenerationBackend>,
    retriever: Option<Arc<dyn RetrievalBackend>>,
    memory: Arc<MemoryStore>,
    assembler: PromptAssembler,
    search_results: usize,
}

impl TurnOrchestrator {
    #[must_use]
    pub fn new(
        generator: Arc<dyn GenerationBackend>,
        memory: Arc<MemoryStore>,
        config: TurnConfig,
    ) -> Self {
        Self {
            generator,
            retriever: None,
            memory,
            assembler: PromptAssembler::new(config.system_message),
            search_results: config.search_results,
        }
    }

    /// Enable the web-search stage.
    #[must_use]
    pub fn with_retrieval(mut self, retriever: Arc<dyn RetrievalBackend>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    #[must_use]
    pub const fn evidence_enabled(&self) -> bool {
        self.retriever.is_some()
    }

    #[must_use]
    pub const fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Run one turn for `utterance` in `session`.
    ///
    /// The turn only advances while the returned stream is polled. Events
    /// arrive in stage order and generated fragments are forwarded one by
    /// one as they come. Memory is committed only on the way to `Finished`.
    /// Dropping the stream before the terminal event stops the generation
    /// pull and skips the commit.
    pub fn run_turn(
        &self,
        session: impl Into<SessionKey>,
        utterance: impl Into<String>,
    ) -> TurnStream {
        let session = session.into();
        let utterance = utterance.into();
        let this = self.clone();

        Box::pin(async_stream::stream! {
            let mut guard = TurnGuard::new(session.clone());
            info!(session = %session, turn_id = %guard.turn_id, "Starting turn");

            yield TurnEvent::LoadingHistory;
            let history = this.memory.get(&session);
            debug!(
                turn_id = %guard.turn_id,
                window = history.window.len(),
                summary_chars = history.summary.len(),
                "Loaded history"
            );

            let mut documents: Vec<Document> = Vec::new();
            if let Some(retriever) = &this.retriever {
                yield TurnEvent::SearchingWeb;
                let query = build_search_query(&history.summary, &utterance);
                match retriever.query(&query, this.search_results).await {
                    Ok(found) => {
                        debug!(turn_id = %guard.turn_id, documents = found.len(), "Retrieved evidence");
                        documents = found;
                    }
                    Err(e) => {
                        yield guard.fail(&TurnError::Retrieval(e));
                        return;
                    }
                }
            }

            yield TurnEvent::BuildingPrompt;
            let evidence = format_evidence(&documents);
            let prompt = this.assembler.assemble(
                &utterance,
                &history.window,
                Some(history.summary.as_str()),
                evidence.as_deref(),
            );
            debug!(turn_id = %guard.turn_id, prompt_chars = prompt.len(), "Assembled prompt");

            let mut fragments = this.generator.stream(prompt);
            let mut response = String::new();
            let mut fragment_count = 0_usize;
            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(text) => {
                        response.push_str(&text);
                        fragment_count += 1;
                        yield TurnEvent::GeneratingToken { text };
                    }
                    Err(e) => {
                        yield guard.fail(&TurnError::Generation(e));
                        return;
                    }
                }
            }
            drop(fragments);

            yield TurnEvent::UpdatingMemory;
            let exchange = vec![Message::human(utterance), Message::assistant(response)];
            if let Err(e) = this.memory.append(&session, exchange).await {
                yield guard.fail(&TurnError::Memory(e));
                return;
            }

            let sources = distinct_sources(&documents);
            info!(
                session = %session,
                turn_id = %guard.turn_id,
                fragments = fragment_count,
                sources = sources.len(),
                "Turn finished"
            );
            guard.complete();
            yield TurnEvent::Finished { sources };
        })
    }
}

/// Tracks whether a turn reached a terminal event, so that a turn dropped
/// mid-flight is reported as a disconnect.
struct TurnGuard {
    session: SessionKey,
    turn_id: Uuid,
    completed: bool,
}

impl TurnGuard {
    fn new(session: SessionKey) -> Self {
        Self {
            session,
            turn_id: Uuid::now_v7(),
            completed: false,
        }
    }

    const fn complete(&mut self) {
        self.completed = true;
    }

    fn fail(&mut self, error: &TurnError) -> TurnEvent {
        warn!(
            session = %self.session,
            turn_id = %self.turn_id,
            stage = error.stage(),
            error = %error,
            "Turn failed, memory not updated"
        );
        self.complete();
        TurnEvent::Failed
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        if !self.completed {
            info!(
                session = %self.session,
                turn_id = %self.turn_id,
                reason = %TurnError::ClientDisconnected,
                "Turn abandoned, memory not updated"
            );
        }
    }
}
