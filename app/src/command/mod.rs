//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use std::sync::Arc;

use banter_config::Config;
use banter_conversation::{TurnConfig, TurnOrchestrator};
use banter_core::GenerationBackend;
use banter_memory::{GenerationSummarizer, MemoryStore};
use banter_providers::{OpenAiProvider, TavilyRetriever};
use tracing::info;

mod chat;
mod info;
mod init;
mod serve;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use serve::ServeStrategy;
pub use version::VersionStrategy;

/// Contract shared by all command strategies.
///
/// Each strategy names its own input type, so parameters are passed without
/// boxing or runtime casting.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Wire the backends, the memory store and the orchestrator from `config`.
///
/// One generation backend serves both the turns and the summarizer.
fn build_orchestrator(config: &Config) -> TurnOrchestrator {
    let openai = &config.providers.openai;
    let generator: Arc<dyn GenerationBackend> = Arc::new(
        OpenAiProvider::new(openai.api_key.clone())
            .with_base_url(openai.base_url.clone())
            .with_model(openai.model.clone()),
    );
    info!("Generation backend: {} at {}", openai.model, openai.base_url);

    let summarizer = Arc::new(GenerationSummarizer::new(Arc::clone(&generator)));
    let memory = Arc::new(MemoryStore::new(summarizer, config.memory.window_pairs));
    info!(
        "Memory window: {} message pairs per session",
        config.memory.window_pairs
    );

    let mut turn_config =
        TurnConfig::default().with_search_results(config.conversation.search_results);
    if let Some(prompt) = &config.conversation.system_prompt {
        turn_config = turn_config.with_system_message(prompt.clone());
    }

    let orchestrator = TurnOrchestrator::new(generator, memory, turn_config);
    if config.conversation.web_search {
        info!(
            "Web search enabled, {} results per turn",
            config.conversation.search_results
        );
        let retriever = TavilyRetriever::new(config.providers.tavily.api_key.clone());
        orchestrator.with_retrieval(Arc::new(retriever))
    } else {
        orchestrator
    }
}
