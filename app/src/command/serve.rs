use banter_config::Config;
use banter_server::{AppState, Server};
use tracing::info;

use super::build_orchestrator;

/// Strategy for running the HTTP turn server until ctrl-c.
#[derive(Debug, Clone, Copy)]
pub struct ServeStrategy;

impl super::CommandStrategy for ServeStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        info!(
            "Starting banter on port {} with {} workers",
            config.server.port, config.server.max_workers
        );

        let orchestrator = build_orchestrator(&config);
        let state = AppState::new(orchestrator, config.server.max_workers);
        Server::new(config.server.port, state).run().await?;
        Ok(())
    }
}
