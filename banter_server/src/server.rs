use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{AppState, Error, Result, router};

/// HTTP server bound on all interfaces.
pub struct Server {
    port: u16,
    state: AppState,
}

impl Server {
    #[must_use]
    pub const fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    /// Serve until ctrl-c.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        info!(
            "banter listening on http://{} ({} workers)",
            listener.local_addr()?,
            self.state.available_workers()
        );

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
