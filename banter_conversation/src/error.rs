use banter_core::BackendError;
use banter_memory::MemoryError;
use thiserror::Error;

/// Why a turn stopped before `Finished`.
///
/// Backend failures end the turn with a `Failed` event; a disconnected
/// consumer ends it silently. None of them commit memory.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("web retrieval failed: {0}")]
    Retrieval(#[source] BackendError),

    #[error("generation failed: {0}")]
    Generation(#[source] BackendError),

    #[error("memory update failed: {0}")]
    Memory(#[from] MemoryError),

    #[error("client disconnected before the turn completed")]
    ClientDisconnected,
}

impl TurnError {
    /// Stage at which the failure was caught.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Retrieval(_) => "searching_web",
            Self::Generation(_) => "generating_token",
            Self::Memory(_) => "updating_memory",
            Self::ClientDisconnected => "disconnected",
        }
    }
}
