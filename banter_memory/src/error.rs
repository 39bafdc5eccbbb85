use banter_core::BackendError;
use thiserror::Error;

/// Errors raised by the memory store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("summarization backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),
}
