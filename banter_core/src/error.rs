use thiserror::Error;

/// Failure reported by an external backend (generation, retrieval, or the
/// summarization call made through the generation backend).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stream interrupted: {0}")]
    Stream(String),

    #[error("no scripted response left for call {0}")]
    Exhausted(usize),
}

impl BackendError {
    /// Short machine-readable kind, used as a structured log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Status { .. } => "status",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Stream(_) => "stream",
            Self::Exhausted(_) => "exhausted",
        }
    }
}
