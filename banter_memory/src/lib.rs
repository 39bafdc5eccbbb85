#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Per-session conversational memory.
//!
//! Each session owns a bounded window of verbatim recent messages and a
//! rolling summary of everything the session has ever committed. Both live
//! in process memory for the lifetime of the [`MemoryStore`].
//!
//! # Key Features
//! - Lazily created entries keyed by an opaque session key
//! - FIFO eviction per raw message beyond `2k` messages
//! - Summary refresh delegated to an injected [`banter_core::Summarizer`]
//! - Per-session writer lock; snapshot reads never wait on a writer

mod error;
mod store;
mod summarizer;
mod window;

pub use error::MemoryError;
pub use store::{ClearTarget, MemorySnapshot, MemoryStore, SessionStats};
pub use summarizer::{GenerationSummarizer, build_summary_prompt};
pub use window::ConversationWindow;

/// Default number of human/assistant pairs kept verbatim.
pub const DEFAULT_WINDOW_PAIRS: usize = 5;
