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

//! Streaming conversation turns.
//!
//! A turn takes a session key and an utterance and produces an ordered
//! stream of [`banter_core::TurnEvent`]s: history load, optional web search,
//! prompt assembly, one event per generated fragment, memory update, and a
//! terminal `Finished` or `Failed`.
//!
//! # Key Features
//! - Fixed-order prompt assembly (evidence, summary, system, window, cue)
//! - Optional evidence augmentation with cited sources
//! - No memory commit unless the turn reaches `Finished`
//! - Dropping the event stream abandons the turn

mod error;
mod evidence;
mod orchestrator;
mod prompt;

pub use error::TurnError;
pub use evidence::{build_search_query, distinct_sources, format_evidence};
pub use orchestrator::{TurnConfig, TurnOrchestrator, TurnStream};
pub use prompt::{DEFAULT_SYSTEM_MESSAGE, PromptAssembler};
