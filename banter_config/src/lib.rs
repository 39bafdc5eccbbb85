#![deny(
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

//! Configuration for the banter service.
//!
//! Settings come from built-in defaults, then `~/banter/config.json`, then
//! the process environment, each layer overriding the previous one.

mod error;
mod schema;

pub use error::ConfigError;
pub use schema::{
    Config, ConversationConfig, FileConfig, MemoryConfig, OpenAiConfig, ProvidersConfig,
    ServerConfig, TavilyConfig,
};
