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

//! HTTP transport for the turn engine.
//!
//! A turn is started with `POST /v1/conversation` and answered as a
//! Server-Sent-Events stream, one event per turn stage. Session memory can
//! be inspected and cleared under `/v1/sessions`.

mod error;
mod routes;
mod server;

pub use error::{ApiError, Error, Result};
pub use routes::{AppState, TurnRequest, router};
pub use server::Server;
