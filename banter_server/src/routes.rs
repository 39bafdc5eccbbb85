use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::routing::{get, post};
use axum::{Json, Router};
use banter_conversation::TurnOrchestrator;
use banter_core::TurnEvent;
use banter_memory::{ClearTarget, MemorySnapshot, SessionStats};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    orchestrator: TurnOrchestrator,
    permits: Arc<Semaphore>,
}

impl AppState {
    /// `max_workers` bounds the number of turns streaming at once; further
    /// requests wait for a free slot.
    #[must_use]
    pub fn new(orchestrator: TurnOrchestrator, max_workers: usize) -> Self {
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    #[must_use]
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub session: String,
    pub input: String,
}

#[derive(Debug, Deserialize)]
struct ClearQuery {
    target: Option<ClearTarget>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/conversation", post(converse))
        .route("/v1/sessions", get(list_sessions))
        .route(
            "/v1/sessions/{session}/memory",
            get(session_memory).delete(clear_memory),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

async fn converse(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let permit = Arc::clone(&state.permits)
        .acquire_owned()
        .await
        .map_err(|_| ApiError::unavailable("server is shutting down"))?;
    debug!(
        session = %request.session,
        free = state.permits.available_permits(),
        "Acquired turn slot"
    );

    let mut events = state.orchestrator.run_turn(request.session, request.input);
    let stream = async_stream::stream! {
        let _permit = permit;
        while let Some(event) = events.next().await {
            yield Ok::<_, Infallible>(sse_event(&event));
        }
    };

    Ok(Sse::new(stream))
}

fn sse_event(event: &TurnEvent) -> Event {
    let frame = Event::default().event(event.stage());
    match serde_json::to_string(event) {
        Ok(data) => frame.data(data),
        Err(e) => {
            warn!(error = %e, stage = event.stage(), "Failed to encode turn event");
            frame
        }
    }
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionStats>> {
    Json(state.orchestrator.memory().stats())
}

async fn session_memory(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Json<MemorySnapshot> {
    Json(state.orchestrator.memory().get(&session))
}

async fn clear_memory(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Query(query): Query<ClearQuery>,
) -> StatusCode {
    let target = query.target.unwrap_or(ClearTarget::Both);
    state.orchestrator.memory().clear(&session, target).await;
    StatusCode::NO_CONTENT
}
