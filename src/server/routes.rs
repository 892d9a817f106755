use crate::crawler::ProgressSnapshot;
use crate::server::StatusState;
use crate::summary::{render_text, to_entries, SummaryEntry};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::fmt::Write;

/// Body of `GET /state.json`
#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
    pub members: Vec<SummaryEntry>,
}

/// Build the axum router with the health and state routes.
pub fn build_router(state: StatusState) -> Router {
    Router::new()
        .route("/livenesscheck", get(liveness))
        .route("/readinesscheck", get(readiness))
        .route("/state", get(state_text))
        .route("/state.json", get(state_json))
        .with_state(state)
}

async fn liveness() -> &'static str {
    "LIVE"
}

async fn readiness() -> &'static str {
    "HEALTHY"
}

async fn state_text(State(state): State<StatusState>) -> String {
    let progress = state.progress.snapshot();

    let mut out = String::new();
    let _ = writeln!(out, "phase: {}", progress.phase.as_str());
    if let Some(started_at) = progress.started_at {
        let _ = writeln!(out, "started: {}", started_at.to_rfc3339());
    }
    if let Some(finished_at) = progress.finished_at {
        let _ = writeln!(out, "finished: {}", finished_at.to_rfc3339());
    }
    let _ = writeln!(
        out,
        "channels: {} discovered, {} finished",
        progress.channels_discovered, progress.channels_finished
    );
    let _ = writeln!(out, "history pages merged: {}", progress.pages_merged);
    out.push('\n');
    out.push_str(&render_text(&state.summaries.snapshot()));
    out
}

async fn state_json(State(state): State<StatusState>) -> Json<StateResponse> {
    Json(StateResponse {
        progress: state.progress.snapshot(),
        members: to_entries(state.summaries.snapshot()),
    })
}
