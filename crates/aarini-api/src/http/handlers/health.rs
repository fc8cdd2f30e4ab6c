//! Liveness endpoint.
//!
//! GET /health

use axum::extract::State;
use serde::Serialize;

use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether an upstream credential is configured.
    pub upstream_ready: bool,
    pub models: Vec<String>,
    pub active_sessions: usize,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResponse<Health> {
    let (upstream_ready, active_sessions) = match &state.sessions {
        Some(sessions) => (true, sessions.len()),
        None => (false, 0),
    };
    ApiResponse::success(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        upstream_ready,
        models: state.config.models.clone(),
        active_sessions,
    })
}
