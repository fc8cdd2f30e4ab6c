//! Streaming chat relay endpoint.
//!
//! POST /chat (alias: POST /api/chat)
//!
//! Relays one chat message to the upstream through the session's fallback
//! selector and streams the reply back as NDJSON, one record per upstream
//! fragment, flushed as it arrives:
//! - `{"text": "..."}` for reply text
//! - `{"grounding": [{"url", "title"}]}` for web sources (may share a line with text)
//! - `{"error": {"code", "message"}}` as the final line when the reply breaks
//!
//! If every candidate fails before any text is produced, the request fails
//! with a plain HTTP error instead of a stream.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures_util::{StreamExt, stream};

use aarini_core::relay::relay_records;
use aarini_types::relay::{ChatRequest, RelayRecord};

use crate::http::error::AppError;
use crate::state::AppState;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

pub async fn relay_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let Some(sessions) = state.sessions.clone() else {
        tracing::error!("Chat request rejected: no upstream credential configured");
        return Err(AppError::MissingCredential);
    };
    if body.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let selector = sessions.selector(body.session_id);
    let request = state.template.build(&body);
    tracing::info!(
        session_id = ?body.session_id,
        model = %selector.current_model(),
        history = body.history.len(),
        "Relaying chat message"
    );

    let mut records = Box::pin(relay_records(selector.stream(request)));

    // Hold the response until the first record so a failure before any
    // output can still be reported with a proper status code.
    let first = records.next().await;
    if let Some(RelayRecord {
        error: Some(failure),
        ..
    }) = &first
    {
        return Err(AppError::Upstream(failure.clone()));
    }

    let lines = stream::iter(first)
        .chain(records)
        .map(|record| record.to_line());

    Ok((
        [(CONTENT_TYPE, NDJSON_CONTENT_TYPE), (CACHE_CONTROL, "no-cache")],
        Body::from_stream(lines),
    )
        .into_response())
}
