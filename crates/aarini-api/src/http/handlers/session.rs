//! Session reset endpoint.
//!
//! DELETE /chat/sessions/{id}
//!
//! Forgets the session's fallback position so its next message starts at the
//! primary model again.

use axum::extract::{Path, State};
use axum::http::StatusCode;

use aarini_types::chat::SessionId;

use crate::http::error::AppError;
use crate::state::AppState;

pub async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, AppError> {
    let existed = state
        .sessions
        .as_ref()
        .is_some_and(|sessions| sessions.reset(session_id));
    if existed {
        tracing::info!(session_id = %session_id, "Chat session reset");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("session {session_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use aarini_types::chat::SessionId;

    use crate::http::testing::{Behaviour, FakeUpstream, spawn_relay, state_with};

    #[tokio::test]
    async fn test_reset_returns_session_to_primary() {
        let upstream = FakeUpstream::new()
            .model("m0", Behaviour::BreakAfter(vec![]))
            .model("m1", Behaviour::Reply(vec!["ok"]));
        let seen = upstream.requests();
        let state = state_with(upstream, &["m0", "m1"]);
        let sessions = state.sessions.clone().unwrap();
        let base = spawn_relay(state).await;
        let client = reqwest::Client::new();
        let session = SessionId::new();

        client
            .post(format!("{base}/chat"))
            .json(&serde_json::json!({"message": "hi", "session_id": session}))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(sessions.selector(Some(session)).current_model(), "m1");

        let response = client
            .delete(format!("{base}/chat/sessions/{session}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);
        assert!(sessions.is_empty());

        client
            .post(format!("{base}/chat"))
            .json(&serde_json::json!({"message": "hi", "session_id": session}))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let models: Vec<String> = seen.lock().unwrap().iter().map(|r| r.model.clone()).collect();
        assert_eq!(models, vec!["m0", "m1", "m0", "m1"]);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let base = spawn_relay(state_with(FakeUpstream::new(), &["m0"])).await;
        let response = reqwest::Client::new()
            .delete(format!("{base}/chat/sessions/{}", SessionId::new()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_malformed_session_id_rejected() {
        let base = spawn_relay(state_with(FakeUpstream::new(), &["m0"])).await;
        let response = reqwest::Client::new()
            .delete(format!("{base}/chat/sessions/not-a-uuid"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }
}
