//! Message lifecycle controller.
//!
//! Owns the turns of one conversation on the client side. Each submitted
//! message creates a user turn and an assistant turn in `Pending`; relay
//! chunks move the assistant turn to `Streaming`, and the end of the body (or
//! a failure) settles it as `Complete` or `Failed`. Only one reply is in
//! flight at a time: submitting again cancels the previous one, and chunks
//! addressed to a superseded turn are discarded.

use tokio_util::sync::CancellationToken;

use aarini_types::chat::{
    Author, ConversationTurn, FailureReason, LifecycleState, SessionId, TurnId,
};
use aarini_types::error::ChatError;
use aarini_types::llm::Message;
use aarini_types::relay::{APOLOGY_MESSAGE, ChatRequest};

use crate::stream::{DecodedState, StreamDecoder};

/// A reply the caller must now fetch from the relay.
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub turn_id: TurnId,
    pub request: ChatRequest,
    /// Cancelled when the reply is superseded or the conversation is reset.
    pub cancel: CancellationToken,
}

/// What happened to a chunk or settlement addressed to a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Applied(LifecycleState),
    /// The turn is no longer the active reply.
    Discarded,
}

#[derive(Debug)]
struct ActiveReply {
    turn_id: TurnId,
    decoder: StreamDecoder,
    cancel: CancellationToken,
}

#[derive(Debug)]
pub struct Conversation {
    session_id: SessionId,
    turns: Vec<ConversationTurn>,
    active: Option<ActiveReply>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            session_id: SessionId::new(),
            turns: Vec::new(),
            active: None,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn turn(&self, id: TurnId) -> Option<&ConversationTurn> {
        self.turns.iter().find(|t| t.id == id)
    }

    /// Assistant turn currently awaiting or receiving its reply.
    pub fn active_turn(&self) -> Option<TurnId> {
        self.active.as_ref().map(|a| a.turn_id)
    }

    /// Add a locally generated assistant message. It is never sent upstream.
    pub fn greet(&mut self, text: impl Into<String>, suggestions: Vec<String>) -> TurnId {
        let turn = ConversationTurn::greeting(text, suggestions);
        let id = turn.id;
        self.turns.push(turn);
        id
    }

    /// Completed exchanges so far, in upstream wire form.
    ///
    /// A user message is only sent back together with its answer, so the
    /// history always alternates user and model and never ends on a user
    /// message whose reply failed.
    pub fn history(&self) -> Vec<Message> {
        let mut history = Vec::new();
        let mut turns = self.turns.iter().filter(|t| !t.greeting).peekable();
        while let Some(turn) = turns.next() {
            if turn.author != Author::User {
                continue;
            }
            let Some(reply) = turns.next_if(|t| t.author == Author::Assistant) else {
                continue;
            };
            if reply.state == LifecycleState::Complete && !reply.display_text.is_empty() {
                history.push(Message::user(turn.display_text.clone()));
                history.push(Message::model(reply.display_text.clone()));
            }
        }
        history
    }

    /// Suggestions of the latest turn, shown only once it is complete.
    pub fn visible_suggestions(&self) -> Option<&[String]> {
        self.turns.last().and_then(|t| t.visible_suggestions())
    }

    /// Record a user message and open a pending assistant turn for its reply.
    ///
    /// Any reply still in flight is cancelled first.
    pub fn submit(&mut self, text: &str) -> Result<PendingReply, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.cancel_active();

        let history = self.history();
        self.turns.push(ConversationTurn::user(text));
        let reply = ConversationTurn::assistant_pending();
        let turn_id = reply.id;
        self.turns.push(reply);

        let cancel = CancellationToken::new();
        self.active = Some(ActiveReply {
            turn_id,
            decoder: StreamDecoder::new(),
            cancel: cancel.clone(),
        });
        tracing::debug!(session_id = %self.session_id, turn_id = %turn_id, "Submitted message");

        Ok(PendingReply {
            turn_id,
            request: ChatRequest {
                message: text.to_string(),
                history,
                session_id: Some(self.session_id),
            },
            cancel,
        })
    }

    /// Apply the next chunk of the relay body for `turn_id`.
    pub fn apply_chunk(&mut self, turn_id: TurnId, bytes: &[u8]) -> Result<ChunkOutcome, ChatError> {
        let Some(active) = self.active.as_mut().filter(|a| a.turn_id == turn_id) else {
            tracing::debug!(turn_id = %turn_id, "Discarding chunk for inactive turn");
            return Ok(ChunkOutcome::Discarded);
        };
        let state = active.decoder.feed(bytes);
        let raw = active.decoder.raw_text().to_string();

        if let Some(failure) = state.error.clone() {
            let turn = self.update_turn(turn_id, &raw, state)?;
            turn.failure = Some(FailureReason::Upstream { code: failure.code });
            return self.settle_failed(turn_id);
        }

        let turn = self.update_turn(turn_id, &raw, state)?;
        if turn.state == LifecycleState::Pending {
            turn.state = LifecycleState::Streaming;
        }
        Ok(ChunkOutcome::Applied(turn.state))
    }

    /// The relay body for `turn_id` ended normally.
    pub fn complete(&mut self, turn_id: TurnId) -> Result<ChunkOutcome, ChatError> {
        let Some(active) = self.active.as_mut().filter(|a| a.turn_id == turn_id) else {
            return Ok(ChunkOutcome::Discarded);
        };
        let state = active.decoder.finish();
        let raw = active.decoder.raw_text().to_string();

        if let Some(failure) = state.error.clone() {
            let turn = self.update_turn(turn_id, &raw, state)?;
            turn.failure = Some(FailureReason::Upstream { code: failure.code });
            return self.settle_failed(turn_id);
        }

        let turn = self.update_turn(turn_id, &raw, state)?;
        turn.state = LifecycleState::Complete;
        self.active = None;
        tracing::debug!(turn_id = %turn_id, "Reply complete");
        Ok(ChunkOutcome::Applied(LifecycleState::Complete))
    }

    /// The relay request for `turn_id` failed (network error or non-2xx status).
    ///
    /// Text already received stays visible.
    pub fn fail(&mut self, turn_id: TurnId, reason: FailureReason) -> Result<ChunkOutcome, ChatError> {
        if self.active_turn() != Some(turn_id) {
            return Ok(ChunkOutcome::Discarded);
        }
        let turn = self.turn_mut(turn_id)?;
        turn.failure = Some(reason);
        self.settle_failed(turn_id)
    }

    /// Cancel the reply in flight, if any. Returns the cancelled turn.
    pub fn cancel_active(&mut self) -> Option<TurnId> {
        let turn_id = self.active_turn()?;
        if let Ok(turn) = self.turn_mut(turn_id) {
            turn.failure = Some(FailureReason::Cancelled);
        }
        self.settle_failed(turn_id).ok()?;
        tracing::debug!(turn_id = %turn_id, "Cancelled reply in flight");
        Some(turn_id)
    }

    /// Forget every turn and start a new session.
    pub fn reset(&mut self) {
        self.cancel_active();
        self.turns.clear();
        self.session_id = SessionId::new();
        tracing::debug!(session_id = %self.session_id, "Conversation reset");
    }

    fn turn_mut(&mut self, turn_id: TurnId) -> Result<&mut ConversationTurn, ChatError> {
        self.turns
            .iter_mut()
            .find(|t| t.id == turn_id)
            .ok_or(ChatError::TurnNotFound(turn_id))
    }

    fn update_turn(
        &mut self,
        turn_id: TurnId,
        raw: &str,
        state: DecodedState,
    ) -> Result<&mut ConversationTurn, ChatError> {
        let turn = self.turn_mut(turn_id)?;
        turn.raw_text = raw.to_string();
        turn.display_text = state.display_text;
        turn.sources = state.sources;
        turn.suggestions = state.suggestions;
        Ok(turn)
    }

    fn settle_failed(&mut self, turn_id: TurnId) -> Result<ChunkOutcome, ChatError> {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
        let turn = self.turn_mut(turn_id)?;
        turn.state = LifecycleState::Failed;
        turn.suggestions = None;
        if turn.display_text.is_empty() {
            turn.display_text = APOLOGY_MESSAGE.to_string();
        } else {
            turn.notice = Some(APOLOGY_MESSAGE.to_string());
        }
        tracing::debug!(turn_id = %turn_id, reason = ?turn.failure, "Reply failed");
        Ok(ChunkOutcome::Applied(LifecycleState::Failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aarini_types::llm::MessageRole;
    use aarini_types::relay::FailureCode;

    const REPLY: &[u8] = b"{\"text\":\"Bandra has 3 listings.\\n---SUGGESTIONS---\\nShow 2BHK?\"}\n";

    fn assistant(conv: &Conversation, id: TurnId) -> &ConversationTurn {
        conv.turn(id).unwrap()
    }

    #[test]
    fn test_submit_creates_user_and_pending_turns() {
        let mut conv = Conversation::new();
        let pending = conv.submit("  flats in Bandra?  ").unwrap();

        assert_eq!(conv.turns().len(), 2);
        assert_eq!(conv.turns()[0].author, Author::User);
        assert_eq!(conv.turns()[0].display_text, "flats in Bandra?");
        assert_eq!(assistant(&conv, pending.turn_id).state, LifecycleState::Pending);
        assert_eq!(pending.request.message, "flats in Bandra?");
        assert!(pending.request.history.is_empty());
        assert_eq!(pending.request.session_id, Some(conv.session_id()));
    }

    #[test]
    fn test_empty_message_rejected() {
        let mut conv = Conversation::new();
        assert_eq!(conv.submit("   ").unwrap_err(), ChatError::EmptyMessage);
        assert!(conv.turns().is_empty());
    }

    #[test]
    fn test_stream_then_complete() {
        let mut conv = Conversation::new();
        let id = conv.submit("hi").unwrap().turn_id;

        let outcome = conv.apply_chunk(id, &REPLY[..20]).unwrap();
        assert_eq!(outcome, ChunkOutcome::Applied(LifecycleState::Streaming));
        let outcome = conv.apply_chunk(id, &REPLY[20..]).unwrap();
        assert_eq!(outcome, ChunkOutcome::Applied(LifecycleState::Streaming));
        assert_eq!(assistant(&conv, id).display_text, "Bandra has 3 listings.");
        assert!(conv.visible_suggestions().is_none());

        assert_eq!(
            conv.complete(id).unwrap(),
            ChunkOutcome::Applied(LifecycleState::Complete)
        );
        assert_eq!(conv.visible_suggestions().unwrap(), ["Show 2BHK?".to_string()]);
        assert!(assistant(&conv, id).raw_text.contains("---SUGGESTIONS---"));
        assert!(conv.active_turn().is_none());
    }

    #[test]
    fn test_history_uses_display_text() {
        let mut conv = Conversation::new();
        conv.greet("Hello! Ask me anything.", vec!["Start?".into()]);
        let id = conv.submit("hi").unwrap().turn_id;
        conv.apply_chunk(id, REPLY).unwrap();
        conv.complete(id).unwrap();

        let pending = conv.submit("more").unwrap();
        let history = pending.request.history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].role, MessageRole::Model);
        assert_eq!(history[1].text, "Bandra has 3 listings.");
    }

    #[test]
    fn test_new_submit_cancels_reply_in_flight() {
        let mut conv = Conversation::new();
        let first = conv.submit("one").unwrap();
        conv.apply_chunk(first.turn_id, b"{\"text\":\"partial\"}\n").unwrap();

        let second = conv.submit("two").unwrap();
        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());

        let old = assistant(&conv, first.turn_id);
        assert_eq!(old.state, LifecycleState::Failed);
        assert_eq!(old.failure, Some(FailureReason::Cancelled));
        assert_eq!(old.display_text, "partial");

        // Late chunks for the superseded turn are ignored.
        let outcome = conv.apply_chunk(first.turn_id, b"{\"text\":\" more\"}\n").unwrap();
        assert_eq!(outcome, ChunkOutcome::Discarded);
        assert_eq!(assistant(&conv, first.turn_id).display_text, "partial");
        assert_eq!(conv.complete(first.turn_id).unwrap(), ChunkOutcome::Discarded);
    }

    #[test]
    fn test_relay_failure_keeps_partial_text() {
        let mut conv = Conversation::new();
        let id = conv.submit("hi").unwrap().turn_id;
        conv.apply_chunk(id, b"{\"text\":\"Half\"}\n").unwrap();

        assert_eq!(
            conv.fail(id, FailureReason::Relay).unwrap(),
            ChunkOutcome::Applied(LifecycleState::Failed)
        );
        let turn = assistant(&conv, id);
        assert_eq!(turn.display_text, "Half");
        assert_eq!(turn.notice.as_deref(), Some(APOLOGY_MESSAGE));
        assert!(conv.visible_suggestions().is_none());
    }

    #[test]
    fn test_failure_before_output_shows_apology() {
        let mut conv = Conversation::new();
        let id = conv.submit("hi").unwrap().turn_id;
        conv.fail(id, FailureReason::Relay).unwrap();
        assert_eq!(assistant(&conv, id).display_text, APOLOGY_MESSAGE);
    }

    #[test]
    fn test_error_record_fails_turn() {
        let mut conv = Conversation::new();
        let id = conv.submit("hi").unwrap().turn_id;
        let body = b"{\"text\":\"Hel\"}\n{\"error\":{\"code\":\"interrupted\",\"message\":\"x\"}}\n";
        let outcome = conv.apply_chunk(id, body).unwrap();

        assert_eq!(outcome, ChunkOutcome::Applied(LifecycleState::Failed));
        let turn = assistant(&conv, id);
        assert_eq!(
            turn.failure,
            Some(FailureReason::Upstream { code: FailureCode::Interrupted })
        );
        assert_eq!(turn.display_text, "Hel");
        assert!(conv.active_turn().is_none());
    }

    #[test]
    fn test_failed_turn_excluded_from_history() {
        let mut conv = Conversation::new();
        let id = conv.submit("hi").unwrap().turn_id;
        conv.fail(id, FailureReason::Relay).unwrap();
        let pending = conv.submit("again").unwrap();
        assert!(pending.request.history.is_empty());
    }

    #[test]
    fn test_history_alternates_after_failed_exchange() {
        let mut conv = Conversation::new();
        let first = conv.submit("first").unwrap().turn_id;
        conv.fail(first, FailureReason::Relay).unwrap();
        let second = conv.submit("second").unwrap().turn_id;
        conv.apply_chunk(second, b"{\"text\":\"answer\"}\n").unwrap();
        conv.complete(second).unwrap();

        let history = conv.submit("third").unwrap().request.history;
        assert_eq!(history, vec![Message::user("second"), Message::model("answer")]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut conv = Conversation::new();
        let before = conv.session_id();
        let pending = conv.submit("hi").unwrap();

        conv.reset();
        assert!(conv.turns().is_empty());
        assert!(pending.cancel.is_cancelled());
        assert_ne!(conv.session_id(), before);
        assert_eq!(
            conv.apply_chunk(pending.turn_id, REPLY).unwrap(),
            ChunkOutcome::Discarded
        );
    }

    #[test]
    fn test_greeting_suggestions_visible() {
        let mut conv = Conversation::new();
        conv.greet("Hi!", vec!["What can you do?".into()]);
        assert_eq!(conv.visible_suggestions().unwrap().len(), 1);
        assert!(conv.history().is_empty());
    }
}
