//! Wire types for the NDJSON chat relay.
//!
//! A relay response body is a sequence of UTF-8 JSON objects, one per line,
//! each terminated by `\n`. Every record carries at least one of `text`,
//! `grounding`, or `error`; an `error` record is always the last line.

use serde::{Deserialize, Serialize};

use crate::chat::SessionId;
use crate::llm::{Citation, FailureCause, LlmError, Message, StreamFragment};

/// Line that separates the displayable answer from the follow-up suggestions.
///
/// The model is instructed to emit this on its own line, followed by one
/// suggested question per line. The block runs to a second sentinel line or
/// to the end of the reply.
pub const SUGGESTIONS_SENTINEL: &str = "---SUGGESTIONS---";

/// Generic notice shown when a reply could not be completed.
pub const APOLOGY_MESSAGE: &str = "Sorry, I couldn't complete that reply. Please try again.";

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
    /// Keys the server-side fallback cursor; omitted for one-off requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

/// Machine-readable failure class carried in an in-stream error record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureCode {
    Access,
    Transient,
    Interrupted,
}

/// Static failure description sent to clients. Never carries upstream detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayFailure {
    pub code: FailureCode,
    pub message: String,
}

impl RelayFailure {
    pub fn new(code: FailureCode) -> Self {
        let message = match code {
            FailureCode::Access => FailureCause::Access.user_message(),
            FailureCode::Transient => FailureCause::Transient.user_message(),
            FailureCode::Interrupted => "The reply was interrupted. Please try again.",
        };
        Self {
            code,
            message: message.to_string(),
        }
    }

    pub fn from_error(err: &LlmError) -> Self {
        let code = match err {
            LlmError::Interrupted { .. } => FailureCode::Interrupted,
            other => match other.cause() {
                FailureCause::Access => FailureCode::Access,
                FailureCause::Transient => FailureCode::Transient,
            },
        };
        Self::new(code)
    }
}

/// One line of the relay response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RelayFailure>,
}

impl RelayRecord {
    /// Record for an upstream fragment, or `None` when it would be empty.
    pub fn from_fragment(fragment: StreamFragment) -> Option<Self> {
        if fragment.is_empty() {
            return None;
        }
        Some(Self {
            text: Some(fragment.text_delta).filter(|t| !t.is_empty()),
            grounding: Some(fragment.citations).filter(|c| !c.is_empty()),
            error: None,
        })
    }

    pub fn failure(failure: RelayFailure) -> Self {
        Self {
            error: Some(failure),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.grounding.is_none() && self.error.is_none()
    }

    /// Serialize as one NDJSON line, including the trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
