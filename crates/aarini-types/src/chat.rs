//! Conversation turn types for Aarini.
//!
//! These types model what a chat client tracks per message: who authored it,
//! where it is in its lifecycle, and the decoded reply state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::llm::Citation;
use crate::relay::FailureCode;

/// Identifies one conversation. Keys the relay's fallback cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifies one turn within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who wrote a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::User => write!(f, "user"),
            Author::Assistant => write!(f, "assistant"),
        }
    }
}

/// Lifecycle of an assistant turn.
///
/// `Pending -> Streaming -> Complete`, with `Failed` reachable from either
/// non-terminal state. User turns are created `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Pending,
    Streaming,
    Complete,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Complete | LifecycleState::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Pending => write!(f, "pending"),
            LifecycleState::Streaming => write!(f, "streaming"),
            LifecycleState::Complete => write!(f, "complete"),
            LifecycleState::Failed => write!(f, "failed"),
        }
    }
}

/// Why an assistant turn ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The relay request failed: network error or non-2xx status.
    Relay,
    /// The relay reported an in-stream error record.
    Upstream { code: FailureCode },
    /// Superseded by a newer message or a reset.
    Cancelled,
}

/// One message in a conversation as seen by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: TurnId,
    pub author: Author,
    /// Accumulated reply text, sentinel and suggestion block included.
    pub raw_text: String,
    /// Text shown to the user; never contains the suggestion block.
    pub display_text: String,
    pub created_at: DateTime<Utc>,
    pub state: LifecycleState,
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub sources: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    /// Static notice shown alongside a failed reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Locally generated greeting; never sent upstream as history.
    #[serde(default)]
    pub greeting: bool,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: TurnId::new(),
            author: Author::User,
            raw_text: text.clone(),
            display_text: text,
            created_at: Utc::now(),
            state: LifecycleState::Complete,
            suggestions: None,
            sources: Vec::new(),
            failure: None,
            notice: None,
            greeting: false,
        }
    }

    pub fn assistant_pending() -> Self {
        Self {
            id: TurnId::new(),
            author: Author::Assistant,
            raw_text: String::new(),
            display_text: String::new(),
            created_at: Utc::now(),
            state: LifecycleState::Pending,
            suggestions: None,
            sources: Vec::new(),
            failure: None,
            notice: None,
            greeting: false,
        }
    }

    pub fn greeting(text: impl Into<String>, suggestions: Vec<String>) -> Self {
        let text = text.into();
        Self {
            raw_text: text.clone(),
            display_text: text,
            state: LifecycleState::Complete,
            suggestions: Some(suggestions).filter(|s| !s.is_empty()),
            greeting: true,
            ..Self::assistant_pending()
        }
    }

    /// Suggestions are only shown once the reply is complete.
    pub fn visible_suggestions(&self) -> Option<&[String]> {
        match self.state {
            LifecycleState::Complete => self.suggestions.as_deref().filter(|s| !s.is_empty()),
            _ => None,
        }
    }
}
