//! Upstream model request/response types for Aarini.
//!
//! These types model the data shapes for generative-model interactions:
//! streamed generation requests, text fragments with web citations, and
//! error handling with the failure classes the fallback selector acts on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in an upstream conversation.
///
/// The upstream API names the assistant side `model`; older clients send
/// `bot` or `assistant`, which are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    #[serde(alias = "assistant", alias = "bot")]
    Model,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Model => write!(f, "model"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "model" | "assistant" | "bot" => Ok(MessageRole::Model),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in an upstream conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            text: text.into(),
        }
    }
}

/// Request to an upstream model for a (streamed) generation.
///
/// `contents` is the full conversation, oldest first, ending with the new
/// user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub contents: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(default)]
    pub web_grounding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerateRequest {
    /// Copy of this request addressed to a different model.
    pub fn for_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }
}

/// Title used when the upstream gives a citation without one.
pub const DEFAULT_CITATION_TITLE: &str = "Web Source";

/// A web source the model's answer was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
}

impl Citation {
    /// Build a citation, dropping entries without a URL and defaulting the title.
    pub fn new(url: Option<&str>, title: Option<&str>) -> Option<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_CITATION_TITLE);
        Some(Self {
            url: url.to_string(),
            title: title.to_string(),
        })
    }
}

/// One increment of a streamed generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFragment {
    pub text_delta: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

impl StreamFragment {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            text_delta: delta.into(),
            citations: Vec::new(),
        }
    }

    /// A fragment carrying neither text nor citations.
    pub fn is_empty(&self) -> bool {
        self.text_delta.is_empty() && self.citations.is_empty()
    }
}

/// Response from an upstream model for a non-streaming generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub model: String,
    pub text: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Coarse classification of a failed request, surfaced to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureCause {
    /// Credential, permission, or model-availability problem. Retrying won't help.
    Access,
    /// Network, overload, or timeout problem. A retry may succeed.
    Transient,
}

impl FailureCause {
    /// Static, user-presentable description of the cause.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureCause::Access => {
                "The assistant is not available right now. The service may need its API access enabled."
            }
            FailureCause::Transient => "Connection error. Please try again.",
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Access => write!(f, "access"),
            FailureCause::Transient => write!(f, "transient"),
        }
    }
}

/// Errors from upstream model operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("model '{model}' unavailable: {message}")]
    ModelUnavailable { model: String, message: String },

    #[error("transient upstream error: {0}")]
    Transient(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("no data received for {idle_ms}ms")]
    Idle { idle_ms: u64 },

    #[error("stream exceeded its {budget_ms}ms budget")]
    DeadlineExceeded { budget_ms: u64 },

    #[error("stream from '{model}' interrupted after partial output: {message}")]
    Interrupted { model: String, message: String },

    #[error("all {attempts} candidate model(s) failed ({cause}): {message}")]
    AllModelsFailed {
        cause: FailureCause,
        attempts: usize,
        message: String,
    },
}

impl LlmError {
    /// Classify this error for the end user.
    pub fn cause(&self) -> FailureCause {
        match self {
            LlmError::Configuration(_) | LlmError::ModelUnavailable { .. } => FailureCause::Access,
            LlmError::AllModelsFailed { cause, .. } => *cause,
            _ => FailureCause::Transient,
        }
    }

    /// Whether the next candidate model should be tried after this error.
    ///
    /// Only meaningful for failures before any output was produced.
    pub fn triggers_fallback(&self) -> bool {
        !matches!(
            self,
            LlmError::Configuration(_)
                | LlmError::Interrupted { .. }
                | LlmError::AllModelsFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Model] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_accepts_legacy_names() {
        let parsed: Message = serde_json::from_str(r#"{"role":"bot","text":"hi"}"#).unwrap();
        assert_eq!(parsed.role, MessageRole::Model);
        assert_eq!("assistant".parse::<MessageRole>().unwrap(), MessageRole::Model);
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_string(&Message::model("hello")).unwrap();
        assert_eq!(json, r#"{"role":"model","text":"hello"}"#);
    }

    #[test]
    fn test_citation_defaults_title() {
        let c = Citation::new(Some("https://example.com"), None).unwrap();
        assert_eq!(c.title, DEFAULT_CITATION_TITLE);

        let c = Citation::new(Some("https://example.com"), Some("  ")).unwrap();
        assert_eq!(c.title, DEFAULT_CITATION_TITLE);
    }

    #[test]
    fn test_citation_without_url_is_dropped() {
        assert!(Citation::new(None, Some("Title")).is_none());
        assert!(Citation::new(Some(""), Some("Title")).is_none());
    }

    #[test]
    fn test_for_model_keeps_everything_else() {
        let req = GenerateRequest {
            model: "a".into(),
            contents: vec![Message::user("hi")],
            system_instruction: Some("be brief".into()),
            web_grounding: true,
            max_output_tokens: Some(1000),
        };
        let other = req.for_model("b");
        assert_eq!(other.model, "b");
        assert_eq!(other.contents, req.contents);
        assert_eq!(other.system_instruction, req.system_instruction);
        assert_eq!(other.max_output_tokens, Some(1000));
    }

    #[test]
    fn test_error_classification() {
        let unavailable = LlmError::ModelUnavailable {
            model: "m".into(),
            message: "404".into(),
        };
        assert_eq!(unavailable.cause(), FailureCause::Access);
        assert!(unavailable.triggers_fallback());

        let idle = LlmError::Idle { idle_ms: 30_000 };
        assert_eq!(idle.cause(), FailureCause::Transient);
        assert!(idle.triggers_fallback());

        let config = LlmError::Configuration("no models".into());
        assert_eq!(config.cause(), FailureCause::Access);
        assert!(!config.triggers_fallback());

        let interrupted = LlmError::Interrupted {
            model: "m".into(),
            message: "reset".into(),
        };
        assert!(!interrupted.triggers_fallback());
    }

    #[test]
    fn test_all_models_failed_display() {
        let err = LlmError::AllModelsFailed {
            cause: FailureCause::Access,
            attempts: 3,
            message: "not found".into(),
        };
        assert!(err.to_string().contains("all 3 candidate"));
        assert!(err.to_string().contains("access"));
        assert_eq!(err.cause(), FailureCause::Access);
    }
}
