//! Relay configuration types for Aarini.
//!
//! `RelayConfig` represents the `config.toml` that controls the upstream
//! model candidates, the request shape, and the relay's timeouts.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::relay::SUGGESTIONS_SENTINEL;

/// Default system instruction: answer helpfully, then append the suggestion block.
pub fn default_system_instruction() -> String {
    format!(
        "You are a helpful assistant. Answer clearly and concisely.\n\
         After your answer, output a line containing exactly {SUGGESTIONS_SENTINEL} \
         followed by 3 short follow-up questions the user might ask next, one per line."
    )
}

/// Top-level configuration for the relay.
///
/// All fields have defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Candidate models in priority order.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Inline system instruction. Takes precedence over `system_instruction_file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// File holding the system instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction_file: Option<PathBuf>,

    /// Let the model ground answers with web search.
    #[serde(default = "default_web_grounding")]
    pub web_grounding: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Upstream API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Longest gap allowed between upstream stream items.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Longest a single relayed reply may take end to end.
    #[serde(default = "default_stream_timeout_secs")]
    pub stream_timeout_secs: u64,

    /// Sessions unused for this long forget their fallback position.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Directory of static site files served alongside the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

fn default_models() -> Vec<String> {
    vec![
        "gemini-2.5-flash".to_string(),
        "gemini-2.0-flash".to_string(),
        "gemini-1.5-flash".to_string(),
    ]
}

fn default_web_grounding() -> bool {
    true
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_stream_timeout_secs() -> u64 {
    120
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            system_instruction: None,
            system_instruction_file: None,
            web_grounding: default_web_grounding(),
            max_output_tokens: None,
            base_url: default_base_url(),
            idle_timeout_secs: default_idle_timeout_secs(),
            stream_timeout_secs: default_stream_timeout_secs(),
            session_ttl_secs: default_session_ttl_secs(),
            static_dir: None,
        }
    }
}

impl RelayConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
