//! Application state shared by the relay's HTTP handlers.
//!
//! The upstream client is built once at startup. When no credential is
//! configured the server still starts; chat requests then fail fast with a
//! configuration error instead of reaching the upstream.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use aarini_core::chat::SessionRegistry;
use aarini_core::llm::box_provider::BoxModelClient;
use aarini_core::llm::deadline::StreamDeadlines;
use aarini_infra::config::resolve_system_instruction;
use aarini_infra::llm::create_client;
use aarini_infra::secret::resolve_api_key;
use aarini_types::config::RelayConfig;
use aarini_types::llm::{GenerateRequest, Message};
use aarini_types::relay::ChatRequest;

/// Fixed parts of every upstream request.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub system_instruction: String,
    pub web_grounding: bool,
    pub max_output_tokens: Option<u32>,
}

impl RequestTemplate {
    /// Upstream request for a chat message: the prior history, then the message.
    ///
    /// `model` is left empty; the fallback selector fills it per attempt.
    pub fn build(&self, chat: &ChatRequest) -> GenerateRequest {
        let mut contents: Vec<Message> = chat
            .history
            .iter()
            .filter(|m| !m.text.trim().is_empty())
            .cloned()
            .collect();
        contents.push(Message::user(chat.message.trim()));

        GenerateRequest {
            model: String::new(),
            contents,
            system_instruction: Some(self.system_instruction.clone()),
            web_grounding: self.web_grounding,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    /// `None` when no upstream credential is configured.
    pub sessions: Option<Arc<SessionRegistry>>,
    pub template: Arc<RequestTemplate>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Resolve the credential and system instruction, then wire the upstream client.
    pub async fn init(config: RelayConfig) -> anyhow::Result<Self> {
        let system_instruction = resolve_system_instruction(&config).await;
        let client = match resolve_api_key() {
            Ok(api_key) => Some(create_client(&config, api_key)),
            Err(e) => {
                tracing::error!(error = %e, "Upstream credential missing; chat requests will fail until it is set");
                None
            }
        };
        Self::new(config, client, system_instruction)
    }

    pub fn new(
        config: RelayConfig,
        client: Option<BoxModelClient>,
        system_instruction: String,
    ) -> anyhow::Result<Self> {
        let deadlines = StreamDeadlines::new(config.idle_timeout(), config.stream_timeout());
        let sessions = client
            .map(|client| {
                SessionRegistry::new(
                    Arc::new(client),
                    config.models.clone(),
                    deadlines,
                    config.session_ttl(),
                )
            })
            .transpose()?
            .map(Arc::new);

        let template = RequestTemplate {
            system_instruction,
            web_grounding: config.web_grounding,
            max_output_tokens: config.max_output_tokens,
        };

        Ok(Self {
            sessions,
            template: Arc::new(template),
            config: Arc::new(config),
        })
    }

    /// Periodically evict idle sessions. Returns `None` without a registry.
    pub fn spawn_session_sweeper(&self) -> Option<JoinHandle<()>> {
        let sessions = self.sessions.clone()?;
        let period = (self.config.session_ttl() / 4).max(Duration::from_secs(1));
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let evicted = sessions.evict_idle();
                if evicted > 0 {
                    tracing::info!(evicted, remaining = sessions.len(), "Swept idle chat sessions");
                }
            }
        }))
    }
}
