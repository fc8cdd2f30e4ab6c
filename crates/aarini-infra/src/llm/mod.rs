//! Upstream model client implementations.
//!
//! Contains the concrete [`ModelClient`](aarini_core::llm::provider::ModelClient)
//! for Google Gemini, a factory ([`create_client`]) that builds it from the
//! relay configuration, and a reachability check ([`probe_model`]) for each
//! configured candidate.

pub mod gemini;

use secrecy::SecretString;

use aarini_core::llm::box_provider::BoxModelClient;
use aarini_types::config::RelayConfig;
use aarini_types::llm::{CompletionResponse, GenerateRequest, LlmError, Message};

use self::gemini::GeminiClient;

/// Create the upstream client described by `config`.
pub fn create_client(config: &RelayConfig, api_key: SecretString) -> BoxModelClient {
    let client = GeminiClient::new(api_key).with_base_url(config.base_url.clone());
    BoxModelClient::new(client)
}

/// Check that `model` answers a minimal, ungrounded request.
///
/// A `ModelUnavailable` error usually means the model name is wrong or the
/// Generative Language API is not enabled for the key's project.
pub async fn probe_model(client: &BoxModelClient, model: &str) -> Result<CompletionResponse, LlmError> {
    let request = GenerateRequest {
        model: model.to_string(),
        contents: vec![Message::user("Hello")],
        system_instruction: None,
        web_grounding: false,
        max_output_tokens: Some(16),
    };
    client.complete(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_is_gemini() {
        let client = create_client(&RelayConfig::default(), SecretString::from("test-key"));
        assert_eq!(client.name(), "gemini");
    }

    #[tokio::test]
    async fn test_probe_unreachable_upstream() {
        let config = RelayConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..RelayConfig::default()
        };
        let client = create_client(&config, SecretString::from("test-key"));
        let err = probe_model(&client, "gemini-2.5-flash").await.unwrap_err();
        assert!(matches!(err, LlmError::Transient(_)));
    }
}
