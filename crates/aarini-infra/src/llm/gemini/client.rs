//! GeminiClient -- concrete [`ModelClient`] implementation for Google Gemini.
//!
//! Sends requests to the Generative Language API
//! (`/v1beta/models/{model}:generateContent` and
//! `:streamGenerateContent?alt=sse`) with the key in the `x-goog-api-key`
//! header.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};

use aarini_core::llm::provider::{FragmentStream, ModelClient};
use aarini_types::llm::{CompletionResponse, GenerateRequest, LlmError};

use super::streaming::create_gemini_stream;
use super::types::{ApiError, ApiErrorBody, GeminiRequest, GenerateContentResponse};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini upstream client. One instance serves every Gemini model.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.base_url)
    }

    fn post(&self, url: &str, body: &GeminiRequest) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
    }
}

// GeminiClient does NOT derive Debug so the client internals stay out of logs.

impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &GenerateRequest) -> Result<CompletionResponse, LlmError> {
        let body = GeminiRequest::from(request);
        let url = self.url(&request.model, "generateContent");
        tracing::debug!(model = %request.model, "Sending generateContent request");

        let response = self
            .post(&url, &body)
            .send()
            .await
            .map_err(|e| LlmError::Transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(error_for_status(&request.model, status, retry_after, &error_body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;
        if let Some(err) = parsed.error.clone() {
            return Err(api_error(&request.model, err));
        }
        if let Some(reason) = parsed.block_reason() {
            return Err(LlmError::Transient(format!("prompt blocked: {reason}")));
        }

        Ok(CompletionResponse {
            model: request.model.clone(),
            text: parsed.text(),
            citations: parsed.citations(),
        })
    }

    fn stream(&self, request: GenerateRequest) -> FragmentStream {
        let body = GeminiRequest::from(&request);
        let url = format!("{}?alt=sse", self.url(&request.model, "streamGenerateContent"));
        tracing::debug!(model = %request.model, "Opening streamGenerateContent request");

        create_gemini_stream(self.post(&url, &body), request.model)
    }
}

/// Map a non-2xx upstream response to an error.
///
/// Credential, permission and unknown-model responses are access problems;
/// everything else may go away on retry.
pub(crate) fn error_for_status(
    model: &str,
    status: StatusCode,
    retry_after_ms: Option<u64>,
    body: &str,
) -> LlmError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status.as_u16() {
        400 | 401 | 403 | 404 => LlmError::ModelUnavailable {
            model: model.to_string(),
            message: format!("HTTP {status}: {message}"),
        },
        429 => LlmError::RateLimited { retry_after_ms },
        _ => LlmError::Transient(format!("HTTP {status}: {message}")),
    }
}

/// Map an error object delivered inside a response body or stream.
pub(crate) fn api_error(model: &str, err: ApiError) -> LlmError {
    match err.code {
        Some(code @ (400 | 401 | 403 | 404)) => LlmError::ModelUnavailable {
            model: model.to_string(),
            message: format!("{code}: {}", err.message),
        },
        Some(429) => LlmError::RateLimited { retry_after_ms: None },
        _ => LlmError::Transient(format!(
            "{}: {}",
            err.status.as_deref().unwrap_or("UNKNOWN"),
            err.message
        )),
    }
}

pub(crate) fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs * 1000)
}
