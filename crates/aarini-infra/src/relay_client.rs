//! HTTP client for a running relay.
//!
//! Opens `POST /chat` and hands back the raw response body as a byte stream
//! for the incremental decoder. A request that fails before any byte of the
//! body arrived (connection refused, 503/504) is retried with linear
//! backoff; once bytes have been handed out the stream is never restarted,
//! so no reply text is ever duplicated.

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::StatusCode;

use aarini_types::chat::SessionId;
use aarini_types::error::RelayClientError;
use aarini_types::relay::ChatRequest;

/// Raw relay response body.
pub type RelayBody = Pin<Box<dyn Stream<Item = Result<Vec<u8>, RelayClientError>> + Send>>;

#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
    retries: u32,
    backoff: Duration,
}

impl RelayClient {
    /// Client for the relay at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: &str) -> Result<Self, RelayClientError> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|_| RelayClientError::InvalidEndpoint(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RelayClientError::InvalidEndpoint(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retries: 2,
            backoff: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a chat message and return the streaming reply body.
    pub async fn open(&self, request: &ChatRequest) -> Result<RelayBody, RelayClientError> {
        let url = format!("{}/chat", self.base_url);
        let mut attempt = 0u32;

        loop {
            let error = match self.client.post(&url).json(request).send().await {
                Ok(response) if response.status().is_success() => {
                    let body = response.bytes_stream().map(|chunk| {
                        chunk
                            .map(|bytes| bytes.to_vec())
                            .map_err(|e| RelayClientError::Stream(e.to_string()))
                    });
                    return Ok(Box::pin(body));
                }
                Ok(response) => {
                    let status = response.status();
                    let error = RelayClientError::Status {
                        status: status.as_u16(),
                    };
                    if !retryable_status(status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) => RelayClientError::Transport(e.to_string()),
            };

            if attempt >= self.retries {
                return Err(error);
            }
            attempt += 1;
            tracing::warn!(attempt, error = %error, "Relay request failed before any reply, retrying");
            tokio::time::sleep(self.backoff * attempt).await;
        }
    }

    /// Ask the relay to forget a session's fallback position.
    pub async fn reset_session(&self, session_id: SessionId) -> Result<(), RelayClientError> {
        let url = format!("{}/chat/sessions/{session_id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| RelayClientError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(RelayClientError::Status {
                status: status.as_u16(),
            })
        }
    }
}

fn retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}
