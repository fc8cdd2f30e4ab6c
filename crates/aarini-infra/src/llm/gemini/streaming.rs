//! SSE stream adapter for `streamGenerateContent?alt=sse`.
//!
//! Every SSE event carries a complete `GenerateContentResponse` JSON object
//! holding the next text delta and, usually on later events, the grounding
//! metadata. An event with an `error` object ends the stream.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;

use aarini_core::llm::provider::FragmentStream;
use aarini_types::llm::{LlmError, StreamFragment};

use super::client::{api_error, error_for_status, retry_after_ms};
use super::types::GenerateContentResponse;

/// Send a prepared streaming request and adapt its SSE body to fragments.
///
/// Events with neither text nor citations (e.g. the final usage event) are
/// skipped.
pub fn create_gemini_stream(request: reqwest::RequestBuilder, model: String) -> FragmentStream {
    Box::pin(async_stream::try_stream! {
        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            Err::<(), LlmError>(error_for_status(&model, status, retry_after, &error_body))?;
        } else {
            let mut events = response.bytes_stream().eventsource();
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| LlmError::Stream(format!("SSE stream error: {e}")))?;
                if event.data.trim().is_empty() {
                    continue;
                }
                tracing::trace!(model = %model, data = %event.data, "Gemini SSE event");

                let chunk: GenerateContentResponse = serde_json::from_str(&event.data)
                    .map_err(|e| LlmError::Deserialization(format!("SSE parsing error: {e}")))?;
                if let Some(err) = chunk.error.clone() {
                    tracing::warn!(model = %model, message = %err.message, "Upstream reported an in-stream error");
                    Err::<(), LlmError>(api_error(&model, err))?;
                }
                if let Some(reason) = chunk.block_reason() {
                    tracing::warn!(model = %model, reason = %reason, "Upstream blocked the prompt");
                    Err::<(), LlmError>(LlmError::Transient(format!("prompt blocked: {reason}")))?;
                }

                let fragment = StreamFragment {
                    text_delta: chunk.text(),
                    citations: chunk.citations(),
                };
                if !fragment.is_empty() {
                    yield fragment;
                }
            }
        }
    })
}
