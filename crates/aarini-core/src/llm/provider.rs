//! ModelClient trait definition.
//!
//! This is the core abstraction every upstream generative-model backend
//! implements. Uses RPITIT for `complete`, and `Pin<Box<dyn Stream>>` for
//! `stream` (streams need to be object-safe for the BoxModelClient wrapper).

use std::pin::Pin;

use futures_util::Stream;

use aarini_types::llm::{CompletionResponse, GenerateRequest, LlmError, StreamFragment};

/// A boxed, `'static` stream of upstream fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamFragment, LlmError>> + Send + 'static>>;

/// Trait for upstream model backends.
///
/// The model to call is named by `GenerateRequest::model`; one client serves
/// every candidate model of the same API.
///
/// Implementations live in aarini-infra (e.g., `GeminiClient`).
pub trait ModelClient: Send + Sync {
    /// Human-readable backend name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a generation request and receive the full response.
    fn complete(
        &self,
        request: &GenerateRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;

    /// Start a streamed generation.
    ///
    /// The stream yields fragments in upstream order and ends after the
    /// upstream signals completion, or with a single `Err` on failure.
    fn stream(&self, request: GenerateRequest) -> FragmentStream;
}
