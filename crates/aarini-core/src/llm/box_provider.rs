//! BoxModelClient -- object-safe dynamic dispatch wrapper for ModelClient.
//!
//! 1. Define an object-safe `ModelClientDyn` trait with boxed futures
//! 2. Blanket-impl `ModelClientDyn` for all `T: ModelClient`
//! 3. `BoxModelClient` wraps `Box<dyn ModelClientDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use aarini_types::llm::{CompletionResponse, GenerateRequest, LlmError};

use super::provider::{FragmentStream, ModelClient};

/// Object-safe version of [`ModelClient`] with boxed futures.
pub trait ModelClientDyn: Send + Sync {
    fn name(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

    fn stream_boxed(&self, request: GenerateRequest) -> FragmentStream;
}

impl<T: ModelClient> ModelClientDyn for T {
    fn name(&self) -> &str {
        ModelClient::name(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }

    fn stream_boxed(&self, request: GenerateRequest) -> FragmentStream {
        self.stream(request)
    }
}

/// Type-erased model client.
///
/// Since `ModelClient` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxModelClient` provides equivalent methods that delegate to the
/// inner `ModelClientDyn` trait object.
pub struct BoxModelClient {
    inner: Box<dyn ModelClientDyn + Send + Sync>,
}

impl BoxModelClient {
    pub fn new<T: ModelClient + 'static>(client: T) -> Self {
        Self {
            inner: Box::new(client),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn complete(&self, request: &GenerateRequest) -> Result<CompletionResponse, LlmError> {
        self.inner.complete_boxed(request).await
    }

    pub fn stream(&self, request: GenerateRequest) -> FragmentStream {
        self.inner.stream_boxed(request)
    }
}

impl std::fmt::Debug for BoxModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxModelClient")
            .field("name", &self.name())
            .finish()
    }
}
