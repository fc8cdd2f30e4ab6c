//! Fake upstream and loopback server helpers for the HTTP tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use aarini_core::llm::box_provider::BoxModelClient;
use aarini_core::llm::provider::{FragmentStream, ModelClient};
use aarini_types::config::RelayConfig;
use aarini_types::llm::{Citation, CompletionResponse, GenerateRequest, LlmError, StreamFragment};

use crate::state::AppState;

#[derive(Debug, Clone)]
pub(crate) enum Behaviour {
    /// Stream these deltas, then end.
    Reply(Vec<&'static str>),
    /// Stream one delta with a citation attached.
    Cited(&'static str, &'static str),
    /// Stream these deltas, then break.
    BreakAfter(Vec<&'static str>),
    Unavailable,
}

/// Upstream double keyed by model name. Unknown models are unavailable.
#[derive(Default)]
pub(crate) struct FakeUpstream {
    behaviours: HashMap<String, Behaviour>,
    seen: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl FakeUpstream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn model(mut self, name: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(name.to_string(), behaviour);
        self
    }

    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<GenerateRequest>>> {
        Arc::clone(&self.seen)
    }
}

impl ModelClient for FakeUpstream {
    fn name(&self) -> &str {
        "fake"
    }

    fn complete(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let model = request.model.clone();
        let behaviour = self.behaviours.get(&model).cloned();
        async move {
            match behaviour {
                Some(Behaviour::Reply(parts)) => Ok(CompletionResponse {
                    model,
                    text: parts.concat(),
                    citations: Vec::new(),
                }),
                _ => Err(LlmError::ModelUnavailable {
                    model,
                    message: "not found".into(),
                }),
            }
        }
    }

    fn stream(&self, request: GenerateRequest) -> FragmentStream {
        self.seen.lock().unwrap().push(request.clone());
        let model = request.model;
        let behaviour = self.behaviours.get(&model).cloned().unwrap_or(Behaviour::Unavailable);
        Box::pin(async_stream::stream! {
            match behaviour {
                Behaviour::Reply(parts) => {
                    for part in parts {
                        yield Ok(StreamFragment::text(part));
                    }
                }
                Behaviour::Cited(text, url) => {
                    yield Ok(StreamFragment {
                        text_delta: text.to_string(),
                        citations: vec![Citation { url: url.to_string(), title: "Source".into() }],
                    });
                }
                Behaviour::BreakAfter(parts) => {
                    for part in parts {
                        yield Ok(StreamFragment::text(part));
                    }
                    yield Err(LlmError::Stream("connection reset".into()));
                }
                Behaviour::Unavailable => {
                    yield Err(LlmError::ModelUnavailable { model, message: "not found".into() });
                }
            }
        })
    }
}

pub(crate) fn config(models: &[&str]) -> RelayConfig {
    RelayConfig {
        models: models.iter().map(|m| m.to_string()).collect(),
        ..RelayConfig::default()
    }
}

pub(crate) fn state_with(upstream: FakeUpstream, models: &[&str]) -> AppState {
    AppState::new(
        config(models),
        Some(BoxModelClient::new(upstream)),
        "Be helpful.".into(),
    )
    .unwrap()
}

/// Serve the relay router on an ephemeral loopback port. Returns its base URL.
pub(crate) async fn spawn_relay(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = super::router::build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
