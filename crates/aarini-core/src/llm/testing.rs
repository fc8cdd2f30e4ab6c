//! Scripted upstream client shared by the unit tests in this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aarini_types::llm::{Citation, CompletionResponse, GenerateRequest, LlmError, StreamFragment};

use super::provider::{FragmentStream, ModelClient};

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Text(&'static str),
    Cite(&'static str),
    Unavailable,
    Transient,
    Stall(Duration),
}

/// Plays back a fixed script per model and records which models were called.
///
/// Models without a script behave as unavailable.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    scripts: HashMap<String, Vec<Step>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(mut self, model: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(model.to_string(), steps);
        self
    }

    pub(crate) fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    fn steps_for(&self, model: &str) -> Vec<Step> {
        self.calls.lock().unwrap().push(model.to_string());
        self.scripts
            .get(model)
            .cloned()
            .unwrap_or_else(|| vec![Step::Unavailable])
    }
}

impl ModelClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let model = request.model.clone();
        let steps = self.steps_for(&model);
        async move {
            let mut text = String::new();
            for step in steps {
                match step {
                    Step::Text(t) => text.push_str(t),
                    Step::Unavailable => {
                        return Err(LlmError::ModelUnavailable {
                            model,
                            message: "not found".into(),
                        });
                    }
                    Step::Transient => return Err(LlmError::Transient("reset".into())),
                    Step::Cite(_) | Step::Stall(_) => {}
                }
            }
            Ok(CompletionResponse {
                model,
                text,
                citations: Vec::new(),
            })
        }
    }

    fn stream(&self, request: GenerateRequest) -> FragmentStream {
        let model = request.model.clone();
        let steps = self.steps_for(&model);
        Box::pin(async_stream::stream! {
            for step in steps {
                match step {
                    Step::Text(t) => yield Ok(StreamFragment::text(t)),
                    Step::Cite(url) => yield Ok(StreamFragment {
                        text_delta: String::new(),
                        citations: vec![Citation { url: url.to_string(), title: "Source".to_string() }],
                    }),
                    Step::Unavailable => {
                        yield Err(LlmError::ModelUnavailable {
                            model: model.clone(),
                            message: "not found".into(),
                        });
                        break;
                    }
                    Step::Transient => {
                        yield Err(LlmError::Transient("connection reset".into()));
                        break;
                    }
                    Step::Stall(d) => tokio::time::sleep(d).await,
                }
            }
        })
    }
}

pub(crate) fn request(text: &str) -> GenerateRequest {
    GenerateRequest {
        model: String::new(),
        contents: vec![aarini_types::llm::Message::user(text)],
        system_instruction: None,
        web_grounding: false,
        max_output_tokens: None,
    }
}
