//! Ordered model fallback.
//!
//! Routes streamed generations through an ordered list of candidate models.
//! A candidate that fails before producing any output hands over to the next
//! one, and the selector remembers where it stopped so later requests of the
//! same conversation start there. Output already relayed is never repeated:
//! a failure after the first fragment ends the reply instead.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::StreamExt;

use aarini_types::llm::{FailureCause, GenerateRequest, LlmError};

use super::box_provider::BoxModelClient;
use super::deadline::StreamDeadlines;
use super::provider::FragmentStream;

/// Position of a selector in its candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// The next request starts with the candidate at this index.
    Active(usize),
    /// Every candidate failed on the last request.
    Exhausted,
}

/// Walks the candidate models of one conversation.
///
/// Cloning shares the cursor; use [`FallbackSelector::fork`] for an
/// independent conversation.
#[derive(Debug, Clone)]
pub struct FallbackSelector {
    client: Arc<BoxModelClient>,
    models: Arc<[String]>,
    deadlines: StreamDeadlines,
    state: Arc<Mutex<SelectorState>>,
}

impl FallbackSelector {
    /// Create a selector positioned at the first candidate.
    pub fn new(
        client: Arc<BoxModelClient>,
        models: Vec<String>,
        deadlines: StreamDeadlines,
    ) -> Result<Self, LlmError> {
        if models.is_empty() {
            return Err(LlmError::Configuration(
                "at least one candidate model is required".to_string(),
            ));
        }
        Ok(Self {
            client,
            models: models.into(),
            deadlines,
            state: Arc::new(Mutex::new(SelectorState::Active(0))),
        })
    }

    /// Same client and candidates, fresh cursor.
    pub fn fork(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            models: Arc::clone(&self.models),
            deadlines: self.deadlines,
            state: Arc::new(Mutex::new(SelectorState::Active(0))),
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn state(&self) -> SelectorState {
        *lock(&self.state)
    }

    /// Model the next request will try first.
    pub fn current_model(&self) -> &str {
        let idx = match self.state() {
            SelectorState::Active(i) => i,
            SelectorState::Exhausted => self.models.len() - 1,
        };
        &self.models[idx]
    }

    /// Return to the first candidate.
    pub fn reset(&self) {
        *lock(&self.state) = SelectorState::Active(0);
        tracing::debug!("Fallback selector reset to primary model");
    }

    /// Stream a generation, falling back through the remaining candidates.
    ///
    /// Each call makes at most one attempt per candidate from the cursor
    /// onwards. An exhausted selector retries only the last candidate.
    pub fn stream(&self, request: GenerateRequest) -> FragmentStream {
        let start = {
            let mut state = lock(&self.state);
            match *state {
                SelectorState::Active(i) => i,
                SelectorState::Exhausted => {
                    let last = self.models.len() - 1;
                    *state = SelectorState::Active(last);
                    last
                }
            }
        };

        let client = Arc::clone(&self.client);
        let models = Arc::clone(&self.models);
        let state = Arc::clone(&self.state);
        let deadlines = self.deadlines;

        Box::pin(async_stream::stream! {
            let deadline = deadlines.deadline_from_now();
            let mut attempts = 0usize;
            let mut all_access = true;
            let mut last_error: Option<LlmError> = None;

            for idx in start..models.len() {
                let model = &models[idx];
                attempts += 1;
                if idx > start {
                    tracing::warn!(model = %model, attempt = attempts, "Failing over to next candidate model");
                }

                let mut upstream = deadlines.guard(client.stream(request.for_model(model)), deadline);
                let mut emitted = false;
                let mut failure: Option<LlmError> = None;

                while let Some(item) = upstream.next().await {
                    match item {
                        Ok(fragment) if fragment.is_empty() => {}
                        Ok(fragment) => {
                            emitted = true;
                            yield Ok(fragment);
                        }
                        Err(err) => {
                            failure = Some(err);
                            break;
                        }
                    }
                }

                let err = match failure {
                    None if emitted => {
                        tracing::debug!(model = %model, "Upstream stream completed");
                        return;
                    }
                    // A reply with no content is treated like an outage.
                    None => LlmError::Transient("upstream ended without any content".to_string()),
                    Some(err) => err,
                };

                if emitted {
                    tracing::warn!(model = %model, error = %err, "Upstream failed after partial output");
                    yield Err(LlmError::Interrupted {
                        model: model.clone(),
                        message: err.to_string(),
                    });
                    return;
                }

                if !err.triggers_fallback() {
                    tracing::error!(model = %model, error = %err, "Non-failover error, returning immediately");
                    yield Err(err);
                    return;
                }

                tracing::warn!(model = %model, error = %err, "Model failed before output");
                *lock(&state) = if idx + 1 < models.len() {
                    SelectorState::Active(idx + 1)
                } else {
                    SelectorState::Exhausted
                };
                all_access &= err.cause() == FailureCause::Access;
                let out_of_time = matches!(err, LlmError::DeadlineExceeded { .. });
                last_error = Some(err);
                if out_of_time {
                    break;
                }
            }

            let message = last_error.map(|e| e.to_string()).unwrap_or_default();
            let cause = if all_access { FailureCause::Access } else { FailureCause::Transient };
            tracing::error!(attempts, %cause, "All candidate models failed");
            yield Err(LlmError::AllModelsFailed { cause, attempts, message });
        })
    }
}

fn lock(state: &Mutex<SelectorState>) -> MutexGuard<'_, SelectorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
