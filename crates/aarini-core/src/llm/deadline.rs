//! Idle and total time limits for upstream streams.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::Instant;

use aarini_types::llm::LlmError;

use super::provider::FragmentStream;

/// Limits applied to every streamed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDeadlines {
    /// Longest gap allowed between two upstream items.
    pub idle: Duration,
    /// Budget for the whole reply, shared by every fallback attempt.
    pub total: Duration,
}

impl Default for StreamDeadlines {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(30),
            total: Duration::from_secs(120),
        }
    }
}

impl StreamDeadlines {
    pub fn new(idle: Duration, total: Duration) -> Self {
        Self { idle, total }
    }

    /// Instant at which a reply started now must be finished.
    pub fn deadline_from_now(&self) -> Instant {
        Instant::now() + self.total
    }

    /// Wrap `inner` so it ends with an error when it stalls or runs past `deadline`.
    ///
    /// Errors from `inner` end the guarded stream too.
    pub fn guard(&self, inner: FragmentStream, deadline: Instant) -> FragmentStream {
        let idle = self.idle;
        let budget_ms = self.total.as_millis() as u64;
        Box::pin(async_stream::stream! {
            let mut inner = inner;
            loop {
                let next = tokio::time::timeout(idle, inner.next());
                match tokio::time::timeout_at(deadline, next).await {
                    Err(_) => {
                        yield Err(LlmError::DeadlineExceeded { budget_ms });
                        break;
                    }
                    Ok(Err(_)) => {
                        yield Err(LlmError::Idle { idle_ms: idle.as_millis() as u64 });
                        break;
                    }
                    Ok(Ok(None)) => break,
                    Ok(Ok(Some(Ok(fragment)))) => yield Ok(fragment),
                    Ok(Ok(Some(Err(err)))) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }
}
