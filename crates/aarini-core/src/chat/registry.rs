//! Per-session fallback selectors held by the relay server.
//!
//! Each conversation that identifies itself with a session id gets its own
//! [`FallbackSelector`], so a fallback taken for one conversation does not
//! affect others. Sessions idle for longer than the TTL are evicted and start
//! over at the primary model.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use aarini_types::chat::SessionId;
use aarini_types::llm::LlmError;

use crate::llm::box_provider::BoxModelClient;
use crate::llm::deadline::StreamDeadlines;
use crate::llm::fallback::FallbackSelector;

#[derive(Debug)]
struct SessionEntry {
    selector: FallbackSelector,
    last_used: Instant,
}

#[derive(Debug)]
pub struct SessionRegistry {
    template: FallbackSelector,
    sessions: DashMap<SessionId, SessionEntry>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(
        client: Arc<BoxModelClient>,
        models: Vec<String>,
        deadlines: StreamDeadlines,
        ttl: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            template: FallbackSelector::new(client, models, deadlines)?,
            sessions: DashMap::new(),
            ttl,
        })
    }

    /// Selector for a session, created on first use.
    ///
    /// Requests without a session id get a fresh selector every time.
    pub fn selector(&self, session_id: Option<SessionId>) -> FallbackSelector {
        let Some(id) = session_id else {
            return self.template.fork();
        };
        let mut entry = self.sessions.entry(id).or_insert_with(|| {
            tracing::debug!(session_id = %id, "Opening relay session");
            SessionEntry {
                selector: self.template.fork(),
                last_used: Instant::now(),
            }
        });
        entry.last_used = Instant::now();
        entry.selector.clone()
    }

    /// Forget a session. Returns whether it existed.
    pub fn reset(&self, session_id: SessionId) -> bool {
        let existed = self.sessions.remove(&session_id).is_some();
        tracing::debug!(session_id = %session_id, existed, "Reset relay session");
        existed
    }

    /// Drop sessions unused for longer than the TTL. Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions.retain(|_, entry| entry.last_used.elapsed() <= ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle relay sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn models(&self) -> &[String] {
        self.template.models()
    }
}
