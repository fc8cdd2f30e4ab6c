//! Deduplicated citation accumulation.

use std::collections::HashSet;

use aarini_types::llm::Citation;

/// Citations in first-seen order, unique by URL.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    seen: HashSet<String>,
    ordered: Vec<Citation>,
}

impl SourceSet {
    /// Add citations, ignoring URLs already present. Returns how many were new.
    pub fn merge<I>(&mut self, citations: I) -> usize
    where
        I: IntoIterator<Item = Citation>,
    {
        let mut added = 0;
        for citation in citations {
            if citation.url.is_empty() || !self.seen.insert(citation.url.clone()) {
                continue;
            }
            self.ordered.push(citation);
            added += 1;
        }
        added
    }

    pub fn as_slice(&self) -> &[Citation] {
        &self.ordered
    }
}
