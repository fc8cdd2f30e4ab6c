//! Incremental decoder for relay response bodies.
//!
//! Feeds arbitrary byte chunks of an NDJSON relay body and reports, after
//! every chunk, what the client should show: the answer text without the
//! suggestion block, the suggestions once the reply has finished, the
//! deduplicated sources, and any in-stream error. The reported state depends
//! only on the bytes received so far, never on how they were chunked.

use aarini_types::llm::Citation;
use aarini_types::relay::{RelayFailure, RelayRecord};

use super::framing::LineFramer;
use super::sources::SourceSet;
use super::suggestions::{parse_block, split_reply, trailing_sentinel_prefix};

/// Snapshot of a partially or fully decoded reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedState {
    pub display_text: String,
    /// `Some` only once the reply finished cleanly with a well-formed block.
    pub suggestions: Option<Vec<String>>,
    pub sources: Vec<Citation>,
    pub error: Option<RelayFailure>,
}

#[derive(Debug, Default)]
pub struct StreamDecoder {
    framer: LineFramer,
    raw_text: String,
    sources: SourceSet,
    error: Option<RelayFailure>,
    finished: bool,
    skipped_lines: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a complete body in one go.
    pub fn decode(body: &[u8]) -> DecodedState {
        let mut decoder = Self::new();
        decoder.feed(body);
        decoder.finish()
    }

    /// Consume the next chunk of the body.
    pub fn feed(&mut self, bytes: &[u8]) -> DecodedState {
        for line in self.framer.push(bytes) {
            self.apply_line(&line);
        }
        self.state()
    }

    /// Mark the body as complete. Suggestions become available here.
    pub fn finish(&mut self) -> DecodedState {
        if let Some(line) = self.framer.finish() {
            self.apply_line(&line);
        }
        self.finished = true;
        self.state()
    }

    /// Apply one already-parsed record.
    pub fn apply_record(&mut self, record: RelayRecord) {
        if self.error.is_some() {
            tracing::debug!("Ignoring relay record after error record");
            return;
        }
        if let Some(text) = record.text {
            self.raw_text.push_str(&text);
        }
        if let Some(grounding) = record.grounding {
            self.sources.merge(grounding);
        }
        if let Some(error) = record.error {
            self.error = Some(error);
        }
    }

    /// Concatenated `text` of every record so far, sentinel included.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Lines that were not valid relay records.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn state(&self) -> DecodedState {
        let split = split_reply(&self.raw_text);
        let (body, suggestions) = match split.block {
            Some(block) => {
                let suggestions = if self.finished && self.error.is_none() {
                    match parse_block(block) {
                        Ok(parsed) => Some(parsed),
                        Err(err) => {
                            tracing::debug!(error = %err, "Discarding malformed suggestion block");
                            None
                        }
                    }
                } else {
                    None
                };
                (split.body, suggestions)
            }
            None if self.finished => (split.body, None),
            None => {
                let held = trailing_sentinel_prefix(split.body);
                (&split.body[..split.body.len() - held], None)
            }
        };

        DecodedState {
            display_text: body.trim().to_string(),
            suggestions,
            sources: self.sources.as_slice().to_vec(),
            error: self.error.clone(),
        }
    }

    fn apply_line(&mut self, line: &str) {
        match serde_json::from_str::<RelayRecord>(line) {
            Ok(record) => self.apply_record(record),
            Err(err) => {
                self.skipped_lines += 1;
                tracing::warn!(error = %err, "Skipping unparsable relay line");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aarini_types::relay::FailureCode;

    const BODY: &str = concat!(
        "{\"text\":\"Bandra has \"}\n",
        "{\"text\":\"3 listings.\\n---SUGGES\"}\n",
        "{\"grounding\":[{\"url\":\"https://x.example\",\"title\":\"X\"}]}\n",
        "{\"text\":\"TIONS---\\nShow 2BHK?\\nPrice range?\\n\"}\n",
    );

    #[test]
    fn test_full_reply() {
        let state = StreamDecoder::decode(BODY.as_bytes());
        assert_eq!(state.display_text, "Bandra has 3 listings.");
        assert_eq!(
            state.suggestions,
            Some(vec!["Show 2BHK?".to_string(), "Price range?".to_string()])
        );
        assert_eq!(state.sources.len(), 1);
        assert_eq!(state.sources[0].url, "https://x.example");
        assert!(state.error.is_none());
    }

    #[test]
    fn test_chunking_does_not_change_result() {
        let whole = StreamDecoder::decode(BODY.as_bytes());
        for size in [1, 2, 3, 7, 16, 64] {
            let mut decoder = StreamDecoder::new();
            for chunk in BODY.as_bytes().chunks(size) {
                decoder.feed(chunk);
            }
            assert_eq!(decoder.finish(), whole, "chunk size {size}");
        }
    }

    #[test]
    fn test_every_two_way_split_matches_whole_body() {
        let body = concat!(
            "{\"text\":\"Rent is ₹45,000.\\n---SUGG\"}\n",
            "{\"grounding\":[{\"url\":\"https://a.com\",\"title\":\"A\"}]}\n",
            "{\"text\":\"ESTIONS---\\nCompare with Thane\\n\"}\n",
        )
        .as_bytes();
        let whole = StreamDecoder::decode(body);
        assert_eq!(whole.display_text, "Rent is ₹45,000.");
        for i in 0..=body.len() {
            let mut decoder = StreamDecoder::new();
            decoder.feed(&body[..i]);
            decoder.feed(&body[i..]);
            assert_eq!(decoder.finish(), whole, "split at byte {i}");
        }
    }

    #[test]
    fn test_decoding_twice_gives_same_state() {
        assert_eq!(
            StreamDecoder::decode(BODY.as_bytes()),
            StreamDecoder::decode(BODY.as_bytes())
        );
    }

    #[test]
    fn test_suggestions_split_into_own_lines() {
        let body = b"{\"text\":\"Bandra has 3 listings.\\n---SUGGESTIONS---\\nShow 2BHKs\\nWhat about Thane?\\n\"}\n";
        let state = StreamDecoder::decode(body);
        assert_eq!(state.display_text, "Bandra has 3 listings.");
        assert_eq!(
            state.suggestions,
            Some(vec!["Show 2BHKs".to_string(), "What about Thane?".to_string()])
        );
    }

    #[test]
    fn test_partial_sentinel_never_shown() {
        let mut decoder = StreamDecoder::new();
        for chunk in BODY.as_bytes().chunks(5) {
            let state = decoder.feed(chunk);
            assert!(!state.display_text.contains('-'), "{:?}", state.display_text);
            assert!(state.suggestions.is_none());
        }
    }

    #[test]
    fn test_display_text_grows_while_streaming() {
        let mut decoder = StreamDecoder::new();
        let first = decoder.feed(b"{\"text\":\"Hel\"}\n");
        assert_eq!(first.display_text, "Hel");
        let second = decoder.feed(b"{\"text\":\"lo\"}\n");
        assert_eq!(second.display_text, "Hello");
    }

    #[test]
    fn test_no_sentinel_keeps_whole_text() {
        let state = StreamDecoder::decode(b"{\"text\":\"Just text -\"}\n");
        assert_eq!(state.display_text, "Just text -");
        assert!(state.suggestions.is_none());
    }

    #[test]
    fn test_empty_block_gives_no_suggestions() {
        let state = StreamDecoder::decode(b"{\"text\":\"Answer\\n---SUGGESTIONS---\\n  \\n\"}\n");
        assert_eq!(state.display_text, "Answer");
        assert!(state.suggestions.is_none());
    }

    #[test]
    fn test_unparsable_line_is_skipped() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(b"{\"text\":\"a\"}\nnot json\n{\"text\":\"b\"}\n");
        let state = decoder.finish();
        assert_eq!(state.display_text, "ab");
        assert_eq!(decoder.skipped_lines(), 1);
    }

    #[test]
    fn test_unterminated_final_line_is_decoded() {
        let state = StreamDecoder::decode(b"{\"text\":\"a\"}\n{\"text\":\"b\"}");
        assert_eq!(state.display_text, "ab");
    }

    #[test]
    fn test_error_record_is_surfaced_and_final() {
        let body = concat!(
            "{\"text\":\"Partial\\n---SUGGESTIONS---\\nQ?\"}\n",
            "{\"error\":{\"code\":\"interrupted\",\"message\":\"The reply was interrupted.\"}}\n",
            "{\"text\":\"ignored\"}\n",
        );
        let state = StreamDecoder::decode(body.as_bytes());
        assert_eq!(state.display_text, "Partial");
        assert!(state.suggestions.is_none());
        assert_eq!(state.error.map(|e| e.code), Some(FailureCode::Interrupted));
    }

    #[test]
    fn test_duplicate_sources_collapsed() {
        let body = concat!(
            "{\"grounding\":[{\"url\":\"https://a\",\"title\":\"A\"}]}\n",
            "{\"grounding\":[{\"url\":\"https://a\",\"title\":\"A again\"},{\"url\":\"https://b\",\"title\":\"B\"}]}\n",
        );
        let state = StreamDecoder::decode(body.as_bytes());
        assert_eq!(state.sources.len(), 2);
        assert_eq!(state.sources[0].title, "A");
    }

    #[test]
    fn test_later_title_for_same_url_ignored() {
        let body = concat!(
            "{\"grounding\":[{\"url\":\"https://a.com\",\"title\":\"A\"}]}\n",
            "{\"grounding\":[{\"url\":\"https://a.com\",\"title\":\"A2\"}]}\n",
        );
        let state = StreamDecoder::decode(body.as_bytes());
        assert_eq!(
            state.sources,
            vec![Citation { url: "https://a.com".into(), title: "A".into() }]
        );
    }

    #[test]
    fn test_raw_text_keeps_sentinel() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(BODY.as_bytes());
        assert!(decoder.raw_text().contains("---SUGGESTIONS---"));
    }
}
