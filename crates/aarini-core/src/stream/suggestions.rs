//! Splitting a reply into its displayable answer and suggestion block.
//!
//! The reply text has the shape
//!
//! ```text
//! answer text ...
//! ---SUGGESTIONS---
//! First follow-up question?
//! Second follow-up question?
//! ```
//!
//! The block runs to a second sentinel or to the end of the reply.

use aarini_types::relay::SUGGESTIONS_SENTINEL;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SuggestionsError {
    #[error("suggestion block contains no suggestions")]
    Empty,
}

/// A reply split at the first sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitReply<'a> {
    /// Everything before the sentinel.
    pub body: &'a str,
    /// Everything after it, up to a closing sentinel if one is present.
    pub block: Option<&'a str>,
}

pub fn split_reply(raw: &str) -> SplitReply<'_> {
    match raw.split_once(SUGGESTIONS_SENTINEL) {
        Some((body, rest)) => {
            let block = rest
                .split_once(SUGGESTIONS_SENTINEL)
                .map_or(rest, |(block, _)| block);
            SplitReply {
                body,
                block: Some(block),
            }
        }
        None => SplitReply {
            body: raw,
            block: None,
        },
    }
}

/// Parse the lines of a suggestion block.
///
/// Lines are trimmed, list markers (`-`, `*`, `1.`, `2)`) are dropped, and
/// blank lines are skipped.
pub fn parse_block(block: &str) -> Result<Vec<String>, SuggestionsError> {
    let suggestions: Vec<String> = block
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if suggestions.is_empty() {
        Err(SuggestionsError::Empty)
    } else {
        Ok(suggestions)
    }
}

/// Length of the longest proper sentinel prefix that `text` ends with.
///
/// While a reply is still streaming, that tail might become the sentinel and
/// must not be shown yet.
pub fn trailing_sentinel_prefix(text: &str) -> usize {
    (1..SUGGESTIONS_SENTINEL.len())
        .rev()
        .find(|&n| text.ends_with(&SUGGESTIONS_SENTINEL[..n]))
        .unwrap_or(0)
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(|c: char| matches!(c, '-' | '*' | '•')) {
        return rest.trim_start();
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(|c: char| c == '.' || c == ')') {
            return rest.trim_start();
        }
    }
    line
}
