//! Terminal rendering of conversation turns.
//!
//! While a reply streams, only the newly decoded part of the display text is
//! printed. The decoder may briefly hold back text that could be the start
//! of the suggestion block, so output can lag the raw stream but never has
//! to be retracted.

use std::io::Write;

use console::{Term, style};

use aarini_types::chat::{Author, ConversationTurn, LifecycleState};
use aarini_types::llm::Citation;

/// Shown between sending a message and the first reply text.
pub const TYPING_INDICATOR: &str = "Aarini is typing...";

/// Incremental printer for one streaming reply.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    printed: String,
    indicator_shown: bool,
}

impl StreamPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Part of `display_text` not printed yet, if it extends what was printed.
    pub fn delta<'a>(&self, display_text: &'a str) -> Option<&'a str> {
        display_text
            .strip_prefix(self.printed.as_str())
            .filter(|rest| !rest.is_empty())
    }

    pub fn show_indicator(&mut self) {
        print!("  {}", style(TYPING_INDICATOR).dim().italic());
        let _ = std::io::stdout().flush();
        self.indicator_shown = true;
    }

    /// Print whatever the latest decoded state adds.
    pub fn update(&mut self, display_text: &str) {
        let Some(delta) = self.delta(display_text) else {
            return;
        };
        self.clear_indicator();
        self.print_delta(delta);
        let _ = std::io::stdout().flush();
    }

    /// Print the end of a settled reply: failure notice, sources, suggestions.
    pub fn finish(&mut self, turn: &ConversationTurn) {
        self.clear_indicator();
        match turn.state {
            LifecycleState::Failed => {
                let (rest, notice) = self.failure_tail(turn);
                if notice.is_none() && self.printed.is_empty() {
                    // Nothing arrived; the display text is the apology itself.
                    println!("  {}", style(&turn.display_text).red());
                } else {
                    if let Some(rest) = rest {
                        self.print_delta(rest);
                    }
                    println!();
                    if let Some(notice) = notice {
                        println!("  {}", style(notice).red());
                    }
                }
            }
            _ => {
                if let Some(rest) = self.delta(&turn.display_text) {
                    self.print_delta(rest);
                }
                println!();
            }
        }
        print_sources(&turn.sources);
        if let Some(suggestions) = turn.visible_suggestions() {
            print_suggestions(suggestions);
        }
        println!();
    }

    /// Reply text still unprinted and the notice owed for a failed turn.
    fn failure_tail<'a>(&self, turn: &'a ConversationTurn) -> (Option<&'a str>, Option<&'a str>) {
        (self.delta(&turn.display_text), turn.notice.as_deref())
    }

    fn print_delta(&mut self, delta: &str) {
        if self.printed.is_empty() {
            print!("  ");
        }
        print!("{}", indent_continuation(delta));
        self.printed.push_str(delta);
    }

    fn clear_indicator(&mut self) {
        if self.indicator_shown {
            let _ = Term::stdout().clear_line();
            self.indicator_shown = false;
        }
    }
}

/// Keep multi-line replies aligned with the two-space margin.
fn indent_continuation(text: &str) -> String {
    text.replace('\n', "\n  ")
}

/// Numbered suggestion lines, as the user picks them.
pub fn suggestion_lines(suggestions: &[String]) -> Vec<String> {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {s}", i + 1))
        .collect()
}

pub fn print_suggestions(suggestions: &[String]) {
    println!();
    for line in suggestion_lines(suggestions) {
        println!("  {}", style(line).cyan());
    }
}

pub fn print_sources(sources: &[Citation]) {
    if sources.is_empty() {
        return;
    }
    println!();
    println!("  {}", style("Sources:").bold());
    for source in sources {
        println!("  {} {}", style(&source.title).dim(), style(&source.url).underlined());
    }
}

/// Print a settled turn in full (greeting, `/history`).
pub fn print_turn(turn: &ConversationTurn) {
    match turn.author {
        Author::User => println!("  {} {}", style("you>").green().bold(), turn.display_text),
        Author::Assistant => {
            let text = indent_continuation(&turn.display_text);
            match turn.state {
                LifecycleState::Failed if turn.notice.is_none() => println!("  {}", style(text).red()),
                _ => println!("  {text}"),
            }
            if let Some(notice) = &turn.notice {
                println!("  {}", style(notice).red());
            }
        }
    }
}
