//! Slash command parsing for the chat loop.
//!
//! Commands start with `/`. A bare number picks one of the suggestions shown
//! under the last reply.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Start a new conversation.
    Reset,
    /// Show the conversation so far.
    History,
    /// Exit the chat session.
    Exit,
    /// Pick a suggestion by its 1-based number.
    Pick(usize),
    /// Unknown or malformed command.
    Unknown(String),
}

/// Parse user input as a command.
///
/// Returns `None` for ordinary chat text.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if let Ok(n) = trimmed.parse::<usize>() {
        return Some(ChatCommand::Pick(n));
    }
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/reset" | "/new" => Some(ChatCommand::Reset),
        "/history" => Some(ChatCommand::History),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/pick" => match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(n) => Some(ChatCommand::Pick(n)),
            None => Some(ChatCommand::Unknown("/pick requires a number".to_string())),
        },
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}     {}", style("/help").cyan(), "Show this help message");
    println!("  {}    {}", style("/reset").cyan(), "Start a new conversation");
    println!("  {}  {}", style("/history").cyan(), "Show the conversation so far");
    println!("  {}     {}", style("/quit").cyan(), "End the chat session");
    println!("  {}         {}", style("N").cyan(), "Send suggestion number N");
    println!();
    println!(
        "  {}",
        style("Ctrl+C cancels a reply in progress, Ctrl+D exits").dim()
    );
    println!();
}
