//! Main chat loop orchestration.
//!
//! Reads lines from stdin, sends each message through the relay, and feeds
//! the response body chunk by chunk into the conversation's lifecycle
//! controller. Ctrl+C while a reply streams cancels that reply only.

use std::io::Write;

use console::style;
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use aarini_core::chat::{Conversation, PendingReply};
use aarini_infra::relay_client::RelayClient;
use aarini_types::chat::FailureReason;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::renderer::{StreamPrinter, print_suggestions, print_turn};

const GREETING: &str = "Hello! I'm Aarini, your assistant.\nAsk me anything, or pick one of these to get started.";

fn starter_suggestions() -> Vec<String> {
    vec![
        "What can you help me with?".to_string(),
        "Summarise today's top news".to_string(),
        "Explain something with sources".to_string(),
    ]
}

/// Run the interactive chat loop against the relay behind `client`.
pub async fn run_chat_loop(client: RelayClient, greeting: bool) -> anyhow::Result<()> {
    let mut conversation = Conversation::new();
    print_welcome_banner(client.base_url(), &conversation.session_id().to_string());

    if greeting {
        greet(&mut conversation);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("you>").green().bold());
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        let message = match commands::parse(&line) {
            Some(ChatCommand::Help) => {
                commands::print_help();
                continue;
            }
            Some(ChatCommand::Exit) => break,
            Some(ChatCommand::Reset) => {
                let previous = conversation.session_id();
                conversation.reset();
                if let Err(e) = client.reset_session(previous).await {
                    tracing::debug!(error = %e, "Relay session reset not acknowledged");
                }
                println!("\n  {}\n", style("Started a new conversation.").dim());
                if greeting {
                    greet(&mut conversation);
                }
                continue;
            }
            Some(ChatCommand::History) => {
                println!();
                for turn in conversation.turns() {
                    print_turn(turn);
                }
                println!();
                continue;
            }
            Some(ChatCommand::Pick(n)) => {
                match pick_suggestion(&conversation, n) {
                    Some(suggestion) => {
                        println!("  {} {}", style("->").dim(), style(&suggestion).cyan());
                        suggestion
                    }
                    // A number with nothing to pick is just a message.
                    None => line.trim().to_string(),
                }
            }
            Some(ChatCommand::Unknown(cmd)) => {
                println!(
                    "  {} Unknown command: {}. Type /help for commands.",
                    style("?").yellow(),
                    cmd
                );
                continue;
            }
            None => line,
        };

        if message.trim().is_empty() {
            continue;
        }
        let pending = conversation.submit(&message)?;
        println!();
        stream_reply(&client, &mut conversation, pending).await;
    }

    println!("  {}", style("Goodbye.").dim());
    Ok(())
}

fn greet(conversation: &mut Conversation) {
    let id = conversation.greet(GREETING, starter_suggestions());
    if let Some(turn) = conversation.turn(id) {
        print_turn(turn);
        if let Some(suggestions) = turn.visible_suggestions() {
            print_suggestions(suggestions);
        }
        println!();
    }
}

fn pick_suggestion(conversation: &Conversation, n: usize) -> Option<String> {
    let suggestions = conversation.visible_suggestions()?;
    n.checked_sub(1)
        .and_then(|i| suggestions.get(i))
        .cloned()
}

/// Fetch and print one reply, settling its turn.
async fn stream_reply(client: &RelayClient, conversation: &mut Conversation, pending: PendingReply) {
    let PendingReply {
        turn_id,
        request,
        cancel,
    } = pending;
    let mut printer = StreamPrinter::new();
    printer.show_indicator();

    let opened = tokio::select! {
        opened = client.open(&request) => Some(opened),
        _ = tokio::signal::ctrl_c() => None,
        _ = cancel.cancelled() => None,
    };

    match opened {
        None => {
            conversation.cancel_active();
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Relay request failed");
            if let Err(e) = conversation.fail(turn_id, FailureReason::Relay) {
                tracing::warn!(error = %e, "Dropping reply update");
            }
        }
        Some(Ok(mut body)) => loop {
            let chunk = tokio::select! {
                chunk = body.next() => chunk,
                _ = tokio::signal::ctrl_c() => {
                    conversation.cancel_active();
                    break;
                }
                _ = cancel.cancelled() => break,
            };

            let outcome = match chunk {
                Some(Ok(bytes)) => conversation.apply_chunk(turn_id, &bytes),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Relay stream broke");
                    conversation.fail(turn_id, FailureReason::Relay)
                }
                None => conversation.complete(turn_id),
            };
            if let Err(e) = outcome {
                tracing::warn!(error = %e, "Dropping reply update");
                break;
            }

            let Some(turn) = conversation.turn(turn_id) else {
                break;
            };
            if turn.state.is_terminal() {
                break;
            }
            printer.update(&turn.display_text);
        },
    }

    match conversation.turn(turn_id) {
        Some(turn) if turn.failure == Some(FailureReason::Cancelled) => {
            println!();
            println!("  {}\n", style("(reply cancelled)").dim());
        }
        Some(turn) => printer.finish(turn),
        None => {}
    }
}
