//! CLI command definitions for the `aarini` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod probe;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Streaming chat relay for Gemini, with a terminal client.
#[derive(Parser)]
#[command(name = "aarini", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Path to config.toml.
    #[arg(long, global = true, env = "AARINI_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat relay server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000", env = "AARINI_PORT")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1", env = "AARINI_HOST")]
        host: String,
    },

    /// Chat with a running relay from the terminal.
    Chat {
        /// Relay base URL.
        #[arg(long, default_value = "http://127.0.0.1:3000", env = "AARINI_URL")]
        url: String,

        /// Reconnect attempts for a request that failed before any reply arrived.
        #[arg(long, default_value = "2")]
        retries: u32,

        /// Skip the greeting message.
        #[arg(long)]
        no_greeting: bool,
    },

    /// Check that every configured model answers.
    Probe,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
