//! Aarini relay server and terminal chat client.
//!
//! Binary name: `aarini`
//!
//! Parses CLI arguments, sets up tracing, then either serves the streaming
//! chat relay or runs one of the client commands against it.

mod cli;
mod http;
mod state;

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use clap_complete::generate;

use aarini_infra::config::{load_relay_config, resolve_config_path};
use aarini_infra::relay_client::RelayClient;
use aarini_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "aarini", &mut std::io::stdout());
        return Ok(());
    }

    let options = TracingOptions::from_verbosity(cli.verbose, cli.quiet)
        .with_json(cli.log_json)
        .with_otel(cli.otel);
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = resolve_config_path(cli.config.as_deref());
    match cli.command {
        Commands::Serve { port, host } => serve(config_path.as_deref(), cli.quiet, &host, port).await,

        Commands::Chat {
            url,
            retries,
            no_greeting,
        } => {
            let client = RelayClient::new(&url)?.with_retries(retries, Duration::from_millis(500));
            cli::chat::loop_runner::run_chat_loop(client, !no_greeting).await
        }

        Commands::Probe => cli::probe::probe(config_path.as_deref(), cli.json).await,

        Commands::Completions { .. } => unreachable!("handled above"),
    }
}

async fn serve(config_path: Option<&Path>, quiet: bool, host: &str, port: u16) -> anyhow::Result<()> {
    let config = load_relay_config(config_path).await;
    let state = AppState::init(config).await?;
    let sweeper = state.spawn_session_sweeper();

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, models = ?state.config.models, "Relay listening");

    if !quiet {
        println!(
            "  {} Aarini relay listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        if state.sessions.is_none() {
            println!(
                "  {}",
                console::style("No GEMINI_API_KEY or API_KEY set: chat requests will fail").yellow()
            );
        }
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
