//! Parley terminal client entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, wires the sync engine to its HTTP and file-store
//! collaborators, then dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,parley_core=debug,parley_infra=debug,parley_cli=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (config, clients, session hydration)
    let state = AppState::init(cli.base_url.clone()).await?;

    match cli.command {
        Commands::Register { username } => {
            cli::auth::register(&state, username, cli.json).await?;
        }

        Commands::Login { username } => {
            cli::auth::login(&state, username, cli.json).await?;
        }

        Commands::Logout => {
            cli::auth::logout(&state, cli.json).await?;
        }

        Commands::Whoami => {
            cli::auth::whoami(&state, cli.json)?;
        }

        Commands::Profile => {
            cli::profile::show_profile(&state, cli.json).await?;
        }

        Commands::Chat => {
            cli::chat::loop_runner::run_chat_loop(&state).await?;
        }

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
