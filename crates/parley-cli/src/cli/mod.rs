//! CLI command definitions and dispatch for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. Auth commands are
//! one-shot; `parley chat` opens the interactive screen.

pub mod auth;
pub mod chat;
pub mod profile;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with your group from the terminal.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
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

    /// Backend base URL (overrides config.toml).
    #[arg(long, global = true, env = "PARLEY_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and log in.
    Register {
        /// Username (prompted if omitted).
        #[arg(long)]
        username: Option<String>,
    },

    /// Log in to an existing account.
    Login {
        /// Username (prompted if omitted).
        #[arg(long)]
        username: Option<String>,
    },

    /// Log out and clear the stored session.
    Logout,

    /// Show the locally stored session (no network).
    Whoami,

    /// Fetch and display your profile.
    Profile,

    /// Open the interactive chat screen.
    Chat,

    /// Client status dashboard.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
