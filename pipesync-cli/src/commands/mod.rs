//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod deploy;
mod inspect;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create or update the remote pipeline from the local definition
    Deploy,
    /// Show what a deploy would send, without touching the file or the remote
    Inspect,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Deploy => deploy::handle_deploy(config).await,
        Commands::Inspect => inspect::handle_inspect(config),
    }
}
