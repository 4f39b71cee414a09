//! Pipesync CLI
//!
//! Registers a local pipeline definition with a remote instance: creates it
//! when the remote doesn't know the identifier yet, updates it otherwise.

mod commands;
mod config;
mod reconcile;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, Inputs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pipesync")]
#[command(about = "Create or update a remote pipeline from a local YAML definition", long_about = None)]
struct Cli {
    #[command(flatten)]
    inputs: Inputs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pipesync_cli=info,pipesync_core=info,pipesync_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_inputs(cli.inputs)?;

    handle_command(cli.command, &config).await
}
