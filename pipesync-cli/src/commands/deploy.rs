//! Deploy command handler

use anyhow::{Context, Result};
use colored::*;
use pipesync_client::PipelineClient;
use pipesync_core::InputEnv;

use crate::config::Config;
use crate::reconcile::reconcile;

/// Reconcile the local pipeline with the remote instance
pub async fn handle_deploy(config: &Config) -> Result<()> {
    let url = config.require_url()?;
    let client = PipelineClient::with_timeout(url, config.timeout)
        .context("Failed to build HTTP client")?;

    let outcome = reconcile(&client, &InputEnv, config).await?;

    println!(
        "{}",
        format!("✓ Pipeline {} successfully!", outcome.plan)
            .green()
            .bold()
    );
    println!("  ID:           {}", outcome.pipeline_id.to_string().cyan());
    println!("  Remote:       {}", client.base_url().dimmed());
    println!("  File:         {}", config.file.display());
    println!(
        "  Dependencies: {}",
        outcome.dependencies.len().to_string().dimmed()
    );
    println!(
        "  Envs:         {}",
        format!("{} resolved", outcome.resolved_envs).dimmed()
    );

    Ok(())
}
