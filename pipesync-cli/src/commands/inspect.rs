//! Inspect command handler
//!
//! Read-only view of what `deploy` would do with the current inputs.

use anyhow::{Context, Result};
use colored::*;
use pipesync_core::{PipelineDocument, validate};

use crate::config::Config;
use crate::reconcile::resolve_dependencies;

/// Print the identifier, dependency table and routes of the pipeline
pub fn handle_inspect(config: &Config) -> Result<()> {
    let file = config.file.as_path();
    validate::validate_pipeline_file(file).context("Pipeline file failed validation")?;
    let document = PipelineDocument::load(file)
        .with_context(|| format!("Failed to load pipeline file {}", file.display()))?;
    let dependencies = resolve_dependencies(&document, file, &config.overrides)?;
    let routes = document
        .route_paths()
        .with_context(|| format!("Failed to read routes of {}", file.display()))?;

    println!("{}", "Pipeline:".bold());
    println!("  ID:        {}", config.pipeline_id.to_string().cyan());
    if let Some(local_id) = document.id().filter(|id| *id != config.pipeline_id.as_str()) {
        println!("  Local ID:  {} {}", local_id.dimmed(), "(will be replaced)".yellow());
    }
    println!("  File:      {}", file.display());

    println!("\n{}", "Dependencies:".bold());
    if dependencies.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for dependency in dependencies.iter() {
        let marker = if dependency.path.is_file() {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {} -> {}",
            marker,
            dependency.reference.cyan(),
            dependency.path.display()
        );
    }

    println!("\n{}", "Routes:".bold());
    if routes.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for route in &routes {
        println!("  {} {}", "▸".cyan(), route);
    }

    validate::validate(file, &dependencies).context("Pipeline files failed validation")?;
    println!("\n{}", "✓ Files are valid".green().bold());

    Ok(())
}
