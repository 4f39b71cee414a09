//! Reconciliation flow
//!
//! Fetch the remote state, decide between create and update, prepare the
//! local files and push them. Every step runs in sequence and the first
//! failure ends the run; the only branch is the create/update decision.

use anyhow::{Context, Result};
use pipesync_client::PipelineApi;
use pipesync_core::payload::Payload;
use pipesync_core::{
    DependencyMap, PipelineDocument, PipelineId, VarProvider, dependency, validate,
};
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// What the run does to the remote pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Not present remotely: POST, expect 201
    Create,
    /// Already present: PUT, expect 200
    Update,
}

impl Plan {
    fn for_remote(existing: Option<&serde_json::Value>) -> Self {
        match existing {
            Some(_) => Plan::Update,
            None => Plan::Create,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plan::Create => write!(f, "created"),
            Plan::Update => write!(f, "updated"),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Outcome {
    pub pipeline_id: PipelineId,
    pub plan: Plan,
    pub dependencies: DependencyMap,
    pub resolved_envs: usize,
}

/// Dependency table for a run: explicit overrides when given, otherwise the
/// `scriptRef`s of the document resolved next to the pipeline file
pub fn resolve_dependencies(
    document: &PipelineDocument,
    file: &Path,
    overrides: &DependencyMap,
) -> Result<DependencyMap> {
    if !overrides.is_empty() {
        info!("Using {} explicit dependency override(s)", overrides.len());
        return Ok(overrides.clone());
    }

    let references = dependency::extract_references(document)
        .with_context(|| format!("Failed to read stages of {}", file.display()))?;
    Ok(dependency::resolve_references(&references, file))
}

/// Run the full reconciliation against `api`
///
/// Placeholders are substituted from `vars`. The pipeline file is rewritten
/// in place before the remote write; it stays rewritten if that write fails.
pub async fn reconcile<A, V>(api: &A, vars: &V, config: &Config) -> Result<Outcome>
where
    A: PipelineApi + ?Sized,
    V: VarProvider + ?Sized,
{
    let id = &config.pipeline_id;
    let file = config.file.as_path();
    info!("Reconciling pipeline {} from {}", id, file.display());

    let existing = api
        .get(id)
        .await
        .with_context(|| format!("Failed to check whether pipeline {} exists", id))?;
    let plan = Plan::for_remote(existing.as_ref());
    info!("Pipeline {} will be {}", id, plan);

    validate::validate_pipeline_file(file).context("Pipeline file failed validation")?;
    let mut document = PipelineDocument::load(file)
        .with_context(|| format!("Failed to load pipeline file {}", file.display()))?;
    let dependencies = resolve_dependencies(&document, file, &config.overrides)?;

    validate::validate(file, &dependencies).context("Pipeline files failed validation")?;
    info!("Validated pipeline file and {} dependency file(s)", dependencies.len());

    document.inject_identifier(id);
    let resolved_envs = document
        .resolve_envs(vars)
        .context("Failed to resolve pipeline envs")?;
    document
        .save(file)
        .with_context(|| format!("Failed to write pipeline file {}", file.display()))?;

    let payload = Payload::build(file, &dependencies).context("Failed to build request payload")?;

    let dispatched = match plan {
        Plan::Create => api.create(payload).await,
        Plan::Update => api.update(payload, id).await,
    };
    dispatched.with_context(|| format!("Pipeline {} could not be {}", id, plan))?;

    info!("Pipeline {} {}", id, plan);
    Ok(Outcome {
        pipeline_id: id.clone(),
        plan,
        dependencies,
        resolved_envs,
    })
}
