//! Configuration module
//!
//! Invocation inputs arrive either as flags or, inside an automation step,
//! as `INPUT_*` environment variables. Unset inputs are commonly exported
//! as empty strings, so empty counts as absent throughout.

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use pipesync_core::{DependencyMap, PipelineId};
use std::path::PathBuf;
use std::time::Duration;

/// Raw invocation inputs
#[derive(Args, Debug, Clone, Default)]
pub struct Inputs {
    /// Base URL of the remote instance
    #[arg(long, global = true, env = "INPUT_URL")]
    pub url: Option<String>,

    /// Pipeline identifier (defaults to the repository slug)
    #[arg(long, global = true, env = "INPUT_PIPELINE_ID")]
    pub pipeline_id: Option<String>,

    /// Repository slug used when no pipeline identifier is given
    #[arg(long, global = true, env = "GITHUB_REPOSITORY", hide = true)]
    pub repository: Option<String>,

    /// Path to the pipeline YAML file
    #[arg(long, global = true, env = "INPUT_FILE")]
    pub file: Option<PathBuf>,

    /// JSON object of explicit script reference -> path overrides
    #[arg(long, global = true, env = "INPUT_DEPENDS")]
    pub depends: Option<String>,

    /// Per-request timeout in seconds (default 30)
    #[arg(long, global = true, env = "INPUT_TIMEOUT")]
    pub timeout: Option<String>,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the remote instance; only needed when deploying
    pub url: Option<String>,
    /// Normalized pipeline identifier
    pub pipeline_id: PipelineId,
    /// Pipeline file as given
    pub file: PathBuf,
    /// Explicit dependencies; empty means resolve from the document
    pub overrides: DependencyMap,
    /// Timeout applied to each remote call
    pub timeout: Duration,
}

impl Config {
    /// Default per-request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Build configuration from raw inputs
    ///
    /// # Errors
    /// Fails when the pipeline file or identifier is missing, when `depends`
    /// is not a JSON object of strings, or when `timeout` is not a number.
    pub fn from_inputs(inputs: Inputs) -> Result<Self> {
        let raw_id = non_empty(inputs.pipeline_id)
            .or_else(|| non_empty(inputs.repository))
            .ok_or_else(|| missing_input("pipeline_id", "INPUT_PIPELINE_ID"))?;
        let pipeline_id = PipelineId::parse(&raw_id)?;

        let file = inputs
            .file
            .filter(|f| !f.as_os_str().is_empty())
            .ok_or_else(|| missing_input("file", "INPUT_FILE"))?;

        let overrides = match non_empty(inputs.depends) {
            Some(depends) => parse_overrides(&depends)?,
            None => DependencyMap::new(),
        };

        let timeout_secs = match non_empty(inputs.timeout) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("timeout must be a number of seconds, got `{}`", raw))?,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            url: non_empty(inputs.url),
            pipeline_id,
            file,
            overrides,
            timeout: Duration::from_secs(timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// The remote URL, required for anything that talks to the instance
    pub fn require_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| missing_input("url", "INPUT_URL"))
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("url must start with http:// or https://, got `{}`", url);
            }
        }

        if self.timeout.is_zero() {
            bail!("timeout must be greater than 0");
        }

        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing_input(name: &str, env: &str) -> anyhow::Error {
    anyhow!(
        "Missing required input `{}` (pass --{} or set {})",
        name,
        name.replace('_', "-"),
        env
    )
}

/// Parse `depends`: a JSON object mapping script reference to file path
fn parse_overrides(depends: &str) -> Result<DependencyMap> {
    let overrides: serde_json::Map<String, serde_json::Value> = serde_json::from_str(depends)
        .context("`depends` must be a JSON object mapping script references to paths")?;

    overrides
        .into_iter()
        .map(|(reference, path)| match path {
            serde_json::Value::String(path) => Ok((reference, path)),
            other => bail!(
                "`depends` entry `{}` must map to a path string, got {}",
                reference,
                other
            ),
        })
        .collect()
}
