//! Pre-flight file checks
//!
//! Run before the pipeline file is touched so a bad invocation fails
//! without side effects.

use std::path::Path;

use crate::dependency::DependencyMap;
use crate::error::{CoreError, Result};

/// Extensions accepted for the pipeline file
pub const PIPELINE_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Check that `path` carries a YAML extension
pub fn check_extension(path: &Path) -> Result<()> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    if PIPELINE_EXTENSIONS
        .iter()
        .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    {
        Ok(())
    } else {
        Err(CoreError::InvalidFormat(format!(
            "pipeline file {} must have a .yaml or .yml extension",
            path.display()
        )))
    }
}

fn check_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CoreError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Check that the pipeline file exists and carries a YAML extension
///
/// Safe to call before the file is parsed, so a `pipeline.json` is reported
/// as a wrong extension rather than as broken YAML.
pub fn validate_pipeline_file(pipeline_file: &Path) -> Result<()> {
    check_exists(pipeline_file)?;
    check_extension(pipeline_file)
}

/// Validate the pipeline file and every resolved dependency
///
/// Stops at the first failure: pipeline existence, then its extension, then
/// each dependency in table order.
pub fn validate(pipeline_file: &Path, dependencies: &DependencyMap) -> Result<()> {
    validate_pipeline_file(pipeline_file)?;

    for dependency in dependencies.iter() {
        check_exists(&dependency.path)?;
    }

    Ok(())
}
