//! Multipart payload assembly
//!
//! The remote API takes the pipeline file under the `pipeline` field and
//! each script under the reference it was declared with. This module only
//! gathers the parts; turning them into an HTTP body is the client's job.

use std::path::{Path, PathBuf};

use crate::dependency::DependencyMap;
use crate::error::{CoreError, Result};

/// Form field carrying the pipeline file
pub const PIPELINE_FIELD: &str = "pipeline";

/// One file field of the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Ordered file parts of a create/update request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub parts: Vec<Part>,
}

impl Payload {
    /// Read the pipeline file and every dependency into a payload
    ///
    /// The pipeline part comes first, dependencies follow in table order.
    pub fn build(pipeline_file: &Path, dependencies: &DependencyMap) -> Result<Self> {
        let mut parts = Vec::with_capacity(dependencies.len() + 1);
        parts.push(read_part(PIPELINE_FIELD, pipeline_file)?);

        for dependency in dependencies.iter() {
            parts.push(read_part(&dependency.reference, &dependency.path)?);
        }

        Ok(Self { parts })
    }

    /// Field names in order
    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }
}

fn read_part(name: &str, path: &Path) -> Result<Part> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::FileNotFound {
            path: PathBuf::from(path),
        },
        _ => CoreError::io(path, e),
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    Ok(Part {
        name: name.to_string(),
        file_name,
        bytes,
    })
}
