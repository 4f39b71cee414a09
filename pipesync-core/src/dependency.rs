//! Script dependency resolution
//!
//! Stages point at their scripts with `scriptRef`. References are resolved
//! next to the pipeline file, except absolute ones, which are taken as
//! rooted at the project: `/lib/x.js` becomes `./lib/x.js`.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::pipeline::PipelineDocument;
use crate::error::Result;

/// A script reference and the file it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Reference exactly as written in the document; also the form field name
    pub reference: String,
    pub path: PathBuf,
}

/// Ordered reference → path table
///
/// Insertion order is kept so the payload is built in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: Vec<Dependency>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the path for `reference`, keeping its first position
    pub fn insert(&mut self, reference: impl Into<String>, path: impl Into<PathBuf>) {
        let reference = reference.into();
        let path = path.into();

        match self.entries.iter_mut().find(|d| d.reference == reference) {
            Some(existing) => existing.path = path,
            None => self.entries.push(Dependency { reference, path }),
        }
    }

    pub fn get(&self, reference: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|d| d.reference == reference)
            .map(|d| d.path.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: Into<String>, P: Into<PathBuf>> FromIterator<(R, P)> for DependencyMap {
    /// Build from explicit overrides, keeping the order they were given in
    fn from_iter<I: IntoIterator<Item = (R, P)>>(pairs: I) -> Self {
        let mut map = Self::new();
        for (reference, path) in pairs {
            map.insert(reference, path);
        }
        map
    }
}

/// Distinct `scriptRef` values across all stages, in document order
pub fn extract_references(document: &PipelineDocument) -> Result<Vec<String>> {
    let mut references: Vec<String> = Vec::new();

    for reference in document.stages()?.into_iter().filter_map(|s| s.script_ref) {
        if !references.contains(&reference) {
            references.push(reference);
        }
    }

    Ok(references)
}

/// Resolve one reference against the pipeline file location
pub fn resolve_reference(reference: &str, pipeline_file: &Path) -> PathBuf {
    if reference.starts_with(std::path::MAIN_SEPARATOR) || reference.starts_with('/') {
        return PathBuf::from(format!(".{}", reference));
    }

    pipeline_file
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(reference)
}

/// Resolve every reference into a dependency table
pub fn resolve_references<I, S>(references: I, pipeline_file: &Path) -> DependencyMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = DependencyMap::new();

    for reference in references {
        let reference = reference.as_ref();
        let path = resolve_reference(reference, pipeline_file);
        debug!("Dependency {} -> {}", reference, path.display());
        map.insert(reference, path);
    }

    map
}
