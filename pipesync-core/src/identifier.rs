//! Pipeline identifier normalization
//!
//! The remote API addresses a pipeline as `<url>/_pipeline/<id>`, so the
//! identifier must be usable as a single path segment.

use crate::error::{CoreError, Result};

/// Normalize a raw identifier into a URL path segment.
///
/// Every `/` becomes `-` and every whitespace character becomes `_`.
/// Nothing else is touched.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' => '-',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// A normalized pipeline identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineId(String);

impl PipelineId {
    /// Normalize `raw` into an identifier
    ///
    /// # Errors
    /// Returns `InvalidIdentifier` if `raw` is empty or only whitespace,
    /// which would otherwise collapse to a run of underscores.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(normalize(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PipelineId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
