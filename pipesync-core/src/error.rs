//! Error types for local pipeline handling

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while preparing a pipeline for deployment
#[derive(Debug, Error)]
pub enum CoreError {
    /// The pipeline identifier is empty once trimmed
    #[error("Invalid pipeline identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Pipeline file or one of its dependencies does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// Wrong file extension or a document that is not a YAML mapping
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A placeholder names an input that is not set
    #[error("Environment value `{name}` is not set (expected `{key}`)")]
    MissingEnvironmentValue {
        /// Name as written inside the placeholder
        name: String,
        /// Key looked up in the environment namespace
        key: String,
    },

    /// Reading or writing a file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML (de)serialization failed
    #[error("Failed to process YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}
