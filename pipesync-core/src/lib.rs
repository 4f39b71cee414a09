//! Pipesync Core
//!
//! Local side of a pipeline deployment: everything that happens on disk
//! before the definition is pushed to the remote `_pipeline` endpoint.
//!
//! This crate contains:
//! - Domain types: the pipeline document and its stages/routes
//! - Identifier normalization
//! - Environment placeholder resolution
//! - Dependency resolution, file validation and payload assembly

pub mod dependency;
pub mod domain;
pub mod env;
pub mod error;
pub mod identifier;
pub mod payload;
pub mod validate;

pub use dependency::DependencyMap;
pub use domain::pipeline::PipelineDocument;
pub use env::{InputEnv, VarProvider};
pub use error::{CoreError, Result};
pub use identifier::PipelineId;
pub use payload::Payload;
