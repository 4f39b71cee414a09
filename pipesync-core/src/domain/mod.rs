//! Core domain types
//!
//! The pipeline document as it lives on disk. Only the fields this tool
//! reads or rewrites are typed; everything else is carried through as YAML.

pub mod pipeline;
