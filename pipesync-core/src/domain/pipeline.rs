//! Pipeline domain types

use serde::{Deserialize, Serialize};
use serde_yml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

use crate::env::{self, VarProvider};
use crate::error::{CoreError, Result};
use crate::identifier::PipelineId;

const ID_KEY: &str = "id";
const STAGES_KEY: &str = "stages";
const ROUTES_KEY: &str = "routes";
const ENVS_KEY: &str = "envs";

/// One step of a pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default, rename = "scriptRef")]
    pub script_ref: Option<String>,
}

/// An HTTP route the pipeline is mounted on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
}

/// Pipeline definition loaded from a YAML file
///
/// Wraps the raw top-level mapping so fields this tool does not know about
/// survive a load/save round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDocument {
    root: Mapping,
}

impl PipelineDocument {
    /// Parse a document from YAML text
    ///
    /// `origin` is only used in error messages.
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self> {
        let value: Value =
            serde_yml::from_str(content).map_err(|e| CoreError::yaml(origin, e))?;

        match value {
            Value::Mapping(root) => Ok(Self { root }),
            // an empty file parses as null
            Value::Null => Ok(Self {
                root: Mapping::new(),
            }),
            _ => Err(CoreError::InvalidFormat(format!(
                "{} must contain a YAML mapping at the top level",
                origin.display()
            ))),
        }
    }

    /// Read and parse the document at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => CoreError::io(path, e),
        })?;
        Self::from_yaml(&content, path)
    }

    /// Serialize the document back to YAML text
    pub fn to_yaml(&self, origin: &Path) -> Result<String> {
        serde_yml::to_string(&self.root).map_err(|e| CoreError::yaml(origin, e))
    }

    /// Write the document to `path`, replacing its contents
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_yaml(path)?;
        std::fs::write(path, content).map_err(|e| CoreError::io(path, e))
    }

    /// Current top-level `id`, if it is a string
    pub fn id(&self) -> Option<&str> {
        self.root.get(ID_KEY).and_then(Value::as_str)
    }

    /// Overwrite the top-level `id`
    ///
    /// The local value is never authoritative; the deployed identifier always wins.
    pub fn inject_identifier(&mut self, id: &PipelineId) {
        self.root.insert(Value::from(ID_KEY), Value::from(id.as_str()));
    }

    /// Typed view of `stages`; empty when the section is absent
    pub fn stages(&self) -> Result<Vec<Stage>> {
        self.typed_list(STAGES_KEY)
    }

    /// Typed view of `routes`; empty when the section is absent
    pub fn routes(&self) -> Result<Vec<Route>> {
        self.typed_list(ROUTES_KEY)
    }

    /// Paths of every declared route, in document order
    pub fn route_paths(&self) -> Result<Vec<String>> {
        Ok(self.routes()?.into_iter().map(|r| r.path).collect())
    }

    /// Substitute placeholders in the top-level `envs` section
    ///
    /// Both the mapping form and the `{key, value}` list form are accepted.
    /// A document without `envs` is left as is. Returns the number of values
    /// that were replaced.
    pub fn resolve_envs<V: VarProvider + ?Sized>(&mut self, provider: &V) -> Result<usize> {
        let resolved = match self.root.get_mut(ENVS_KEY) {
            None | Some(Value::Null) => 0,
            Some(Value::Mapping(envs)) => env::resolve_env_map(envs, provider)?,
            Some(Value::Sequence(entries)) => env::resolve_env_list(entries, provider)?,
            Some(_) => {
                return Err(CoreError::InvalidFormat(
                    "`envs` must be a mapping or a list of {key, value} records".to_string(),
                ));
            }
        };

        debug!("Resolved {} env placeholder(s)", resolved);
        Ok(resolved)
    }

    /// Raw value of a top-level key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    fn typed_list<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.root.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_yml::from_value(value.clone()).map_err(|e| {
                CoreError::InvalidFormat(format!("`{}` section is malformed: {}", key, e))
            }),
        }
    }
}
