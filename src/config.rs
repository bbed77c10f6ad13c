//! Engine configuration
//!
//! Loaded from defaults, then an optional YAML file, then `GRAPHSUITE_*` environment
//! variables.

use crate::sanitize::{sanitize_identifier, IdentifierKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Environment variable {name} has invalid value {value:?}")]
    Env { name: String, value: String },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Label every property selector, search and centrality run is scoped to
    pub node_label: Option<String>,
    /// Property used for display names, search, and bare selectors
    pub name_property: String,
    /// Hop bound for single shortest-path search
    pub shortest_path_max_hops: usize,
    /// Per-level fetch bound where the caller gives none
    pub default_limit: usize,
    /// Procedure prefix probed for advanced analytics
    pub analytics_prefix: String,
    /// Procedure prefix probed for the single-call subgraph procedure
    pub path_procedure_prefix: String,
    /// Prefix of named computation contexts
    pub computation_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_label: None,
            name_property: "name".to_string(),
            shortest_path_max_hops: 15,
            default_limit: 500,
            analytics_prefix: "gds.".to_string(),
            path_procedure_prefix: "apoc.path.".to_string(),
            computation_prefix: "graphsuite".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse from YAML; absent fields keep their defaults
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `GRAPHSUITE_*` overrides from the process environment
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any lookup; `with_env_overrides` uses the process environment
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if let Some(label) = lookup("GRAPHSUITE_NODE_LABEL") {
            self.node_label = if label.trim().is_empty() { None } else { Some(label) };
        }
        if let Some(name) = lookup("GRAPHSUITE_NAME_PROPERTY") {
            self.name_property = name;
        }
        if let Some(raw) = lookup("GRAPHSUITE_SHORTEST_PATH_MAX_HOPS") {
            self.shortest_path_max_hops = parse_number("GRAPHSUITE_SHORTEST_PATH_MAX_HOPS", raw)?;
        }
        if let Some(raw) = lookup("GRAPHSUITE_DEFAULT_LIMIT") {
            self.default_limit = parse_number("GRAPHSUITE_DEFAULT_LIMIT", raw)?;
        }
        if let Some(prefix) = lookup("GRAPHSUITE_ANALYTICS_PREFIX") {
            self.analytics_prefix = prefix;
        }
        if let Some(prefix) = lookup("GRAPHSUITE_PATH_PROCEDURE_PREFIX") {
            self.path_procedure_prefix = prefix;
        }
        if let Some(prefix) = lookup("GRAPHSUITE_COMPUTATION_PREFIX") {
            self.computation_prefix = prefix;
        }
        Ok(self)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(label) = &self.node_label {
            if label.is_empty() || sanitize_identifier(label, IdentifierKind::Label) != *label {
                return Err(ConfigError::Invalid {
                    field: "node_label",
                    reason: format!("{label:?} is not a plain label"),
                });
            }
        }
        if sanitize_identifier(&self.name_property, IdentifierKind::PropertyKey).is_empty() {
            return Err(ConfigError::Invalid {
                field: "name_property",
                reason: format!("{:?} is not a valid property key", self.name_property),
            });
        }
        if self.shortest_path_max_hops == 0 {
            return Err(ConfigError::Invalid {
                field: "shortest_path_max_hops",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.default_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "default_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.computation_prefix.is_empty()
            || sanitize_identifier(&self.computation_prefix, IdentifierKind::Label) != self.computation_prefix
        {
            return Err(ConfigError::Invalid {
                field: "computation_prefix",
                reason: format!("{:?} must be non-empty [A-Za-z0-9_]", self.computation_prefix),
            });
        }
        Ok(())
    }
}

fn parse_number(name: &str, raw: String) -> ConfigResult<usize> {
    raw.trim().parse().map_err(|_| ConfigError::Env {
        name: name.to_string(),
        value: raw,
    })
}
