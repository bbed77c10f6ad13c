//! Graph query and traversal engine
//!
//! `GraphEngine` turns caller requests (raw strings, selectors, limits) into typed pattern
//! specs, runs them against a `GraphBackend`, and normalizes the answers into fragments,
//! paths and scores. It is cheap to clone and safe to share across tasks.

pub mod capability;
pub mod catalog;
pub mod centrality;
pub mod computation;
pub mod error;
pub mod mutation;
pub mod selector;
pub mod traversal;

pub use capability::CapabilityDetector;
pub use centrality::{AdvancedCentrality, CentralityKind, CentralityMethod, CentralityReport, CentralityScore, DegreeScore};
pub use error::{EngineError, EngineResult, ErrorKind, Phase};
pub use selector::Selector;
pub use traversal::{NeighborPage, PathEngine, ShortestPaths};

use crate::backend::GraphBackend;
use crate::config::EngineConfig;
use crate::pattern::NodePattern;
use crate::sanitize::Identifier;
use std::sync::Arc;

/// Entry point for catalog, traversal, centrality and mutation operations
#[derive(Clone)]
pub struct GraphEngine {
    backend: Arc<dyn GraphBackend>,
    config: Arc<EngineConfig>,
    capabilities: Arc<CapabilityDetector>,
    /// Sanitized `node_label`, if configured
    scope: Option<Identifier>,
    /// Sanitized `name_property`
    name_key: Identifier,
}

impl GraphEngine {
    /// Build an engine over `backend`, validating `config`
    pub fn new(backend: Arc<dyn GraphBackend>, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let scope = config.node_label.as_deref().map(Identifier::label).transpose()?;
        let name_key = Identifier::property_key(&config.name_property)?;
        let capabilities = Arc::new(CapabilityDetector::new(
            backend.clone(),
            config.analytics_prefix.clone(),
            config.path_procedure_prefix.clone(),
        ));

        Ok(GraphEngine {
            backend,
            config: Arc::new(config),
            capabilities,
            scope,
            name_key,
        })
    }

    /// Engine with default configuration
    pub fn with_defaults(backend: Arc<dyn GraphBackend>) -> EngineResult<Self> {
        Self::new(backend, EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilityDetector {
        &self.capabilities
    }

    pub fn backend(&self) -> &Arc<dyn GraphBackend> {
        &self.backend
    }

    /// Whether the advanced-analytics procedures are installed (probed once)
    pub async fn supports_advanced_centrality(&self) -> bool {
        self.capabilities.supports_advanced_centrality().await
    }

    /// Whether the single-call subgraph procedure is installed (probed once)
    pub async fn supports_subgraph_procedure(&self) -> bool {
        self.capabilities.supports_subgraph_procedure().await
    }

    /// Property used for display names
    pub fn name_key(&self) -> &str {
        self.name_key.as_str()
    }

    /// Nodes in the configured scope
    pub(crate) fn scope_pattern(&self) -> NodePattern {
        NodePattern::scoped(self.scope.as_ref())
    }
}
