//! Capability detection
//!
//! Each capability is probed with one `introspect_procedures` call the first time it is
//! needed and cached for the life of the detector. Concurrent first callers share one probe.
//! A failing probe counts as "not installed".

use crate::backend::{procedures, GraphBackend};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub struct CapabilityDetector {
    backend: Arc<dyn GraphBackend>,
    analytics_prefix: String,
    path_prefix: String,
    analytics: OnceCell<bool>,
    subgraph: OnceCell<bool>,
}

impl CapabilityDetector {
    pub fn new(backend: Arc<dyn GraphBackend>, analytics_prefix: String, path_prefix: String) -> Self {
        CapabilityDetector {
            backend,
            analytics_prefix,
            path_prefix,
            analytics: OnceCell::new(),
            subgraph: OnceCell::new(),
        }
    }

    /// Any procedure under the analytics prefix is installed
    pub async fn supports_advanced_centrality(&self) -> bool {
        *self
            .analytics
            .get_or_init(|| async {
                let found = self.probe(&self.analytics_prefix, "advanced analytics").await;
                !found.is_empty()
            })
            .await
    }

    /// The single-call subgraph procedure is installed
    pub async fn supports_subgraph_procedure(&self) -> bool {
        *self
            .subgraph
            .get_or_init(|| async {
                let found = self.probe(&self.path_prefix, "subgraph procedure").await;
                found.iter().any(|name| name == procedures::SUBGRAPH_ALL)
            })
            .await
    }

    async fn probe(&self, prefix: &str, capability: &str) -> Vec<String> {
        match self.backend.introspect_procedures(prefix).await {
            Ok(found) => {
                info!("{} probe: {} procedures under {:?}", capability, found.len(), prefix);
                found
            }
            Err(e) => {
                warn!("{} probe failed, treating as unavailable: {}", capability, e);
                Vec::new()
            }
        }
    }

    /// Cached analytics answer, if probed already
    pub fn cached_advanced_centrality(&self) -> Option<bool> {
        self.analytics.get().copied()
    }
}
