//! Named computation contexts
//!
//! An advanced algorithm runs inside a uniquely named projection that must be dropped on
//! every exit path. `ComputationScope` releases it explicitly on the normal paths; if the
//! owning future is cancelled first, `Drop` spawns the release on the current runtime.

use super::{EngineError, EngineResult, GraphEngine, Phase};
use crate::backend::{BackendError, BackendResult, GraphBackend, Record};
use crate::pattern::{NodePattern, Params, RelPattern};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Guard owning one named computation
pub struct ComputationScope {
    backend: Arc<dyn GraphBackend>,
    name: String,
    released: bool,
}

impl ComputationScope {
    /// Create the projection under a guard that is armed before the create call, so a
    /// caller cancelled mid-create still drops whatever the backend registered.
    pub async fn open(
        backend: Arc<dyn GraphBackend>,
        name: String,
        nodes: &NodePattern,
        relationships: &RelPattern,
    ) -> EngineResult<Self> {
        let mut scope = ComputationScope {
            backend,
            name,
            released: false,
        };

        let created = scope
            .backend
            .create_named_computation(&scope.name, nodes, relationships)
            .await;
        if let Err(e) = created {
            // Nothing was created
            scope.released = true;
            return Err(EngineError::backend(Phase::Projection, e));
        }
        debug!("created computation {}", scope.name);
        Ok(scope)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drop the projection and disarm the guard
    pub async fn release(mut self) -> BackendResult<()> {
        let result = self.backend.drop_named_computation(&self.name).await;
        self.released = true;
        if result.is_ok() {
            debug!("dropped computation {}", self.name);
        }
        result
    }
}

impl Drop for ComputationScope {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let name = std::mem::take(&mut self.name);
        match Handle::try_current() {
            Ok(handle) => {
                debug!("computation {} abandoned, dropping in background", name);
                let backend = self.backend.clone();
                handle.spawn(async move {
                    match backend.drop_named_computation(&name).await {
                        Ok(()) => debug!("dropped abandoned computation {}", name),
                        // Cancelled before the backend registered it
                        Err(BackendError::UnknownComputation(_)) => {
                            debug!("abandoned computation {} was never created", name)
                        }
                        Err(e) => warn!("background drop of computation {} failed: {}", name, e),
                    }
                });
            }
            Err(_) => warn!("computation {} abandoned outside a runtime and not dropped", name),
        }
    }
}

/// Unique computation name: `{prefix}_{kind}_{uuid}`
pub fn computation_name(prefix: &str, kind: &str) -> String {
    format!("{}_{}_{}", prefix, kind, Uuid::new_v4().simple())
}

impl GraphEngine {
    /// Run `algorithm` inside a fresh named computation and always drop it afterwards.
    ///
    /// An algorithm failure wins over a cleanup failure (which is only logged); a cleanup
    /// failure after a successful run fails the call with phase `cleanup`.
    pub(crate) async fn run_in_computation(
        &self,
        kind: &str,
        nodes: &NodePattern,
        relationships: &RelPattern,
        algorithm: &str,
        params: &Params,
    ) -> EngineResult<(String, Vec<Record>)> {
        let name = computation_name(&self.config.computation_prefix, kind);
        let scope = ComputationScope::open(self.backend.clone(), name, nodes, relationships).await?;

        let outcome = self.backend.run_named_algorithm(algorithm, scope.name(), params).await;
        let name = scope.name().to_string();
        let cleanup = scope.release().await;

        match (outcome, cleanup) {
            (Ok(records), Ok(())) => Ok((name, records)),
            (Ok(_), Err(e)) => Err(EngineError::backend(Phase::Cleanup, e)),
            (Err(e), Ok(())) => Err(EngineError::backend(Phase::Algorithm, e)),
            (Err(e), Err(cleanup_err)) => {
                warn!("dropping computation {} after failed {} also failed: {}", name, algorithm, cleanup_err);
                Err(EngineError::backend(Phase::Algorithm, e))
            }
        }
    }
}
