//! Shared fixtures: small graphs and instrumented backends wrapping `MemoryBackend`

#![allow(dead_code)]

use async_trait::async_trait;
use graphsuite::backend::{BackendError, BackendResult, GraphBackend, MemoryBackend, Record};
use graphsuite::dataset::load_three_kingdoms;
use graphsuite::pattern::{MatchSpec, MergeSpec, NodePattern, Params, RelPattern};
use graphsuite::{EngineConfig, GraphEngine, NodeId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// `A -X-> B -Y-> C`, named by `name`
pub async fn abc(backend: MemoryBackend) -> Arc<MemoryBackend> {
    {
        let mut store = backend.store_write().await;
        for name in ["A", "B", "C"] {
            let id = store.create_node("Character");
            store.set_node_property(id, "name", name).unwrap();
        }
        store.create_relationship(NodeId::new(1), NodeId::new(2), "X").unwrap();
        store.create_relationship(NodeId::new(2), NodeId::new(3), "Y").unwrap();
    }
    Arc::new(backend)
}

pub fn engine(backend: Arc<dyn GraphBackend>) -> GraphEngine {
    GraphEngine::with_defaults(backend).unwrap()
}

pub fn engine_with(backend: Arc<dyn GraphBackend>, config: EngineConfig) -> GraphEngine {
    GraphEngine::new(backend, config).unwrap()
}

/// Seed `backend` with the Three Kingdoms graph through a throwaway engine
pub async fn seed_three_kingdoms(backend: Arc<dyn GraphBackend>) {
    load_three_kingdoms(&engine(backend)).await.unwrap();
}

/// Engine over a seeded memory backend
pub async fn three_kingdoms(backend: MemoryBackend) -> (Arc<MemoryBackend>, GraphEngine) {
    let backend = Arc::new(backend);
    seed_three_kingdoms(backend.clone()).await;
    let engine = engine(backend.clone());
    (backend, engine)
}

/// Poll until the backend holds no named computations or the budget runs out
pub async fn wait_for_cleanup(backend: &MemoryBackend) -> bool {
    for _ in 0..200 {
        if backend.active_computations().is_empty() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    backend.active_computations().is_empty()
}

/// Counts calls and optionally slows the capability probe down
pub struct CountingBackend {
    pub inner: Arc<MemoryBackend>,
    pub introspections: AtomicUsize,
    pub matches: AtomicUsize,
    probe_delay: Option<Duration>,
}

impl CountingBackend {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        CountingBackend {
            inner,
            introspections: AtomicUsize::new(0),
            matches: AtomicUsize::new(0),
            probe_delay: None,
        }
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }

    pub fn introspections(&self) -> usize {
        self.introspections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphBackend for CountingBackend {
    async fn match_pattern(&self, spec: &MatchSpec, params: &Params) -> BackendResult<Vec<Record>> {
        self.matches.fetch_add(1, Ordering::SeqCst);
        self.inner.match_pattern(spec, params).await
    }

    async fn create_or_merge(&self, spec: &MergeSpec, params: &Params) -> BackendResult<Option<Record>> {
        self.inner.create_or_merge(spec, params).await
    }

    async fn introspect_procedures(&self, prefix: &str) -> BackendResult<Vec<String>> {
        self.introspections.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.introspect_procedures(prefix).await
    }

    async fn create_named_computation(&self, name: &str, nodes: &NodePattern, rels: &RelPattern) -> BackendResult<()> {
        self.inner.create_named_computation(name, nodes, rels).await
    }

    async fn drop_named_computation(&self, name: &str) -> BackendResult<()> {
        self.inner.drop_named_computation(name).await
    }

    async fn run_named_algorithm(&self, algorithm: &str, computation: &str, params: &Params) -> BackendResult<Vec<Record>> {
        self.inner.run_named_algorithm(algorithm, computation, params).await
    }
}

/// Which calls `FaultyBackend` fails
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub introspection: bool,
    pub subgraph: bool,
    pub hop: bool,
    pub algorithm: bool,
    pub drop: bool,
}

/// Fails selected calls and passes everything else through
pub struct FaultyBackend {
    pub inner: Arc<MemoryBackend>,
    pub faults: Faults,
}

impl FaultyBackend {
    pub fn new(inner: Arc<MemoryBackend>, faults: Faults) -> Self {
        FaultyBackend { inner, faults }
    }
}

fn injected(what: &str) -> BackendError {
    BackendError::Unavailable(format!("injected {} failure", what))
}

#[async_trait]
impl GraphBackend for FaultyBackend {
    async fn match_pattern(&self, spec: &MatchSpec, params: &Params) -> BackendResult<Vec<Record>> {
        match spec {
            MatchSpec::SubgraphAll { .. } if self.faults.subgraph => Err(injected("subgraph")),
            MatchSpec::Hop { .. } if self.faults.hop => Err(injected("hop")),
            _ => self.inner.match_pattern(spec, params).await,
        }
    }

    async fn create_or_merge(&self, spec: &MergeSpec, params: &Params) -> BackendResult<Option<Record>> {
        self.inner.create_or_merge(spec, params).await
    }

    async fn introspect_procedures(&self, prefix: &str) -> BackendResult<Vec<String>> {
        if self.faults.introspection {
            return Err(injected("introspection"));
        }
        self.inner.introspect_procedures(prefix).await
    }

    async fn create_named_computation(&self, name: &str, nodes: &NodePattern, rels: &RelPattern) -> BackendResult<()> {
        self.inner.create_named_computation(name, nodes, rels).await
    }

    async fn drop_named_computation(&self, name: &str) -> BackendResult<()> {
        if self.faults.drop {
            return Err(injected("drop"));
        }
        self.inner.drop_named_computation(name).await
    }

    async fn run_named_algorithm(&self, algorithm: &str, computation: &str, params: &Params) -> BackendResult<Vec<Record>> {
        if self.faults.algorithm {
            return Err(injected("algorithm"));
        }
        self.inner.run_named_algorithm(algorithm, computation, params).await
    }
}

/// Never finishes an algorithm run; used to cancel callers mid-computation
pub struct StallingBackend {
    pub inner: Arc<MemoryBackend>,
    pub started: AtomicUsize,
}

impl StallingBackend {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        StallingBackend {
            inner,
            started: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GraphBackend for StallingBackend {
    async fn match_pattern(&self, spec: &MatchSpec, params: &Params) -> BackendResult<Vec<Record>> {
        self.inner.match_pattern(spec, params).await
    }

    async fn create_or_merge(&self, spec: &MergeSpec, params: &Params) -> BackendResult<Option<Record>> {
        self.inner.create_or_merge(spec, params).await
    }

    async fn introspect_procedures(&self, prefix: &str) -> BackendResult<Vec<String>> {
        self.inner.introspect_procedures(prefix).await
    }

    async fn create_named_computation(&self, name: &str, nodes: &NodePattern, rels: &RelPattern) -> BackendResult<()> {
        self.inner.create_named_computation(name, nodes, rels).await
    }

    async fn drop_named_computation(&self, name: &str) -> BackendResult<()> {
        self.inner.drop_named_computation(name).await
    }

    async fn run_named_algorithm(&self, _algorithm: &str, _computation: &str, _params: &Params) -> BackendResult<Vec<Record>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Slows the computation lifecycle down: `create_delay` after the projection is registered,
/// `drop_delay` before it is dropped
pub struct SlowBackend {
    pub inner: Arc<MemoryBackend>,
    pub create_delay: Duration,
    pub drop_delay: Duration,
}

impl SlowBackend {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        SlowBackend {
            inner,
            create_delay: Duration::ZERO,
            drop_delay: Duration::ZERO,
        }
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn with_drop_delay(mut self, delay: Duration) -> Self {
        self.drop_delay = delay;
        self
    }
}

#[async_trait]
impl GraphBackend for SlowBackend {
    async fn match_pattern(&self, spec: &MatchSpec, params: &Params) -> BackendResult<Vec<Record>> {
        self.inner.match_pattern(spec, params).await
    }

    async fn create_or_merge(&self, spec: &MergeSpec, params: &Params) -> BackendResult<Option<Record>> {
        self.inner.create_or_merge(spec, params).await
    }

    async fn introspect_procedures(&self, prefix: &str) -> BackendResult<Vec<String>> {
        self.inner.introspect_procedures(prefix).await
    }

    async fn create_named_computation(&self, name: &str, nodes: &NodePattern, rels: &RelPattern) -> BackendResult<()> {
        self.inner.create_named_computation(name, nodes, rels).await?;
        tokio::time::sleep(self.create_delay).await;
        Ok(())
    }

    async fn drop_named_computation(&self, name: &str) -> BackendResult<()> {
        tokio::time::sleep(self.drop_delay).await;
        self.inner.drop_named_computation(name).await
    }

    async fn run_named_algorithm(&self, algorithm: &str, computation: &str, params: &Params) -> BackendResult<Vec<Record>> {
        self.inner.run_named_algorithm(algorithm, computation, params).await
    }
}
