//! Graph store adapter
//!
//! `GraphBackend` is the seam between the engine and whatever stores the graph. The engine
//! only ever sends typed specs plus bound parameters; a backend decides how to evaluate them.
//!
//! Implemented by:
//! - `MemoryBackend`: in-process store with optional analytics and path-expansion extensions

pub mod analytics;
pub mod memory;
pub mod record;

pub use memory::MemoryBackend;
pub use record::{Record, Value};

use crate::graph::{GraphError, PathError};
use crate::pattern::{MatchSpec, MergeSpec, NodePattern, Params, RelPattern};
use async_trait::async_trait;
use thiserror::Error;

/// Procedure names a backend may advertise through `introspect_procedures`
pub mod procedures {
    pub const GRAPH_PROJECT: &str = "gds.graph.project";
    pub const GRAPH_DROP: &str = "gds.graph.drop";
    pub const PAGE_RANK: &str = "gds.pageRank.stream";
    pub const BETWEENNESS: &str = "gds.betweenness.stream";
    pub const YENS_SHORTEST_PATHS: &str = "gds.shortestPath.yens.stream";

    pub const SUBGRAPH_ALL: &str = "apoc.path.subgraphAll";
    pub const EXPAND_CONFIG: &str = "apoc.path.expandConfig";
}

/// Column names used in returned records
pub mod columns {
    pub const NODE: &str = "node";
    pub const REL: &str = "rel";
    pub const SOURCE: &str = "source";
    pub const TARGET: &str = "target";
    pub const PATH: &str = "path";
    pub const NODES: &str = "nodes";
    pub const RELATIONSHIPS: &str = "relationships";
    pub const LABEL: &str = "label";
    pub const TYPE: &str = "type";
    pub const SCORE: &str = "score";
    pub const INDEX: &str = "index";
    pub const VALUE: &str = "value";
}

/// Errors reported by a backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Query evaluation error
    #[error("Query error: {0}")]
    Query(String),

    /// Connection or availability error
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Missing parameter ${0}")]
    MissingParameter(String),

    #[error("Parameter ${name} must be {expected}")]
    InvalidParameter { name: String, expected: &'static str },

    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    #[error("Named computation {0} already exists")]
    ComputationExists(String),

    #[error("Unknown named computation: {0}")]
    UnknownComputation(String),

    #[error("Result is missing column {0}")]
    MissingColumn(String),

    #[error("Column {column} holds a {found}, expected a {expected}")]
    UnexpectedValue {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Unified interface to the backing graph store.
///
/// Implementations must give read-your-writes consistency within one call and evaluate each
/// call atomically.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Evaluate a read-only pattern match
    async fn match_pattern(&self, spec: &MatchSpec, params: &Params) -> BackendResult<Vec<Record>>;

    /// Evaluate a write (merge, property update or delete); `None` when an anchoring match
    /// found nothing
    async fn create_or_merge(&self, spec: &MergeSpec, params: &Params) -> BackendResult<Option<Record>>;

    /// Names of installed procedures starting with `prefix`
    async fn introspect_procedures(&self, prefix: &str) -> BackendResult<Vec<String>>;

    /// Create a named in-memory projection. The patterns must not reference parameters.
    async fn create_named_computation(
        &self,
        name: &str,
        nodes: &NodePattern,
        relationships: &RelPattern,
    ) -> BackendResult<()>;

    /// Drop a named projection
    async fn drop_named_computation(&self, name: &str) -> BackendResult<()>;

    /// Run an analytics procedure over a named projection
    async fn run_named_algorithm(
        &self,
        algorithm: &str,
        computation: &str,
        params: &Params,
    ) -> BackendResult<Vec<Record>>;
}
