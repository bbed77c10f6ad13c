//! Graphsuite
//!
//! A property-graph query and traversal engine. Callers hand `GraphEngine` selectors, raw
//! identifiers and limits; the engine sanitizes every structural token, binds every value as
//! a parameter, and runs typed pattern specs against a pluggable `GraphBackend`.
//!
//! # Components
//!
//! - Identifier sanitizer (`sanitize`): labels, relationship types and property keys
//! - Capability detector: cached probes for optional backend procedures
//! - Traversal: expansion, subgraphs, neighborhoods, paths, search, schema
//! - Centrality: native degree; PageRank and betweenness through named computations
//! - Mutation: merge-semantics node and relationship upserts
//!
//! # Example Usage
//!
//! ```rust
//! use graphsuite::{Direction, GraphEngine, MemoryBackend, Selector};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), graphsuite::EngineError> {
//! let engine = GraphEngine::with_defaults(Arc::new(MemoryBackend::new()))?;
//!
//! let a = engine.upsert_node("Character", "name", graphsuite::props! { "name" => "A" }).await?;
//! let b = engine.upsert_node("Character", "name", graphsuite::props! { "name" => "B" }).await?;
//! engine.upsert_relationship("KNOWS", a.id, b.id, Default::default()).await?;
//!
//! let fragment = engine
//!     .expand(&Selector::property("name", "A"), 1, Direction::Outgoing, &[], 100)
//!     .await?;
//! assert_eq!(fragment.node_count(), 2);
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod graph;
pub mod pattern;
pub mod sanitize;

// Re-export main types for convenience
pub use graph::{
    Direction, GraphError, GraphFragment, GraphResult, GraphStore, Label, Node, NodeId, Path, PathError,
    PropertyMap, PropertyValue, RelId, RelType, Relationship, VisualGraph,
};

pub use backend::{BackendError, BackendResult, GraphBackend, MemoryBackend, Record, Value};

pub use config::{ConfigError, ConfigResult, EngineConfig};

pub use engine::{
    AdvancedCentrality, CapabilityDetector, CentralityKind, CentralityMethod, CentralityReport, CentralityScore,
    DegreeScore, EngineError, EngineResult, ErrorKind, GraphEngine, NeighborPage, PathEngine, Phase, Selector,
    ShortestPaths,
};

pub use sanitize::{sanitize_identifier, Identifier, IdentifierKind};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
