//! Property graph data model
//!
//! This module implements:
//! - Nodes with ordered, case-sensitive labels and properties
//! - Directed relationships with one type and properties
//! - Paths and deduplicated graph fragments assembled from them
//! - In-memory storage with adjacency lists and label/type indices

pub mod fragment;
pub mod node;
pub mod path;
pub mod property;
pub mod relationship;
pub mod store;
pub mod types;

// Re-export main types
pub use fragment::{GraphFragment, VisualEdge, VisualGraph, VisualNode};
pub use node::Node;
pub use path::{Path, PathError};
pub use property::{PropertyMap, PropertyValue};
pub use relationship::Relationship;
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{Direction, Label, NodeId, RelId, RelType};
