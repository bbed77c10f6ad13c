//! Paths: alternating node/relationship sequences

use super::node::Node;
use super::relationship::Relationship;
use super::types::{NodeId, RelId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("A path needs at least one node")]
    Empty,

    #[error("A path with {relationships} relationships needs {} nodes, got {nodes}", .relationships + 1)]
    LengthMismatch { nodes: usize, relationships: usize },

    #[error("Relationship {rel} at position {position} does not connect {left} and {right}")]
    Disconnected {
        position: usize,
        rel: RelId,
        left: NodeId,
        right: NodeId,
    },
}

/// An ordered walk `n0 -r0- n1 -r1- ... nk` whose length is the relationship count.
///
/// Endpoint consistency is checked without regard to direction, so paths found by
/// undirected traversal are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PathParts")]
pub struct Path {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

/// Unchecked wire form; deserializing goes through `Path::new`
#[derive(Deserialize)]
struct PathParts {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

impl TryFrom<PathParts> for Path {
    type Error = PathError;

    fn try_from(parts: PathParts) -> Result<Self, Self::Error> {
        Path::new(parts.nodes, parts.relationships)
    }
}

impl Path {
    pub fn new(nodes: Vec<Node>, relationships: Vec<Relationship>) -> Result<Self, PathError> {
        if nodes.is_empty() {
            return Err(PathError::Empty);
        }
        if nodes.len() != relationships.len() + 1 {
            return Err(PathError::LengthMismatch {
                nodes: nodes.len(),
                relationships: relationships.len(),
            });
        }
        for (position, rel) in relationships.iter().enumerate() {
            let left = nodes[position].id;
            let right = nodes[position + 1].id;
            if !rel.connects(left, right) {
                return Err(PathError::Disconnected {
                    position,
                    rel: rel.id,
                    left,
                    right,
                });
            }
        }
        Ok(Path { nodes, relationships })
    }

    /// Zero-length path holding one node
    pub fn single(node: Node) -> Self {
        Path {
            nodes: vec![node],
            relationships: Vec::new(),
        }
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn start(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn end(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// True when no node appears twice
    pub fn is_simple(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.nodes.len());
        self.nodes.iter().all(|n| seen.insert(n.id))
    }
}
