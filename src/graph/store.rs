//! In-memory graph storage
//!
//! Arena-style storage: node and relationship ids are dense, start at 1 and are never reused,
//! so a slot index is `id - 1`. A deleted node leaves an empty slot behind. Adjacency lists are appended in id order, which keeps every
//! incident-relationship listing sorted without extra work.

use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::relationship::Relationship;
use super::types::{Direction, Label, NodeId, RelId, RelType};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Relationship {0} not found")]
    RelationshipNotFound(RelId),

    #[error("Invalid relationship: start node {0} does not exist")]
    InvalidRelationshipStart(NodeId),

    #[error("Invalid relationship: end node {0} does not exist")]
    InvalidRelationshipEnd(NodeId),

    #[error("Node {0} still has {1} relationship(s)")]
    NodeHasRelationships(NodeId, usize),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
///
/// - nodes / relationships: arenas indexed by `id - 1`; `None` marks a deleted node
/// - outgoing / incoming: per-node relationship ids, ascending
/// - label_index / type_index: lookup sets, ascending
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Option<Node>>,
    relationships: Vec<Relationship>,
    outgoing: Vec<Vec<RelId>>,
    incoming: Vec<Vec<RelId>>,
    label_index: FxHashMap<Label, BTreeSet<NodeId>>,
    type_index: FxHashMap<RelType, BTreeSet<RelId>>,
}

fn slot(id: u64) -> Option<usize> {
    id.checked_sub(1).map(|i| i as usize)
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with a single label and no properties
    pub fn create_node(&mut self, label: impl Into<Label>) -> NodeId {
        self.create_node_with_properties(vec![label.into()], PropertyMap::new())
    }

    /// Create a node with labels and properties
    pub fn create_node_with_properties(&mut self, labels: Vec<Label>, properties: PropertyMap) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64 + 1);
        let node = Node::new_with_properties(id, labels, properties);

        for label in &node.labels {
            self.label_index.entry(label.clone()).or_default().insert(id);
        }

        self.nodes.push(Some(node));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        slot(id.as_u64()).and_then(|i| self.nodes.get(i)).and_then(Option::as_ref)
    }

    fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        slot(id.as_u64()).and_then(|i| self.nodes.get_mut(i)).and_then(Option::as_mut)
    }

    /// Check if a node exists
    pub fn has_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Set a property on a node, returning the previous value
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let node = self.get_node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        Ok(node.set_property(key, value))
    }

    /// Delete a node that has no relationships, returning it.
    ///
    /// The id is not handed out again.
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        if !self.has_node(id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let attached = self.incident(id, Direction::Both).len();
        if attached > 0 {
            return Err(GraphError::NodeHasRelationships(id, attached));
        }

        let node = slot(id.as_u64())
            .and_then(|i| self.nodes.get_mut(i))
            .and_then(Option::take)
            .ok_or(GraphError::NodeNotFound(id))?;

        // Remove from label indices
        for label in &node.labels {
            if let Some(node_set) = self.label_index.get_mut(label) {
                node_set.remove(&id);
            }
        }
        Ok(node)
    }

    /// Create a relationship between two existing nodes
    pub fn create_relationship(
        &mut self,
        start: NodeId,
        end: NodeId,
        rel_type: impl Into<RelType>,
    ) -> GraphResult<RelId> {
        self.create_relationship_with_properties(start, end, rel_type, PropertyMap::new())
    }

    /// Create a relationship with properties
    pub fn create_relationship_with_properties(
        &mut self,
        start: NodeId,
        end: NodeId,
        rel_type: impl Into<RelType>,
        properties: PropertyMap,
    ) -> GraphResult<RelId> {
        if !self.has_node(start) {
            return Err(GraphError::InvalidRelationshipStart(start));
        }
        if !self.has_node(end) {
            return Err(GraphError::InvalidRelationshipEnd(end));
        }

        let id = RelId::new(self.relationships.len() as u64 + 1);
        let rel = Relationship::new_with_properties(id, rel_type, start, end, properties);

        // Endpoints were checked above, so both slots exist
        self.outgoing[start.as_u64() as usize - 1].push(id);
        self.incoming[end.as_u64() as usize - 1].push(id);
        self.type_index.entry(rel.rel_type.clone()).or_default().insert(id);

        self.relationships.push(rel);
        Ok(id)
    }

    /// Get a relationship by ID
    pub fn get_relationship(&self, id: RelId) -> Option<&Relationship> {
        slot(id.as_u64()).and_then(|i| self.relationships.get(i))
    }

    /// Set a property on a relationship, returning the previous value
    pub fn set_relationship_property(
        &mut self,
        id: RelId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let rel = slot(id.as_u64())
            .and_then(|i| self.relationships.get_mut(i))
            .ok_or(GraphError::RelationshipNotFound(id))?;
        Ok(rel.set_property(key, value))
    }

    /// Relationships touching `node` in the given direction, ascending by id.
    ///
    /// With `Direction::Both` a self-loop is listed once.
    pub fn incident(&self, node: NodeId, direction: Direction) -> Vec<&Relationship> {
        let Some(i) = slot(node.as_u64()).filter(|&i| i < self.outgoing.len()) else {
            return Vec::new();
        };

        let ids: Vec<RelId> = match direction {
            Direction::Outgoing => self.outgoing[i].clone(),
            Direction::Incoming => self.incoming[i].clone(),
            Direction::Both => {
                let merged: BTreeSet<RelId> = self.outgoing[i]
                    .iter()
                    .chain(self.incoming[i].iter())
                    .copied()
                    .collect();
                merged.into_iter().collect()
            }
        };

        ids.into_iter()
            .filter_map(|id| self.get_relationship(id))
            .collect()
    }

    /// Get all nodes with a specific label, ascending by id
    pub fn nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        self.label_index
            .get(label)
            .map(|ids| ids.iter().filter_map(|&id| self.get_node(id)).collect())
            .unwrap_or_default()
    }

    /// Get all nodes, ascending by id
    pub fn all_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().flatten().collect()
    }

    /// Get all relationships, ascending by id
    pub fn all_relationships(&self) -> Vec<&Relationship> {
        self.relationships.iter().collect()
    }

    /// Lowest-id node (optionally with `label`) whose `key` property equals `value`
    pub fn find_node(&self, label: Option<&Label>, key: &str, value: &PropertyValue) -> Option<&Node> {
        let matches = |node: &&Node| node.get_property(key) == Some(value);
        match label {
            Some(label) => self.nodes_by_label(label).into_iter().find(matches),
            None => self.nodes.iter().flatten().find(matches),
        }
    }

    /// Lowest-id relationship `start -[rel_type]-> end`
    pub fn find_relationship(&self, start: NodeId, end: NodeId, rel_type: &RelType) -> Option<&Relationship> {
        self.incident(start, Direction::Outgoing)
            .into_iter()
            .find(|rel| rel.end == end && &rel.rel_type == rel_type)
    }

    /// Labels carried by at least one node, sorted
    pub fn labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .label_index
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(label, _)| label.clone())
            .collect();
        labels.sort();
        labels
    }

    /// Relationship types in use, sorted
    pub fn relationship_types(&self) -> Vec<RelType> {
        let mut types: Vec<RelType> = self
            .type_index
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(rel_type, _)| rel_type.clone())
            .collect();
        types.sort();
        types
    }

    /// Get total number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Get total number of relationships
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}
