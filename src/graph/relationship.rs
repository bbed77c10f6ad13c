//! Directed, typed relationship between two nodes
//!
//! Type and endpoints are fixed at creation; only properties change afterwards.

use super::property::{PropertyMap, PropertyValue};
use super::types::{NodeId, RelId, RelType};
use serde::{Deserialize, Serialize};

/// A directed relationship in the property graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier for this relationship
    pub id: RelId,

    /// Type of relationship (e.g., "SWORN_BROTHER")
    pub rel_type: RelType,

    /// Start node (relationship goes FROM this node)
    pub start: NodeId,

    /// End node (relationship goes TO this node)
    pub end: NodeId,

    /// Properties associated with this relationship
    pub properties: PropertyMap,
}

impl Relationship {
    pub fn new(id: RelId, rel_type: impl Into<RelType>, start: NodeId, end: NodeId) -> Self {
        Self::new_with_properties(id, rel_type, start, end, PropertyMap::new())
    }

    pub fn new_with_properties(
        id: RelId,
        rel_type: impl Into<RelType>,
        start: NodeId,
        end: NodeId,
        properties: PropertyMap,
    ) -> Self {
        Relationship {
            id,
            rel_type: rel_type.into(),
            start,
            end,
            properties,
        }
    }

    /// Set a property value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Check if this relationship connects two specific nodes (in either direction)
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }

    /// The endpoint opposite to `node`, or `None` when `node` is not an endpoint
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.start == node {
            Some(self.end)
        } else if self.end == node {
            Some(self.start)
        } else {
            None
        }
    }
}
