//! Node implementation for the property graph
//!
//! A node carries an ordered label set (no duplicates, case-sensitive) and a property map.

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};

/// A node in the property graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Labels in insertion order
    pub labels: Vec<Label>,

    /// Properties associated with this node
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node with a single label
    pub fn new(id: NodeId, label: impl Into<Label>) -> Self {
        Node {
            id,
            labels: vec![label.into()],
            properties: PropertyMap::new(),
        }
    }

    /// Create a new node with labels and properties. Repeated labels are dropped.
    pub fn new_with_properties(id: NodeId, labels: Vec<Label>, properties: PropertyMap) -> Self {
        let mut node = Node {
            id,
            labels: Vec::with_capacity(labels.len()),
            properties,
        };
        for label in labels {
            node.add_label(label);
        }
        node
    }

    /// Add a label; returns false when the node already had it
    pub fn add_label(&mut self, label: impl Into<Label>) -> bool {
        let label = label.into();
        if self.labels.contains(&label) {
            return false;
        }
        self.labels.push(label);
        true
    }

    /// Check if node has a specific label
    pub fn has_label(&self, label: &Label) -> bool {
        self.labels.contains(label)
    }

    /// Set a property value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Display name: the given property when present, otherwise the labels joined by `,`
    pub fn display_name(&self, name_key: &str) -> String {
        match self.properties.get(name_key) {
            Some(PropertyValue::Null) | None => self
                .labels
                .iter()
                .map(Label::as_str)
                .collect::<Vec<_>>()
                .join(","),
            Some(value) => value.to_string(),
        }
    }
}
