//! Graph fragments: the deduplicated node/relationship bundle traversals return

use super::node::Node;
use super::path::Path;
use super::property::PropertyMap;
use super::relationship::Relationship;
use super::types::{NodeId, RelId};
use indexmap::IndexMap;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

/// Nodes keyed by id plus relationships keyed by id, both in first-seen order.
///
/// Every relationship has both endpoints among the nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphFragment {
    nodes: IndexMap<NodeId, Node>,
    relationships: IndexMap<RelId, Relationship>,
}

impl GraphFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; returns false if it was already present (the first copy wins)
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id, node);
        true
    }

    /// Insert a relationship whose endpoints are already in the fragment.
    ///
    /// Returns false for duplicates and for dangling relationships, which are not stored.
    pub fn insert_relationship(&mut self, rel: Relationship) -> bool {
        if self.relationships.contains_key(&rel.id)
            || !self.nodes.contains_key(&rel.start)
            || !self.nodes.contains_key(&rel.end)
        {
            return false;
        }
        self.relationships.insert(rel.id, rel);
        true
    }

    /// Add every node, then every relationship, of a path
    pub fn merge_path(&mut self, path: &Path) {
        for node in path.nodes() {
            self.insert_node(node.clone());
        }
        for rel in path.relationships() {
            self.insert_relationship(rel.clone());
        }
    }

    /// Union with another fragment, keeping this fragment's order first
    pub fn merge(&mut self, other: GraphFragment) {
        for (_, node) in other.nodes {
            self.insert_node(node);
        }
        for (_, rel) in other.relationships {
            self.insert_relationship(rel);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn relationship_ids(&self) -> Vec<RelId> {
        self.relationships.keys().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node and relationship of `other` is also in `self`
    pub fn is_superset_of(&self, other: &GraphFragment) -> bool {
        other.nodes.keys().all(|id| self.nodes.contains_key(id))
            && other.relationships.keys().all(|id| self.relationships.contains_key(id))
    }

    /// Same node and relationship ids, ignoring order
    pub fn same_elements(&self, other: &GraphFragment) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.relationships.len() == other.relationships.len()
            && self.is_superset_of(other)
    }

    /// Flatten into the `{nodes: [{id, label, props}], edges: [...]}` shape used for drawing
    pub fn to_visual(&self, name_key: &str) -> VisualGraph {
        VisualGraph {
            nodes: self
                .nodes
                .values()
                .map(|node| VisualNode {
                    id: node.id,
                    label: node.display_name(name_key),
                    props: node.properties.clone(),
                })
                .collect(),
            edges: self
                .relationships
                .values()
                .map(|rel| VisualEdge {
                    id: rel.id,
                    source: rel.start,
                    target: rel.end,
                    rel_type: rel.rel_type.to_string(),
                    props: rel.properties.clone(),
                })
                .collect(),
        }
    }
}

impl Serialize for GraphFragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes: Vec<&Node> = self.nodes.values().collect();
        let edges: Vec<&Relationship> = self.relationships.values().collect();
        let mut state = serializer.serialize_struct("GraphFragment", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }
}

/// Drawing-oriented projection of a fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualNode {
    pub id: NodeId,
    pub label: String,
    pub props: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualEdge {
    pub id: RelId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub props: PropertyMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Label;

    fn node(id: u64, name: &str) -> Node {
        let mut node = Node::new(NodeId::new(id), "Character");
        node.set_property("name", name);
        node
    }

    fn rel(id: u64, start: u64, end: u64) -> Relationship {
        Relationship::new(RelId::new(id), "SWORN_BROTHER", NodeId::new(start), NodeId::new(end))
    }

    #[test]
    fn test_rejects_dangling_relationship() {
        let mut fragment = GraphFragment::new();
        fragment.insert_node(node(1, "Lưu Bị"));

        assert!(!fragment.insert_relationship(rel(1, 1, 2)));
        assert_eq!(fragment.relationship_count(), 0);

        fragment.insert_node(node(2, "Quan Vũ"));
        assert!(fragment.insert_relationship(rel(1, 1, 2)));
        assert!(!fragment.insert_relationship(rel(1, 1, 2)));
        assert_eq!(fragment.relationship_count(), 1);
    }

    #[test]
    fn test_merge_path_deduplicates() {
        let path_a = Path::new(vec![node(1, "a"), node(2, "b")], vec![rel(1, 1, 2)]).unwrap();
        let path_b = Path::new(vec![node(2, "b"), node(1, "a")], vec![rel(1, 1, 2)]).unwrap();

        let mut fragment = GraphFragment::new();
        fragment.merge_path(&path_a);
        fragment.merge_path(&path_b);

        assert_eq!(fragment.node_ids(), vec![NodeId::new(1), NodeId::new(2)]);
        assert_eq!(fragment.relationship_count(), 1);
    }

    #[test]
    fn test_superset() {
        let mut small = GraphFragment::new();
        small.insert_node(node(1, "a"));

        let mut big = small.clone();
        big.insert_node(node(2, "b"));
        big.insert_relationship(rel(1, 1, 2));

        assert!(big.is_superset_of(&small));
        assert!(!small.is_superset_of(&big));
        assert!(big.same_elements(&big.clone()));
    }

    #[test]
    fn test_serializes_nodes_and_edges() {
        let mut fragment = GraphFragment::new();
        fragment.insert_node(node(1, "a"));
        fragment.insert_node(node(2, "b"));
        fragment.insert_relationship(rel(5, 1, 2));

        let json = serde_json::to_value(&fragment).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(json["edges"][0]["id"], 5);
        assert_eq!(json["edges"][0]["start"], 1);
    }

    #[test]
    fn test_visual_projection() {
        let mut fragment = GraphFragment::new();
        fragment.insert_node(node(1, "Lưu Bị"));
        fragment.insert_node(Node::new_with_properties(
            NodeId::new(2),
            vec![Label::new("Character"), Label::new("Rebel")],
            PropertyMap::new(),
        ));
        fragment.insert_relationship(rel(3, 1, 2));

        let visual = fragment.to_visual("name");
        assert_eq!(visual.nodes[0].label, "Lưu Bị");
        assert_eq!(visual.nodes[1].label, "Character,Rebel");

        let json = serde_json::to_value(&visual).unwrap();
        assert_eq!(json["edges"][0]["type"], "SWORN_BROTHER");
        assert_eq!(json["edges"][0]["source"], 1);
        assert_eq!(json["edges"][0]["target"], 2);
    }
}
