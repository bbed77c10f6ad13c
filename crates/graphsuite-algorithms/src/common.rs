//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of the graph topology for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (u64)
pub type NodeId = u64;

/// A dense, integer-indexed view of the graph topology using Compressed Sparse Row (CSR) format.
///
/// Undirected projections are expressed by inserting every relationship in both directions,
/// so algorithms only ever walk `successors`.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Outgoing edges CSR structure
    /// Offsets into `out_targets`. Size = node_count + 1
    pub out_offsets: Vec<usize>,
    /// Contiguous array of target node indices
    pub out_targets: Vec<usize>,

    /// Incoming edges CSR structure
    /// Offsets into `in_sources`. Size = node_count + 1
    pub in_offsets: Vec<usize>,
    /// Contiguous array of source node indices
    pub in_sources: Vec<usize>,
}

impl GraphView {
    /// Build a view from a node list and `(source, target)` pairs of node ids.
    ///
    /// Pairs referring to nodes outside `nodes` are skipped. Neighbor order follows the
    /// order of `edges`, which keeps traversals deterministic for a fixed input.
    pub fn from_edges(nodes: &[NodeId], edges: &[(NodeId, NodeId)]) -> Self {
        let node_count = nodes.len();
        let mut node_to_index = HashMap::with_capacity(node_count);
        for (idx, &id) in nodes.iter().enumerate() {
            node_to_index.insert(id, idx);
        }

        let mut outgoing = vec![Vec::new(); node_count];
        let mut incoming = vec![Vec::new(); node_count];
        for &(source, target) in edges {
            let (Some(&u), Some(&v)) = (node_to_index.get(&source), node_to_index.get(&target)) else {
                continue;
            };
            outgoing[u].push(v);
            incoming[v].push(u);
        }

        let (out_offsets, out_targets) = flatten(outgoing);
        let (in_offsets, in_sources) = flatten(incoming);
        GraphView {
            node_count,
            index_to_node: nodes.to_vec(),
            node_to_index,
            out_offsets,
            out_targets,
            in_offsets,
            in_sources,
        }
    }

    /// Dense index of a node, if it is part of the view
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.node_to_index.get(&node).copied()
    }

    /// Get the out-degree of a node (by index)
    pub fn out_degree(&self, idx: usize) -> usize {
        self.out_offsets[idx + 1] - self.out_offsets[idx]
    }

    /// Get outgoing neighbors (successors) of a node
    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.out_targets[self.out_offsets[idx]..self.out_offsets[idx + 1]]
    }

    /// Get incoming neighbors (predecessors) of a node
    pub fn predecessors(&self, idx: usize) -> &[usize] {
        &self.in_sources[self.in_offsets[idx]..self.in_offsets[idx + 1]]
    }
}

/// CSR offsets and the contiguous neighbor array for per-node adjacency lists
fn flatten(lists: Vec<Vec<usize>>) -> (Vec<usize>, Vec<usize>) {
    let mut offsets = Vec::with_capacity(lists.len() + 1);
    let mut flat = Vec::new();
    offsets.push(0);
    for neighbors in lists {
        flat.extend(neighbors);
        offsets.push(flat.len());
    }
    (offsets, flat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_projection() {
        // 10 -> 20 -> 30, 10 -> 30
        let view = GraphView::from_edges(&[10, 20, 30], &[(10, 20), (20, 30), (10, 30)]);

        assert_eq!(view.node_count, 3);
        let a = view.index_of(10).unwrap();
        let b = view.index_of(20).unwrap();
        let c = view.index_of(30).unwrap();

        assert_eq!(view.successors(a), &[b, c]);
        assert_eq!(view.predecessors(c), &[b, a]);
        assert_eq!(view.out_degree(a), 2);
        assert!(view.predecessors(a).is_empty());
    }

    #[test]
    fn test_edges_outside_projection_are_skipped() {
        let view = GraphView::from_edges(&[1, 2], &[(1, 2), (2, 99), (99, 1)]);
        assert_eq!(view.out_targets.len(), 1);
        assert_eq!(view.index_of(99), None);
    }
}
