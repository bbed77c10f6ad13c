//! Pathfinding algorithms
//!
//! Yen's k-shortest simple paths over unweighted BFS. Only `successors` are walked;
//! callers wanting undirected semantics project every edge in both directions.

use super::common::{GraphView, NodeId};
use std::collections::{HashSet, VecDeque};

/// Result of a pathfinding algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub source: NodeId,
    pub target: NodeId,
    pub path: Vec<NodeId>,
    pub cost: f64,
}

impl PathResult {
    fn from_indices(view: &GraphView, indices: &[usize]) -> Self {
        let path: Vec<NodeId> = indices.iter().map(|&i| view.index_to_node[i]).collect();
        PathResult {
            source: path[0],
            target: path[path.len() - 1],
            cost: (path.len() - 1) as f64,
            path,
        }
    }
}

/// BFS over dense indices, skipping banned nodes and banned `(from, to)` edges.
fn bfs_indices(
    view: &GraphView,
    source: usize,
    target: usize,
    banned_nodes: &HashSet<usize>,
    banned_edges: &HashSet<(usize, usize)>,
) -> Option<Vec<usize>> {
    let mut parent: Vec<Option<usize>> = vec![None; view.node_count];
    let mut visited = vec![false; view.node_count];
    let mut queue = VecDeque::new();

    visited[source] = true;
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        if current == target {
            let mut path = vec![target];
            let mut cursor = target;
            while let Some(p) = parent[cursor] {
                path.push(p);
                cursor = p;
            }
            path.reverse();
            return Some(path);
        }

        for &next in view.successors(current) {
            if visited[next] || banned_nodes.contains(&next) || banned_edges.contains(&(current, next)) {
                continue;
            }
            visited[next] = true;
            parent[next] = Some(current);
            queue.push_back(next);
        }
    }

    None
}

/// Yen's algorithm: up to `k` loopless shortest paths ordered by ascending hop count.
///
/// Candidates of equal length are ranked by their node-index sequence, so the output is
/// stable for a fixed view.
pub fn k_shortest_paths(view: &GraphView, source: NodeId, target: NodeId, k: usize) -> Vec<PathResult> {
    let (Some(source_idx), Some(target_idx)) = (view.index_of(source), view.index_of(target)) else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }

    let Some(first) = bfs_indices(view, source_idx, target_idx, &HashSet::new(), &HashSet::new()) else {
        return Vec::new();
    };

    let mut accepted: Vec<Vec<usize>> = vec![first];
    let mut candidates: Vec<Vec<usize>> = Vec::new();

    while accepted.len() < k {
        let previous = accepted[accepted.len() - 1].clone();

        for i in 0..previous.len().saturating_sub(1) {
            let spur = previous[i];
            let root = &previous[..=i];

            let mut banned_edges = HashSet::new();
            for path in &accepted {
                if path.len() > i + 1 && &path[..=i] == root {
                    banned_edges.insert((path[i], path[i + 1]));
                }
            }
            let banned_nodes: HashSet<usize> = root[..i].iter().copied().collect();

            if let Some(spur_path) = bfs_indices(view, spur, target_idx, &banned_nodes, &banned_edges) {
                let mut total = root[..i].to_vec();
                total.extend(spur_path);
                if !accepted.contains(&total) && !candidates.contains(&total) {
                    candidates.push(total);
                }
            }
        }

        if candidates.is_empty() {
            break;
        }

        candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        accepted.push(candidates.remove(0));
    }

    accepted
        .iter()
        .map(|indices| PathResult::from_indices(view, indices))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn undirected(nodes: &[NodeId], edges: &[(NodeId, NodeId)]) -> GraphView {
        let both: Vec<(NodeId, NodeId)> = edges
            .iter()
            .flat_map(|&(a, b)| [(a, b), (b, a)])
            .collect();
        GraphView::from_edges(nodes, &both)
    }

    #[test]
    fn test_single_path_follows_direction() {
        // 1 -> 2 -> 3
        let view = GraphView::from_edges(&[1, 2, 3], &[(1, 2), (2, 3)]);

        let paths = k_shortest_paths(&view, 1, 3, 1);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].path, vec![1, 2, 3]);
        assert_eq!(paths[0].cost, 2.0);
        assert!(k_shortest_paths(&view, 3, 1, 1).is_empty());
    }

    #[test]
    fn test_same_node_is_a_zero_length_path() {
        let view = GraphView::from_edges(&[1], &[]);
        let paths = k_shortest_paths(&view, 1, 1, 3);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].path, vec![1]);
        assert_eq!(paths[0].cost, 0.0);
    }

    #[test]
    fn test_k_shortest_paths_ranked_by_length() {
        // Square 1-2-4, 1-3-4 plus a long detour 1-5-6-4
        let view = undirected(
            &[1, 2, 3, 4, 5, 6],
            &[(1, 2), (2, 4), (1, 3), (3, 4), (1, 5), (5, 6), (6, 4)],
        );

        let paths = k_shortest_paths(&view, 1, 4, 5);
        let lengths: Vec<usize> = paths.iter().map(|p| p.path.len() - 1).collect();

        assert_eq!(lengths, vec![2, 2, 3]);
        assert_eq!(paths[0].path, vec![1, 2, 4]);
        assert_eq!(paths[1].path, vec![1, 3, 4]);
        assert_eq!(paths[2].path, vec![1, 5, 6, 4]);
    }

    #[test]
    fn test_k_shortest_paths_are_simple() {
        let view = undirected(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (2, 4), (1, 3)]);

        for result in k_shortest_paths(&view, 1, 4, 10) {
            let unique: HashSet<_> = result.path.iter().collect();
            assert_eq!(unique.len(), result.path.len());
        }
    }

    #[test]
    fn test_k_shortest_paths_unreachable() {
        let view = GraphView::from_edges(&[1, 2], &[]);
        assert!(k_shortest_paths(&view, 1, 2, 3).is_empty());
    }
}
