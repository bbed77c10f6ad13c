//! PageRank algorithm implementation

use super::common::{GraphView, NodeId};
use std::collections::HashMap;

/// PageRank configuration
#[derive(Debug, Clone, Copy)]
pub struct PageRankConfig {
    /// Damping factor (usually 0.85)
    pub damping_factor: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Stop once no score moves by more than this between iterations
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.85,
            max_iterations: 20,
            tolerance: 1e-7,
        }
    }
}

/// Calculate PageRank over the view's directed edges.
///
/// Scores start at 1.0 and follow the unnormalized `(1 - d) + d * sum(in / out_degree)`
/// recurrence, so a node with no incoming edges settles at `1 - d`.
pub fn page_rank(view: &GraphView, config: PageRankConfig) -> HashMap<NodeId, f64> {
    let n = view.node_count;
    if n == 0 {
        return HashMap::new();
    }

    let d = config.damping_factor;
    let base_score = 1.0 - d;
    let mut scores = vec![1.0; n];
    let mut next_scores = vec![0.0; n];

    for _ in 0..config.max_iterations {
        let mut max_delta: f64 = 0.0;

        for (i, next) in next_scores.iter_mut().enumerate() {
            let sum_incoming: f64 = view
                .predecessors(i)
                .iter()
                .map(|&source| scores[source] / view.out_degree(source) as f64)
                .sum();

            *next = base_score + d * sum_incoming;
            max_delta = max_delta.max((*next - scores[i]).abs());
        }

        std::mem::swap(&mut scores, &mut next_scores);

        if max_delta < config.tolerance {
            break;
        }
    }

    view.index_to_node
        .iter()
        .copied()
        .zip(scores)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagerank_star() {
        // Center points to both leaves, leaves point back
        let view = GraphView::from_edges(&[1, 2, 3], &[(1, 2), (1, 3), (2, 1), (3, 1)]);
        let scores = page_rank(&view, PageRankConfig::default());

        assert!(scores[&1] > scores[&2]);
        assert!((scores[&2] - scores[&3]).abs() < 1e-9);
    }

    #[test]
    fn test_pagerank_source_node_gets_base_score() {
        let view = GraphView::from_edges(&[1, 2], &[(1, 2)]);
        let scores = page_rank(&view, PageRankConfig::default());

        assert!((scores[&1] - 0.15).abs() < 1e-9);
        assert!(scores[&2] > scores[&1]);
    }

    #[test]
    fn test_pagerank_empty_view() {
        let view = GraphView::from_edges(&[], &[]);
        assert!(page_rank(&view, PageRankConfig::default()).is_empty());
    }
}
