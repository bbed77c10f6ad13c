//! Betweenness centrality (Brandes)
//!
//! Single-source dependency accumulation runs per source node in parallel via rayon and the
//! per-source vectors are summed at the end.

use super::common::{GraphView, NodeId};
use rayon::prelude::*;
use std::collections::{HashMap, VecDeque};

/// Unnormalized betweenness over the view's directed edges.
///
/// For an undirected projection (every edge present in both directions) each pair is counted
/// from both ends; callers halve the scores if they want the undirected convention.
pub fn betweenness_centrality(view: &GraphView) -> HashMap<NodeId, f64> {
    let n = view.node_count;
    if n == 0 {
        return HashMap::new();
    }

    let totals = (0..n)
        .into_par_iter()
        .map(|source| single_source_dependencies(view, source))
        .reduce(
            || vec![0.0; n],
            |mut acc, partial| {
                for (a, p) in acc.iter_mut().zip(partial) {
                    *a += p;
                }
                acc
            },
        );

    view.index_to_node
        .iter()
        .copied()
        .zip(totals)
        .collect()
}

fn single_source_dependencies(view: &GraphView, source: usize) -> Vec<f64> {
    let n = view.node_count;
    let mut stack = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut distance = vec![-1i64; n];
    let mut queue = VecDeque::new();

    sigma[source] = 1.0;
    distance[source] = 0;
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in view.successors(v) {
            if distance[w] < 0 {
                distance[w] = distance[v] + 1;
                queue.push_back(w);
            }
            if distance[w] == distance[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
    }
    delta[source] = 0.0;
    delta
}
