//! Analytics extension of the memory backend
//!
//! A named computation is a CSR snapshot of part of the store, taken when it is created.
//! Algorithms from `graphsuite-algorithms` run over the snapshot; results are resolved back
//! to live nodes and relationships through the store.

use super::memory::{node_id_param, usize_param, NodeFilter, RelFilter};
use super::record::{Record, Value};
use super::{columns, procedures, BackendError, BackendResult};
use crate::graph::{Direction, GraphStore, NodeId, Path, PropertyValue, RelId};
use crate::pattern::Params;
use graphsuite_algorithms::{betweenness_centrality, k_shortest_paths, page_rank, GraphView, PageRankConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Snapshot of the nodes and relationships a computation covers
#[derive(Debug)]
pub struct Projection {
    view: GraphView,
    /// Oriented pair -> lowest relationship id projected onto it
    edges: HashMap<(u64, u64), RelId>,
    relationship_count: usize,
}

impl Projection {
    pub(crate) fn build(store: &GraphStore, nodes: &NodeFilter, rels: &RelFilter) -> Self {
        let members: Vec<u64> = nodes.candidates(store).iter().map(|n| n.id.as_u64()).collect();
        let member_set: std::collections::HashSet<u64> = members.iter().copied().collect();

        let mut oriented = Vec::new();
        let mut edges: HashMap<(u64, u64), RelId> = HashMap::new();
        let mut relationship_count = 0;

        for rel in store.all_relationships() {
            let (start, end) = (rel.start.as_u64(), rel.end.as_u64());
            if !rels.allows(rel) || !member_set.contains(&start) || !member_set.contains(&end) {
                continue;
            }
            relationship_count += 1;

            let pairs = match rels.direction {
                Direction::Outgoing => vec![(start, end)],
                Direction::Incoming => vec![(end, start)],
                Direction::Both if start == end => vec![(start, end)],
                Direction::Both => vec![(start, end), (end, start)],
            };
            for pair in pairs {
                oriented.push(pair);
                edges.entry(pair).or_insert(rel.id);
            }
        }

        Projection {
            view: GraphView::from_edges(&members, &oriented),
            edges,
            relationship_count,
        }
    }

    pub fn node_count(&self) -> usize {
        self.view.node_count
    }

    pub fn relationship_count(&self) -> usize {
        self.relationship_count
    }

    pub(crate) fn run(&self, algorithm: &str, params: &Params, store: &GraphStore) -> BackendResult<Vec<Record>> {
        match algorithm {
            procedures::PAGE_RANK => {
                let mut config = PageRankConfig::default();
                if let Some(damping) = params.get("damping_factor").and_then(PropertyValue::as_float) {
                    config.damping_factor = damping;
                }
                if params.get("max_iterations").is_some() {
                    config.max_iterations = usize_param(params, "max_iterations")?;
                }
                self.score_records(page_rank(&self.view, config), store)
            }
            procedures::BETWEENNESS => self.score_records(betweenness_centrality(&self.view), store),
            procedures::YENS_SHORTEST_PATHS => {
                let source = node_id_param(params, "source")?;
                let target = node_id_param(params, "target")?;
                let k = usize_param(params, "k")?;

                k_shortest_paths(&self.view, source.as_u64(), target.as_u64(), k)
                    .into_iter()
                    .enumerate()
                    .map(|(index, result)| {
                        let path = self.resolve_path(&result.path, store)?;
                        Ok(Record::new()
                            .with(columns::INDEX, Value::Property(PropertyValue::Integer(index as i64)))
                            .with(columns::PATH, Value::Path(path)))
                    })
                    .collect()
            }
            other => Err(BackendError::UnknownProcedure(other.to_string())),
        }
    }

    fn score_records(&self, scores: HashMap<u64, f64>, store: &GraphStore) -> BackendResult<Vec<Record>> {
        let mut scores: Vec<(u64, f64)> = scores.into_iter().collect();
        scores.sort_by_key(|&(id, _)| id);

        scores
            .into_iter()
            .map(|(id, score)| {
                let node = store
                    .get_node(NodeId::new(id))
                    .cloned()
                    .ok_or(BackendError::Graph(crate::graph::GraphError::NodeNotFound(NodeId::new(id))))?;
                Ok(Record::new()
                    .with(columns::NODE, Value::Node(node))
                    .with(columns::SCORE, Value::Property(PropertyValue::Float(score))))
            })
            .collect()
    }

    fn resolve_path(&self, ids: &[u64], store: &GraphStore) -> BackendResult<Path> {
        let nodes = ids
            .iter()
            .map(|&id| {
                store
                    .get_node(NodeId::new(id))
                    .cloned()
                    .ok_or(BackendError::Graph(crate::graph::GraphError::NodeNotFound(NodeId::new(id))))
            })
            .collect::<BackendResult<Vec<_>>>()?;

        let relationships = ids
            .windows(2)
            .map(|pair| {
                let rel_id = self
                    .edges
                    .get(&(pair[0], pair[1]))
                    .copied()
                    .ok_or_else(|| BackendError::Query(format!("no projected edge {} -> {}", pair[0], pair[1])))?;
                store
                    .get_relationship(rel_id)
                    .cloned()
                    .ok_or(BackendError::Graph(crate::graph::GraphError::RelationshipNotFound(rel_id)))
            })
            .collect::<BackendResult<Vec<_>>>()?;

        Ok(Path::new(nodes, relationships)?)
    }
}

/// Named computations currently alive. The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct ComputationRegistry {
    inner: Mutex<HashMap<String, Arc<Projection>>>,
}

impl ComputationRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Projection>>> {
        // A panic while holding the lock leaves the map itself consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn create(&self, name: &str, store: &GraphStore, nodes: &NodeFilter, rels: &RelFilter) -> BackendResult<()> {
        let mut registry = self.lock();
        if registry.contains_key(name) {
            return Err(BackendError::ComputationExists(name.to_string()));
        }
        let projection = Projection::build(store, nodes, rels);
        debug!(
            "projected {} with {} nodes and {} relationships",
            name,
            projection.node_count(),
            projection.relationship_count()
        );
        registry.insert(name.to_string(), Arc::new(projection));
        Ok(())
    }

    pub(crate) fn remove(&self, name: &str) -> BackendResult<()> {
        match self.lock().remove(name) {
            Some(_) => {
                debug!("dropped projection {}", name);
                Ok(())
            }
            None => Err(BackendError::UnknownComputation(name.to_string())),
        }
    }

    pub(crate) fn get(&self, name: &str) -> BackendResult<Arc<Projection>> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::UnknownComputation(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
