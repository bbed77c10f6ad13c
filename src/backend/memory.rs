//! In-process backend over a shared `GraphStore`
//!
//! Reads take the store's read lock, writes take the write lock for the whole call, so every
//! call is atomic. Two optional extensions mirror what a production store may have installed:
//! - analytics: named computations, PageRank, betweenness, Yen's k-shortest paths
//! - path expansion: the single-call `SubgraphAll` procedure

use super::analytics::ComputationRegistry;
use super::record::{Record, Value};
use super::{columns, procedures, BackendError, BackendResult, GraphBackend};
use crate::graph::{Direction, GraphStore, Label, Node, NodeId, Path, PropertyValue, RelType, Relationship};
use crate::pattern::{resolve_set, FilterOp, MatchSpec, MergeSpec, NodePattern, Params, RelPattern, SetProperty};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Which optional procedure families are installed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extensions {
    pub analytics: bool,
    pub path_expansion: bool,
}

/// In-memory `GraphBackend`
pub struct MemoryBackend {
    store: Arc<RwLock<GraphStore>>,
    extensions: Extensions,
    computations: ComputationRegistry,
}

impl MemoryBackend {
    /// Create a backend over a fresh, empty store with no extensions
    pub fn new() -> Self {
        Self::with_store(Arc::new(RwLock::new(GraphStore::new())))
    }

    /// Create a backend sharing an existing store
    pub fn with_store(store: Arc<RwLock<GraphStore>>) -> Self {
        MemoryBackend {
            store,
            extensions: Extensions::default(),
            computations: ComputationRegistry::default(),
        }
    }

    /// Install the analytics procedures
    pub fn with_analytics(mut self) -> Self {
        self.extensions.analytics = true;
        self
    }

    /// Install the path-expansion procedures
    pub fn with_path_expansion(mut self) -> Self {
        self.extensions.path_expansion = true;
        self
    }

    pub fn extensions(&self) -> Extensions {
        self.extensions
    }

    /// Get a reference to the underlying store
    pub fn store(&self) -> &Arc<RwLock<GraphStore>> {
        &self.store
    }

    /// Acquire a read lock on the store
    pub async fn store_read(&self) -> tokio::sync::RwLockReadGuard<'_, GraphStore> {
        self.store.read().await
    }

    /// Acquire a write lock on the store
    pub async fn store_write(&self) -> tokio::sync::RwLockWriteGuard<'_, GraphStore> {
        self.store.write().await
    }

    /// Names of named computations that currently exist, sorted
    pub fn active_computations(&self) -> Vec<String> {
        self.computations.names()
    }

    fn installed_procedures(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.extensions.analytics {
            names.extend([
                procedures::GRAPH_PROJECT,
                procedures::GRAPH_DROP,
                procedures::PAGE_RANK,
                procedures::BETWEENNESS,
                procedures::YENS_SHORTEST_PATHS,
            ]);
        }
        if self.extensions.path_expansion {
            names.extend([procedures::SUBGRAPH_ALL, procedures::EXPAND_CONFIG]);
        }
        names
    }

    fn require_analytics(&self, procedure: &str) -> BackendResult<()> {
        if self.extensions.analytics {
            Ok(())
        } else {
            Err(BackendError::UnknownProcedure(procedure.to_string()))
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A `NodePattern` with its parameters resolved
#[derive(Debug, Clone)]
pub(crate) struct NodeFilter {
    labels: Vec<Label>,
    ids: Option<Vec<NodeId>>,
    filters: Vec<(String, FilterOp, PropertyValue)>,
}

impl NodeFilter {
    pub(crate) fn resolve(pattern: &NodePattern, params: &Params) -> BackendResult<Self> {
        let ids = match &pattern.id_param {
            Some(name) => {
                let mut ids = node_ids_param(params, name)?;
                ids.sort();
                ids.dedup();
                Some(ids)
            }
            None => None,
        };

        let filters = pattern
            .filters
            .iter()
            .map(|f| {
                let value = param(params, &f.param)?.clone();
                Ok((f.key.as_str().to_string(), f.op, value))
            })
            .collect::<BackendResult<Vec<_>>>()?;

        Ok(NodeFilter {
            labels: pattern.labels.iter().map(|l| Label::new(l.as_str())).collect(),
            ids,
            filters,
        })
    }

    pub(crate) fn matches(&self, node: &Node) -> bool {
        if let Some(ids) = &self.ids {
            if ids.binary_search(&node.id).is_err() {
                return false;
            }
        }
        if !self.labels.iter().all(|label| node.has_label(label)) {
            return false;
        }
        self.filters.iter().all(|(key, op, expected)| {
            let Some(actual) = node.get_property(key) else {
                return false;
            };
            match op {
                FilterOp::Equals => actual == expected,
                FilterOp::Contains => match (actual.as_string(), expected.as_string()) {
                    (Some(haystack), Some(needle)) => haystack.contains(needle),
                    _ => false,
                },
            }
        })
    }

    /// Matching nodes ascending by id
    pub(crate) fn candidates<'a>(&self, store: &'a GraphStore) -> Vec<&'a Node> {
        let pool: Vec<&Node> = match (&self.ids, self.labels.first()) {
            (Some(ids), _) => ids.iter().filter_map(|&id| store.get_node(id)).collect(),
            (None, Some(label)) => store.nodes_by_label(label),
            (None, None) => store.all_nodes(),
        };
        pool.into_iter().filter(|node| self.matches(node)).collect()
    }
}

/// A `RelPattern` converted to store types
#[derive(Debug, Clone)]
pub(crate) struct RelFilter {
    types: Vec<RelType>,
    pub(crate) direction: Direction,
}

impl RelFilter {
    pub(crate) fn new(pattern: &RelPattern) -> Self {
        RelFilter {
            types: pattern.types.iter().map(|t| RelType::new(t.as_str())).collect(),
            direction: pattern.direction,
        }
    }

    pub(crate) fn allows(&self, rel: &Relationship) -> bool {
        self.types.is_empty() || self.types.contains(&rel.rel_type)
    }

    /// Relationships leaving `node` under this filter, with the node each one leads to
    fn steps<'a>(&self, store: &'a GraphStore, node: NodeId) -> Vec<(&'a Relationship, NodeId)> {
        store
            .incident(node, self.direction)
            .into_iter()
            .filter(|rel| self.allows(rel))
            .filter_map(|rel| {
                let next = match self.direction {
                    Direction::Outgoing => Some(rel.end),
                    Direction::Incoming => Some(rel.start),
                    Direction::Both => rel.other_end(node),
                };
                next.map(|next| (rel, next))
            })
            .collect()
    }
}

fn param<'a>(params: &'a Params, name: &str) -> BackendResult<&'a PropertyValue> {
    params
        .get(name)
        .ok_or_else(|| BackendError::MissingParameter(name.to_string()))
}

fn node_id_value(value: &PropertyValue, name: &str) -> BackendResult<NodeId> {
    match value {
        PropertyValue::Integer(i) if *i >= 0 => Ok(NodeId::new(*i as u64)),
        _ => Err(BackendError::InvalidParameter {
            name: name.to_string(),
            expected: "a node id",
        }),
    }
}

/// A parameter holding one node id or an array of them
pub(crate) fn node_ids_param(params: &Params, name: &str) -> BackendResult<Vec<NodeId>> {
    match param(params, name)? {
        PropertyValue::Array(items) => items.iter().map(|v| node_id_value(v, name)).collect(),
        other => Ok(vec![node_id_value(other, name)?]),
    }
}

pub(crate) fn node_id_param(params: &Params, name: &str) -> BackendResult<NodeId> {
    node_id_value(param(params, name)?, name)
}

pub(crate) fn usize_param(params: &Params, name: &str) -> BackendResult<usize> {
    match param(params, name)? {
        PropertyValue::Integer(i) if *i >= 0 => Ok(*i as usize),
        _ => Err(BackendError::InvalidParameter {
            name: name.to_string(),
            expected: "a non-negative integer",
        }),
    }
}

/// One-hop rows `(source, rel, target)` ordered by source id then relationship id
fn hop_rows<'a>(
    store: &'a GraphStore,
    sources: &[&'a Node],
    rel: &RelFilter,
    to: &NodeFilter,
    limit: Option<usize>,
) -> Vec<(&'a Node, &'a Relationship, &'a Node)> {
    let mut rows = Vec::new();
    for &source in sources {
        for (relationship, next) in rel.steps(store, source.id) {
            if limit.is_some_and(|limit| rows.len() >= limit) {
                return rows;
            }
            let Some(target) = store.get_node(next) else {
                continue;
            };
            if to.matches(target) {
                rows.push((source, relationship, target));
            }
        }
    }
    rows
}

fn materialize_path(store: &GraphStore, node_ids: &[NodeId], rels: &[&Relationship]) -> BackendResult<Path> {
    let nodes = node_ids
        .iter()
        .map(|&id| {
            store
                .get_node(id)
                .cloned()
                .ok_or(BackendError::Graph(crate::graph::GraphError::NodeNotFound(id)))
        })
        .collect::<BackendResult<Vec<_>>>()?;
    let relationships = rels.iter().map(|&r| r.clone()).collect();
    Ok(Path::new(nodes, relationships)?)
}

/// Simple paths from any `from` node to any `to` node, level by level
fn enumerate_paths(
    store: &GraphStore,
    from: &NodeFilter,
    to: &NodeFilter,
    rel: &RelFilter,
    max_hops: usize,
    limit: Option<usize>,
) -> BackendResult<Vec<Path>> {
    let mut found = Vec::new();
    let mut partial: Vec<(Vec<NodeId>, Vec<&Relationship>)> = from
        .candidates(store)
        .into_iter()
        .map(|n| (vec![n.id], Vec::new()))
        .collect();

    for _ in 0..max_hops {
        let mut next_level = Vec::new();
        for (nodes, rels) in &partial {
            let Some(&last) = nodes.last() else { continue };
            for (relationship, next) in rel.steps(store, last) {
                if nodes.contains(&next) {
                    continue;
                }
                let mut nodes = nodes.clone();
                let mut rels = rels.clone();
                nodes.push(next);
                rels.push(relationship);

                if store.get_node(next).is_some_and(|n| to.matches(n)) {
                    found.push(materialize_path(store, &nodes, &rels)?);
                    if limit.is_some_and(|limit| found.len() >= limit) {
                        return Ok(found);
                    }
                }
                next_level.push((nodes, rels));
            }
        }
        if next_level.is_empty() {
            break;
        }
        partial = next_level;
    }

    Ok(found)
}

/// BFS from the lowest-id `from` node to the nearest `to` node
fn shortest_path(
    store: &GraphStore,
    from: &NodeFilter,
    to: &NodeFilter,
    rel: &RelFilter,
    max_hops: usize,
) -> BackendResult<Option<Path>> {
    let Some(source) = from.candidates(store).into_iter().next() else {
        return Ok(None);
    };
    if to.matches(source) {
        return Ok(Some(Path::single(source.clone())));
    }

    let mut parent: std::collections::HashMap<NodeId, (NodeId, &Relationship)> = Default::default();
    let mut visited: HashSet<NodeId> = HashSet::from([source.id]);
    let mut frontier = vec![source.id];

    for _ in 0..max_hops {
        let mut next_frontier = Vec::new();
        for &current in &frontier {
            for (relationship, next) in rel.steps(store, current) {
                if !visited.insert(next) {
                    continue;
                }
                parent.insert(next, (current, relationship));
                if store.get_node(next).is_some_and(|n| to.matches(n)) {
                    let mut nodes = vec![next];
                    let mut rels = Vec::new();
                    let mut cursor = next;
                    while let Some(&(prev, r)) = parent.get(&cursor) {
                        nodes.push(prev);
                        rels.push(r);
                        cursor = prev;
                    }
                    nodes.reverse();
                    rels.reverse();
                    return materialize_path(store, &nodes, &rels).map(Some);
                }
                next_frontier.push(next);
            }
        }
        if next_frontier.is_empty() {
            break;
        }
        frontier = next_frontier;
    }

    Ok(None)
}

/// Level-by-level undirected neighborhood; the same walk a caller gets from repeated hops
fn subgraph_all(
    store: &GraphStore,
    start: &Node,
    max_depth: usize,
    limit: Option<usize>,
) -> (Vec<Node>, Vec<Relationship>) {
    let any_rel = RelFilter::new(&RelPattern::undirected());
    let any_node = NodeFilter {
        labels: Vec::new(),
        ids: None,
        filters: Vec::new(),
    };

    let mut nodes = vec![start.clone()];
    let mut rels = Vec::new();
    let mut seen_nodes: HashSet<NodeId> = HashSet::from([start.id]);
    let mut seen_rels = HashSet::new();
    let mut frontier = vec![start];

    for _ in 0..max_depth {
        if frontier.is_empty() {
            break;
        }
        frontier.sort_by_key(|n| n.id);
        frontier.dedup_by_key(|n| n.id);

        let mut next_frontier = Vec::new();
        for (_, rel, target) in hop_rows(store, &frontier, &any_rel, &any_node, limit) {
            if seen_nodes.insert(target.id) {
                nodes.push(target.clone());
                next_frontier.push(target);
            }
            if seen_rels.insert(rel.id) {
                rels.push(rel.clone());
            }
        }
        frontier = next_frontier;
    }

    (nodes, rels)
}

fn first_missing(set: &[SetProperty], params: &Params) -> BackendError {
    let name = set
        .iter()
        .find(|item| params.get(&item.param).is_none())
        .map(|item| item.param.clone())
        .unwrap_or_default();
    BackendError::MissingParameter(name)
}

#[async_trait]
impl GraphBackend for MemoryBackend {
    async fn match_pattern(&self, spec: &MatchSpec, params: &Params) -> BackendResult<Vec<Record>> {
        let store = self.store.read().await;

        let records = match spec {
            MatchSpec::Nodes { pattern, limit } => {
                let filter = NodeFilter::resolve(pattern, params)?;
                filter
                    .candidates(&store)
                    .into_iter()
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|node| Record::new().with(columns::NODE, Value::Node(node.clone())))
                    .collect()
            }
            MatchSpec::Hop { from, rel, to, limit } => {
                let from = NodeFilter::resolve(from, params)?;
                let to = NodeFilter::resolve(to, params)?;
                let sources = from.candidates(&store);
                hop_rows(&store, &sources, &RelFilter::new(rel), &to, *limit)
                    .into_iter()
                    .map(|(source, rel, target)| {
                        Record::new()
                            .with(columns::SOURCE, Value::Node(source.clone()))
                            .with(columns::REL, Value::Relationship(rel.clone()))
                            .with(columns::TARGET, Value::Node(target.clone()))
                    })
                    .collect()
            }
            MatchSpec::Paths { from, to, rel, max_hops, limit } => {
                let from = NodeFilter::resolve(from, params)?;
                let to = NodeFilter::resolve(to, params)?;
                enumerate_paths(&store, &from, &to, &RelFilter::new(rel), *max_hops, *limit)?
                    .into_iter()
                    .map(|path| Record::new().with(columns::PATH, Value::Path(path)))
                    .collect()
            }
            MatchSpec::ShortestPath { from, to, rel, max_hops } => {
                let from = NodeFilter::resolve(from, params)?;
                let to = NodeFilter::resolve(to, params)?;
                shortest_path(&store, &from, &to, &RelFilter::new(rel), *max_hops)?
                    .into_iter()
                    .map(|path| Record::new().with(columns::PATH, Value::Path(path)))
                    .collect()
            }
            MatchSpec::SubgraphAll { start, max_depth, limit } => {
                if !self.extensions.path_expansion {
                    return Err(BackendError::UnknownProcedure(procedures::SUBGRAPH_ALL.to_string()));
                }
                let start = NodeFilter::resolve(start, params)?;
                match start.candidates(&store).into_iter().next() {
                    Some(start) => {
                        let (nodes, rels) = subgraph_all(&store, start, *max_depth, *limit);
                        debug!("subgraphAll from {} reached {} nodes", start.id, nodes.len());
                        vec![Record::new()
                            .with(columns::NODES, Value::List(nodes.into_iter().map(Value::Node).collect()))
                            .with(
                                columns::RELATIONSHIPS,
                                Value::List(rels.into_iter().map(Value::Relationship).collect()),
                            )]
                    }
                    None => Vec::new(),
                }
            }
            MatchSpec::Between { nodes, rel } => {
                let nodes = NodeFilter::resolve(nodes, params)?;
                let members: HashSet<NodeId> = nodes.candidates(&store).iter().map(|n| n.id).collect();
                let rel = RelFilter::new(rel);
                store
                    .all_relationships()
                    .into_iter()
                    .filter(|r| rel.allows(r) && members.contains(&r.start) && members.contains(&r.end))
                    .map(|r| Record::new().with(columns::REL, Value::Relationship(r.clone())))
                    .collect()
            }
            MatchSpec::Labels => store
                .labels()
                .into_iter()
                .map(|l| Record::new().with(columns::LABEL, Value::Property(l.as_str().into())))
                .collect(),
            MatchSpec::RelationshipTypes => store
                .relationship_types()
                .into_iter()
                .map(|t| Record::new().with(columns::TYPE, Value::Property(t.as_str().into())))
                .collect(),
            MatchSpec::DistinctValues { pattern, key } => {
                let filter = NodeFilter::resolve(pattern, params)?;
                let mut values: Vec<PropertyValue> = Vec::new();
                for node in filter.candidates(&store) {
                    match node.get_property(key.as_str()) {
                        None | Some(PropertyValue::Null) => {}
                        Some(value) if values.contains(value) => {}
                        Some(value) => values.push(value.clone()),
                    }
                }
                values
                    .into_iter()
                    .map(|v| Record::new().with(columns::VALUE, Value::Property(v)))
                    .collect()
            }
        };

        Ok(records)
    }

    async fn create_or_merge(&self, spec: &MergeSpec, params: &Params) -> BackendResult<Option<Record>> {
        let mut store = self.store.write().await;

        match spec {
            MergeSpec::Node { label, key, key_param, set } => {
                let label = Label::new(label.as_str());
                let key_value = param(params, key_param)?.clone();
                let updates = resolve_set(set, params).ok_or_else(|| first_missing(set, params))?;

                let existing = store.find_node(Some(&label), key.as_str(), &key_value).map(|n| n.id);
                let id = match existing {
                    Some(id) => {
                        for (k, v) in updates {
                            store.set_node_property(id, k, v)?;
                        }
                        id
                    }
                    None => {
                        let mut properties = updates;
                        properties.insert(key.as_str().to_string(), key_value);
                        store.create_node_with_properties(vec![label], properties)
                    }
                };

                let node = store
                    .get_node(id)
                    .cloned()
                    .ok_or(BackendError::Graph(crate::graph::GraphError::NodeNotFound(id)))?;
                Ok(Some(Record::new().with(columns::NODE, Value::Node(node))))
            }
            MergeSpec::Relationship { rel_type, start_param, end_param, set } => {
                let start = node_id_param(params, start_param)?;
                let end = node_id_param(params, end_param)?;
                let updates = resolve_set(set, params).ok_or_else(|| first_missing(set, params))?;

                if !store.has_node(start) || !store.has_node(end) {
                    return Ok(None);
                }

                let rel_type = RelType::new(rel_type.as_str());
                let existing = store.find_relationship(start, end, &rel_type).map(|r| r.id);
                let id = match existing {
                    Some(id) => {
                        for (k, v) in updates {
                            store.set_relationship_property(id, k, v)?;
                        }
                        id
                    }
                    None => store.create_relationship_with_properties(start, end, rel_type, updates)?,
                };

                let rel = store
                    .get_relationship(id)
                    .cloned()
                    .ok_or(BackendError::Graph(crate::graph::GraphError::RelationshipNotFound(id)))?;
                Ok(Some(Record::new().with(columns::REL, Value::Relationship(rel))))
            }
            MergeSpec::SetNodeProperties { node_param, set } => {
                let id = node_id_param(params, node_param)?;
                let updates = resolve_set(set, params).ok_or_else(|| first_missing(set, params))?;
                if !store.has_node(id) {
                    return Ok(None);
                }
                for (k, v) in updates {
                    store.set_node_property(id, k, v)?;
                }

                let node = store
                    .get_node(id)
                    .cloned()
                    .ok_or(BackendError::Graph(crate::graph::GraphError::NodeNotFound(id)))?;
                Ok(Some(Record::new().with(columns::NODE, Value::Node(node))))
            }
            MergeSpec::DeleteNode { node_param } => {
                let id = node_id_param(params, node_param)?;
                if !store.has_node(id) {
                    return Ok(None);
                }
                let node = store.delete_node(id)?;
                debug!("deleted node {}", id);
                Ok(Some(Record::new().with(columns::NODE, Value::Node(node))))
            }
        }
    }

    async fn introspect_procedures(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let mut names: Vec<String> = self
            .installed_procedures()
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_named_computation(
        &self,
        name: &str,
        nodes: &NodePattern,
        relationships: &RelPattern,
    ) -> BackendResult<()> {
        self.require_analytics(procedures::GRAPH_PROJECT)?;
        let nodes = NodeFilter::resolve(nodes, &Params::new())?;
        let rels = RelFilter::new(relationships);

        let store = self.store.read().await;
        self.computations.create(name, &store, &nodes, &rels)
    }

    async fn drop_named_computation(&self, name: &str) -> BackendResult<()> {
        self.require_analytics(procedures::GRAPH_DROP)?;
        self.computations.remove(name)
    }

    async fn run_named_algorithm(
        &self,
        algorithm: &str,
        computation: &str,
        params: &Params,
    ) -> BackendResult<Vec<Record>> {
        self.require_analytics(algorithm)?;
        let projection = self.computations.get(computation)?;
        let store = self.store.read().await;
        projection.run(algorithm, params, &store)
    }
}
