//! Traversal operations: expansion, subgraphs, neighborhoods, paths, search, schema
//!
//! Multi-hop work is one loop of single-hop matches: each level matches from the current
//! frontier, merges the rows into the fragment, and the newly reached nodes become the next
//! frontier.

use super::{EngineError, EngineResult, GraphEngine, Phase, Selector};
use crate::backend::{columns, procedures, Record};
use crate::graph::{Direction, GraphFragment, Label, Node, NodeId, Path, RelType};
use crate::pattern::{FilterOp, MatchSpec, NodePattern, Params, RelPattern};
use crate::sanitize::{Identifier, IdentifierKind};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// How a shortest-path answer was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathEngine {
    /// Single BFS shortest path
    Native,
    /// Yen's k-shortest paths via the analytics extension
    KShortest,
}

/// Shortest-path result; `engine` shows whether a `k > 1` request degraded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortestPaths {
    pub paths: Vec<Path>,
    pub engine: PathEngine,
    /// Requested number of paths
    pub k: usize,
}

/// One page of a neighborhood listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborPage {
    #[serde(flatten)]
    pub fragment: GraphFragment,
    pub offset: usize,
    pub limit: usize,
    /// Nodes in the whole neighborhood before paging
    pub total: usize,
}

pub(super) fn decode<T>(result: crate::backend::BackendResult<T>) -> EngineResult<T> {
    result.map_err(|e| EngineError::backend(Phase::Match, e))
}

impl GraphEngine {
    pub(crate) async fn run_match(&self, spec: &MatchSpec, params: &Params) -> EngineResult<Vec<Record>> {
        self.backend
            .match_pattern(spec, params)
            .await
            .map_err(|e| EngineError::backend(Phase::Match, e))
    }

    /// Grow `fragment` from `start` for up to `levels` hops along `rel`
    async fn expand_levels(
        &self,
        fragment: &mut GraphFragment,
        start: NodeId,
        levels: usize,
        rel: &RelPattern,
        limit: Option<usize>,
    ) -> EngineResult<()> {
        let mut visited: HashSet<NodeId> = fragment.node_ids().into_iter().collect();
        let mut frontier = vec![start];

        for level in 1..=levels {
            if frontier.is_empty() {
                break;
            }

            let spec = MatchSpec::Hop {
                from: NodePattern::by_id("frontier"),
                rel: rel.clone(),
                to: NodePattern::any(),
                limit,
            };
            let params = Params::new().with_nodes("frontier", frontier.iter().copied());
            let records = self.run_match(&spec, &params).await?;

            let mut next_frontier = Vec::new();
            for record in &records {
                let target = decode(record.node(columns::TARGET))?;
                let relationship = decode(record.relationship(columns::REL))?;
                if visited.insert(target.id) {
                    next_frontier.push(target.id);
                }
                fragment.insert_node(target.clone());
                fragment.insert_relationship(relationship.clone());
            }

            debug!(
                "level {} from {} frontier nodes: {} rows, {} new nodes",
                level,
                frontier.len(),
                records.len(),
                next_frontier.len()
            );
            frontier = next_frontier;
        }

        Ok(())
    }

    /// Nodes reachable from `start` within `hops`, plus every relationship traversed.
    ///
    /// Type-filter entries that sanitize to nothing are dropped; if none survive, any type is
    /// followed.
    ///
    /// `limit` caps the relationship rows fetched at each hop, not the number of distinct
    /// nodes in the result: a fragment holds at most `1 + hops * limit` nodes, and fewer when
    /// several rows reach the same node.
    pub async fn expand(
        &self,
        start: &Selector,
        hops: usize,
        direction: Direction,
        type_filter: &[&str],
        limit: usize,
    ) -> EngineResult<GraphFragment> {
        if hops < 1 {
            return Err(EngineError::InvalidArgument("hops must be at least 1".to_string()));
        }

        let types: Vec<Identifier> = type_filter
            .iter()
            .filter_map(|raw| {
                let parsed = Identifier::try_parse(raw, IdentifierKind::RelationshipType);
                if parsed.is_none() {
                    debug!("dropping unusable relationship type filter {:?}", raw);
                }
                parsed
            })
            .collect();

        let Some(start) = self.resolve(start).await? else {
            return Ok(GraphFragment::new());
        };

        let mut fragment = GraphFragment::new();
        let start_id = start.id;
        fragment.insert_node(start);
        self.expand_levels(&mut fragment, start_id, hops, &RelPattern::new(types, direction), Some(limit))
            .await?;
        Ok(fragment)
    }

    /// One outgoing hop along a single relationship type. An unusable type is an error.
    pub async fn filter_relation(&self, start: &Selector, rel_type: &str, limit: usize) -> EngineResult<GraphFragment> {
        let rel_type = Identifier::relationship_type(rel_type)?;

        let Some(start) = self.resolve(start).await? else {
            return Ok(GraphFragment::new());
        };

        let mut fragment = GraphFragment::new();
        let start_id = start.id;
        fragment.insert_node(start);
        let rel = RelPattern::new(vec![rel_type], Direction::Outgoing);
        self.expand_levels(&mut fragment, start_id, 1, &rel, Some(limit)).await?;
        Ok(fragment)
    }

    /// Undirected neighborhood of depth `max_depth`, `limit` rows per level.
    ///
    /// Uses the single-call subgraph procedure when installed and falls back to the
    /// level-by-level walk (same result) when it is absent or fails.
    pub async fn subgraph(&self, start: &Selector, max_depth: usize, limit: usize) -> EngineResult<GraphFragment> {
        let Some(start) = self.resolve(start).await? else {
            return Ok(GraphFragment::new());
        };

        if max_depth > 0 && self.capabilities.supports_subgraph_procedure().await {
            match self.subgraph_fast(&start, max_depth, limit).await {
                Ok(fragment) => return Ok(fragment),
                Err(e) => warn!(
                    "{} failed for {}, using per-level expansion: {}",
                    procedures::SUBGRAPH_ALL,
                    start.id,
                    e
                ),
            }
        }

        let mut fragment = GraphFragment::new();
        let start_id = start.id;
        fragment.insert_node(start);
        self.expand_levels(&mut fragment, start_id, max_depth, &RelPattern::undirected(), Some(limit))
            .await?;
        Ok(fragment)
    }

    async fn subgraph_fast(&self, start: &Node, max_depth: usize, limit: usize) -> EngineResult<GraphFragment> {
        let spec = MatchSpec::SubgraphAll {
            start: NodePattern::by_id("start"),
            max_depth,
            limit: Some(limit),
        };
        let params = Params::new().with_node("start", start.id);
        let records = self.run_match(&spec, &params).await?;

        let mut fragment = GraphFragment::new();
        fragment.insert_node(start.clone());
        for record in &records {
            for value in decode(record.list(columns::NODES))? {
                if let Some(node) = value.as_node() {
                    fragment.insert_node(node.clone());
                }
            }
            for value in decode(record.list(columns::RELATIONSHIPS))? {
                if let Some(rel) = value.as_relationship() {
                    fragment.insert_relationship(rel.clone());
                }
            }
        }
        Ok(fragment)
    }

    /// Nodes within `depth` in discovery order, paged, with the relationships among the page
    pub async fn neighbors(&self, start: &Selector, depth: usize, offset: usize, limit: usize) -> EngineResult<NeighborPage> {
        let empty = |total| NeighborPage {
            fragment: GraphFragment::new(),
            offset,
            limit,
            total,
        };

        let Some(start) = self.resolve(start).await? else {
            return Ok(empty(0));
        };

        let mut reached = GraphFragment::new();
        let start_id = start.id;
        reached.insert_node(start);
        self.expand_levels(
            &mut reached,
            start_id,
            depth,
            &RelPattern::undirected(),
            Some(self.config.default_limit),
        )
        .await?;

        let total = reached.node_count();
        let page: Vec<Node> = reached.nodes().skip(offset).take(limit).cloned().collect();
        if page.is_empty() {
            return Ok(empty(total));
        }

        let spec = MatchSpec::Between {
            nodes: NodePattern::by_id("page"),
            rel: RelPattern::undirected(),
        };
        let params = Params::new().with_nodes("page", page.iter().map(|n| n.id));
        let records = self.run_match(&spec, &params).await?;

        let mut fragment = GraphFragment::new();
        for node in page {
            fragment.insert_node(node);
        }
        for record in &records {
            fragment.insert_relationship(decode(record.relationship(columns::REL))?.clone());
        }

        Ok(NeighborPage {
            fragment,
            offset,
            limit,
            total,
        })
    }

    /// Up to `limit` simple undirected paths of length `1..=max_hops`, shortest first
    pub async fn paths_between(
        &self,
        from: &Selector,
        to: &Selector,
        max_hops: usize,
        limit: usize,
    ) -> EngineResult<Vec<Path>> {
        if max_hops < 1 {
            return Err(EngineError::InvalidArgument("max_hops must be at least 1".to_string()));
        }

        let (Some(from), Some(to)) = (self.resolve(from).await?, self.resolve(to).await?) else {
            return Ok(Vec::new());
        };

        let spec = MatchSpec::Paths {
            from: NodePattern::by_id("from"),
            to: NodePattern::by_id("to"),
            rel: RelPattern::undirected(),
            max_hops,
            limit: Some(limit),
        };
        let params = Params::new().with_node("from", from.id).with_node("to", to.id);
        let records = self.run_match(&spec, &params).await?;

        let mut paths = records
            .iter()
            .map(|record| decode(record.path(columns::PATH)).cloned())
            .collect::<EngineResult<Vec<_>>>()?;
        // Backends enumerate by length already; a stable sort keeps that if one does not
        paths.sort_by_key(Path::len);
        paths.truncate(limit);
        Ok(paths)
    }

    /// Shortest path(s) between two nodes.
    ///
    /// Both engines walk the same graph: every node, relationships in either direction, at
    /// most `shortest_path_max_hops` hops. `k = 1` is a BFS; `k > 1` uses Yen's algorithm when
    /// analytics are installed and otherwise degrades to one path. `engine` in the result
    /// says which happened.
    pub async fn shortest_path(&self, from: &Selector, to: &Selector, k: usize) -> EngineResult<ShortestPaths> {
        if k < 1 {
            return Err(EngineError::InvalidArgument("k must be at least 1".to_string()));
        }

        let (Some(from), Some(to)) = (self.resolve(from).await?, self.resolve(to).await?) else {
            return Ok(ShortestPaths {
                paths: Vec::new(),
                engine: PathEngine::Native,
                k,
            });
        };

        if k > 1 {
            if self.capabilities.supports_advanced_centrality().await {
                let paths = self.k_shortest(from.id, to.id, k).await?;
                return Ok(ShortestPaths {
                    paths,
                    engine: PathEngine::KShortest,
                    k,
                });
            }
            debug!("k={} requested without analytics, returning a single shortest path", k);
        }

        let spec = MatchSpec::ShortestPath {
            from: NodePattern::by_id("from"),
            to: NodePattern::by_id("to"),
            rel: RelPattern::undirected(),
            max_hops: self.config.shortest_path_max_hops,
        };
        let params = Params::new().with_node("from", from.id).with_node("to", to.id);
        let records = self.run_match(&spec, &params).await?;

        let paths = records
            .first()
            .map(|record| decode(record.path(columns::PATH)).cloned())
            .transpose()?
            .into_iter()
            .collect();

        Ok(ShortestPaths {
            paths,
            engine: PathEngine::Native,
            k,
        })
    }

    async fn k_shortest(&self, from: NodeId, to: NodeId, k: usize) -> EngineResult<Vec<Path>> {
        let params = Params::new()
            .with_node("source", from)
            .with_node("target", to)
            .with("k", k as i64);
        let (_, records) = self
            .run_in_computation(
                "yens",
                &NodePattern::any(),
                &RelPattern::undirected(),
                procedures::YENS_SHORTEST_PATHS,
                &params,
            )
            .await?;

        let mut ranked = records
            .iter()
            .map(|record| {
                let index = record.integer(columns::INDEX).unwrap_or(i64::MAX);
                let path = record.path(columns::PATH).cloned();
                path.map(|p| (index, p))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::backend(Phase::Algorithm, e))?;
        ranked.retain(|(_, path)| path.len() <= self.config.shortest_path_max_hops);
        ranked.sort_by_key(|(index, path)| (path.len(), *index));

        Ok(ranked.into_iter().take(k).map(|(_, path)| path).collect())
    }

    /// In-scope nodes whose name property contains `needle`, ascending by id
    pub async fn search(&self, needle: &str, limit: usize) -> EngineResult<Vec<Node>> {
        let spec = MatchSpec::Nodes {
            pattern: self
                .scope_pattern()
                .with_filter(self.name_key.clone(), FilterOp::Contains, "needle"),
            limit: Some(limit),
        };
        let params = Params::new().with("needle", needle);
        let records = self.run_match(&spec, &params).await?;

        records
            .iter()
            .map(|record| decode(record.node(columns::NODE)).cloned())
            .collect()
    }

    /// Labels in use, sorted
    pub async fn labels(&self) -> EngineResult<Vec<Label>> {
        let records = self.run_match(&MatchSpec::Labels, &Params::new()).await?;
        let mut labels = records
            .iter()
            .map(|record| decode(record.string(columns::LABEL)).map(Label::new))
            .collect::<EngineResult<Vec<_>>>()?;
        labels.sort();
        Ok(labels)
    }

    /// Relationship types in use, sorted
    pub async fn relationship_types(&self) -> EngineResult<Vec<RelType>> {
        let records = self.run_match(&MatchSpec::RelationshipTypes, &Params::new()).await?;
        let mut types = records
            .iter()
            .map(|record| decode(record.string(columns::TYPE)).map(RelType::new))
            .collect::<EngineResult<Vec<_>>>()?;
        types.sort();
        Ok(types)
    }
}
