//! Centrality: native degree, and PageRank / betweenness through the analytics extension

use super::traversal::decode;
use super::{EngineError, EngineResult, GraphEngine, Phase};
use crate::backend::{columns, procedures, Record};
use crate::graph::{Direction, Node, NodeId};
use crate::pattern::{MatchSpec, NodePattern, Params, RelPattern};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Degree of one node: distinct incident relationships, any direction or type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeScore {
    pub node_id: NodeId,
    pub name: String,
    pub score: u64,
}

/// Score of one node from an advanced algorithm
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityScore {
    pub node_id: NodeId,
    pub name: String,
    pub score: f64,
}

/// Algorithms that need the analytics extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CentralityKind {
    PageRank,
    Betweenness,
}

impl CentralityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CentralityKind::PageRank => "pagerank",
            CentralityKind::Betweenness => "betweenness",
        }
    }

    fn procedure(&self) -> &'static str {
        match self {
            CentralityKind::PageRank => procedures::PAGE_RANK,
            CentralityKind::Betweenness => procedures::BETWEENNESS,
        }
    }
}

impl fmt::Display for CentralityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advanced centrality result, naming the computation it ran in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedCentrality {
    pub kind: CentralityKind,
    pub computation: String,
    pub scores: Vec<CentralityScore>,
}

/// Centrality method requested by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralityMethod {
    Degree,
    Advanced(CentralityKind),
}

impl CentralityMethod {
    /// Parse `degree`, `pagerank` or `betweenness`, ignoring case
    pub fn parse(raw: &str) -> EngineResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "degree" => Ok(CentralityMethod::Degree),
            "pagerank" => Ok(CentralityMethod::Advanced(CentralityKind::PageRank)),
            "betweenness" => Ok(CentralityMethod::Advanced(CentralityKind::Betweenness)),
            _ => Err(EngineError::InvalidArgument(format!(
                "unknown centrality method {:?} (expected degree, pagerank or betweenness)",
                raw
            ))),
        }
    }
}

/// Result of `GraphEngine::centrality`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CentralityReport {
    Degree(Vec<DegreeScore>),
    Advanced(AdvancedCentrality),
}

/// Descending score, then ascending name, then ascending id
fn rank(a: (f64, &str, NodeId), b: (f64, &str, NodeId)) -> Ordering {
    b.0.total_cmp(&a.0)
        .then_with(|| a.1.cmp(b.1))
        .then_with(|| a.2.cmp(&b.2))
}

impl GraphEngine {
    /// Degree centrality over the configured scope, highest first
    pub async fn centrality_degree(&self, limit: usize) -> EngineResult<Vec<DegreeScore>> {
        let nodes = self
            .run_match(
                &MatchSpec::Nodes {
                    pattern: self.scope_pattern(),
                    limit: None,
                },
                &Params::new(),
            )
            .await?
            .iter()
            .map(|record| decode(record.node(columns::NODE)).cloned())
            .collect::<EngineResult<Vec<Node>>>()?;

        let hops = self
            .run_match(
                &MatchSpec::Hop {
                    from: self.scope_pattern(),
                    rel: RelPattern::undirected(),
                    to: NodePattern::any(),
                    limit: None,
                },
                &Params::new(),
            )
            .await?;

        let mut incident: HashMap<NodeId, HashSet<u64>> = HashMap::new();
        for record in &hops {
            let source = decode(record.node(columns::SOURCE))?;
            let rel = decode(record.relationship(columns::REL))?;
            incident.entry(source.id).or_default().insert(rel.id.as_u64());
        }

        let mut scores: Vec<DegreeScore> = nodes
            .into_iter()
            .map(|node| DegreeScore {
                node_id: node.id,
                name: node.display_name(self.name_key()),
                score: incident.get(&node.id).map_or(0, |rels| rels.len() as u64),
            })
            .collect();

        scores.sort_by(|a, b| {
            rank(
                (a.score as f64, a.name.as_str(), a.node_id),
                (b.score as f64, b.name.as_str(), b.node_id),
            )
        });
        scores.truncate(limit);
        debug!("degree centrality over {} relationships", hops.len());
        Ok(scores)
    }

    /// PageRank or betweenness inside a named computation that is dropped on every exit path.
    ///
    /// Fails with `UnsupportedOperation` when the analytics extension is absent; degree is
    /// never substituted.
    pub async fn centrality_advanced(&self, kind: CentralityKind, limit: usize) -> EngineResult<AdvancedCentrality> {
        if !self.capabilities.supports_advanced_centrality().await {
            return Err(EngineError::UnsupportedOperation(format!(
                "{} centrality requires the advanced analytics capability ({}* procedures)",
                kind, self.config.analytics_prefix
            )));
        }

        let (computation, records) = self
            .run_in_computation(
                kind.as_str(),
                &self.scope_pattern(),
                &RelPattern::new(Vec::new(), Direction::Outgoing),
                kind.procedure(),
                &Params::new(),
            )
            .await?;

        let mut scores = records
            .iter()
            .map(|record| self.score_from(record))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::backend(Phase::Algorithm, e))?;

        scores.sort_by(|a, b| rank((a.score, a.name.as_str(), a.node_id), (b.score, b.name.as_str(), b.node_id)));
        scores.truncate(limit);
        info!("{} over {} nodes in computation {}", kind, records.len(), computation);

        Ok(AdvancedCentrality {
            kind,
            computation,
            scores,
        })
    }

    fn score_from(&self, record: &Record) -> crate::backend::BackendResult<CentralityScore> {
        let node = record.node(columns::NODE)?;
        Ok(CentralityScore {
            node_id: node.id,
            name: node.display_name(self.name_key()),
            score: record.float(columns::SCORE)?,
        })
    }

    /// Dispatch on a parsed method
    pub async fn centrality(&self, method: CentralityMethod, limit: usize) -> EngineResult<CentralityReport> {
        match method {
            CentralityMethod::Degree => self.centrality_degree(limit).await.map(CentralityReport::Degree),
            CentralityMethod::Advanced(kind) => self
                .centrality_advanced(kind, limit)
                .await
                .map(CentralityReport::Advanced),
        }
    }
}
