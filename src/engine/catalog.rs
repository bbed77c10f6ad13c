//! Node catalog reads: listing, single lookups, distinct property values

use super::traversal::decode;
use super::{EngineError, EngineResult, GraphEngine, Selector};
use crate::backend::columns;
use crate::graph::{Node, PropertyValue};
use crate::pattern::{MatchSpec, Params};
use crate::sanitize::Identifier;

impl GraphEngine {
    /// In-scope nodes ascending by id, at most `limit`
    pub async fn list_nodes(&self, limit: usize) -> EngineResult<Vec<Node>> {
        let spec = MatchSpec::Nodes {
            pattern: self.scope_pattern(),
            limit: Some(limit),
        };
        let records = self.run_match(&spec, &Params::new()).await?;

        records
            .iter()
            .map(|record| decode(record.node(columns::NODE)).cloned())
            .collect()
    }

    /// The node `selector` resolves to; `NotFound` when nothing matches
    pub async fn get_node(&self, selector: &Selector) -> EngineResult<Node> {
        self.resolve(selector)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("no node matches {}", selector)))
    }

    /// Distinct non-null values of `key` over in-scope nodes, in order of first appearance
    pub async fn distinct_values(&self, key: &str) -> EngineResult<Vec<PropertyValue>> {
        let spec = MatchSpec::DistinctValues {
            pattern: self.scope_pattern(),
            key: Identifier::property_key(key)?,
        };
        let records = self.run_match(&spec, &Params::new()).await?;

        records
            .iter()
            .map(|record| decode(record.property(columns::VALUE)).cloned())
            .collect()
    }
}
