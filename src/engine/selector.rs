//! Node selectors

use super::{EngineError, EngineResult, GraphEngine, Phase};
use crate::backend::columns;
use crate::graph::{Node, NodeId, PropertyValue};
use crate::pattern::{FilterOp, MatchSpec, NodePattern, Params};
use crate::sanitize::Identifier;
use serde::Serialize;
use std::fmt;

/// A caller-supplied reference to one node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Stored identity
    Id(NodeId),
    /// First node (ascending id) whose `key` property equals `value`
    Property { key: String, value: PropertyValue },
}

impl Selector {
    pub fn id(id: impl Into<NodeId>) -> Self {
        Selector::Id(id.into())
    }

    pub fn property(key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Selector::Property {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `id:<n>` / `#<n>`, `key=value`, or a bare value matched against `default_key`.
    ///
    /// In `key=value` form an integer-looking value is matched as an integer.
    pub fn parse(raw: &str, default_key: &str) -> EngineResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EngineError::InvalidArgument("empty node selector".to_string()));
        }

        if let Some(id) = raw.strip_prefix("id:").or_else(|| raw.strip_prefix('#')) {
            let id: u64 = id
                .trim()
                .parse()
                .map_err(|_| EngineError::InvalidArgument(format!("{raw:?} is not a numeric node id")))?;
            return Ok(Selector::Id(NodeId::new(id)));
        }

        if let Some((key, value)) = raw.split_once('=') {
            let (key, value) = (key.trim(), value.trim());
            if !key.is_empty() {
                let value = match value.parse::<i64>() {
                    Ok(i) => PropertyValue::Integer(i),
                    Err(_) => PropertyValue::String(value.to_string()),
                };
                return Ok(Selector::Property {
                    key: key.to_string(),
                    value,
                });
            }
        }

        Ok(Selector::property(default_key, raw))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "#{}", id),
            Selector::Property { key, value } => write!(f, "{}={}", key, value),
        }
    }
}

impl GraphEngine {
    /// Resolve a selector to its node; several matches resolve to the lowest id.
    ///
    /// Property selectors are scoped by the configured node label, id selectors are not.
    pub async fn resolve(&self, selector: &Selector) -> EngineResult<Option<Node>> {
        let (pattern, params) = match selector {
            Selector::Id(id) => (NodePattern::by_id("id"), Params::new().with_node("id", *id)),
            Selector::Property { key, value } => {
                let key = Identifier::property_key(key)?;
                (
                    self.scope_pattern().with_filter(key, FilterOp::Equals, "value"),
                    Params::new().with("value", value.clone()),
                )
            }
        };

        let spec = MatchSpec::Nodes {
            pattern,
            limit: Some(1),
        };
        let records = self
            .backend
            .match_pattern(&spec, &params)
            .await
            .map_err(|e| EngineError::backend(Phase::Match, e))?;

        match records.first() {
            Some(record) => record
                .node(columns::NODE)
                .cloned()
                .map(Some)
                .map_err(|e| EngineError::backend(Phase::Match, e)),
            None => Ok(None),
        }
    }
}
