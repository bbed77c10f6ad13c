//! Typed pattern specs: the query shapes the engine hands to a backend
//!
//! Structure (labels, relationship types, property keys) is carried as [`Identifier`]s.
//! Data (ids, property values, search needles) is referenced by parameter name and bound in
//! [`Params`], so no caller-supplied value ever becomes part of query structure.

use crate::graph::{Direction, NodeId, PropertyMap, PropertyValue};
use crate::sanitize::Identifier;
use serde::Serialize;
use std::collections::BTreeMap;

/// Named parameter values bound alongside a spec
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, PropertyValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style bind
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.bind(name, value);
        self
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Bind a single node id
    pub fn with_node(self, name: impl Into<String>, id: NodeId) -> Self {
        self.with(name, id.as_u64() as i64)
    }

    /// Bind a set of node ids as an integer array
    pub fn with_nodes(self, name: impl Into<String>, ids: impl IntoIterator<Item = NodeId>) -> Self {
        let ids: Vec<PropertyValue> = ids
            .into_iter()
            .map(|id| PropertyValue::Integer(id.as_u64() as i64))
            .collect();
        self.with(name, ids)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How a property filter compares the stored value with the bound one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equals,
    /// Substring match on string properties
    Contains,
}

/// `node[key] <op> $param`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyFilter {
    pub key: Identifier,
    pub op: FilterOp,
    pub param: String,
}

/// Which nodes a pattern position may bind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodePattern {
    /// Every label must be present
    pub labels: Vec<Identifier>,
    /// Parameter holding one id (integer) or several (integer array)
    pub id_param: Option<String>,
    pub filters: Vec<PropertyFilter>,
}

impl NodePattern {
    /// Any node
    pub fn any() -> Self {
        Self::default()
    }

    /// Nodes carrying `label`, or any node when `None`
    pub fn scoped(label: Option<&Identifier>) -> Self {
        NodePattern {
            labels: label.into_iter().cloned().collect(),
            ..Self::default()
        }
    }

    /// Nodes whose id is bound by `param`
    pub fn by_id(param: impl Into<String>) -> Self {
        NodePattern {
            id_param: Some(param.into()),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, key: Identifier, op: FilterOp, param: impl Into<String>) -> Self {
        self.filters.push(PropertyFilter {
            key,
            op,
            param: param.into(),
        });
        self
    }
}

/// Which relationships a hop may follow
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelPattern {
    /// Allowed types; empty means any type
    pub types: Vec<Identifier>,
    pub direction: Direction,
}

impl RelPattern {
    /// Any type, either orientation
    pub fn undirected() -> Self {
        Self::default()
    }

    pub fn new(types: Vec<Identifier>, direction: Direction) -> Self {
        RelPattern { types, direction }
    }
}

/// Read-only pattern matches understood by a backend.
///
/// Column names of the returned records are listed in [`crate::backend::columns`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchSpec {
    /// Matching nodes ascending by id. Columns: `node`.
    Nodes { pattern: NodePattern, limit: Option<usize> },

    /// One hop `from -[rel]- to`, direction relative to `from`, ordered by (source id,
    /// relationship id). Columns: `source`, `rel`, `target`.
    Hop {
        from: NodePattern,
        rel: RelPattern,
        to: NodePattern,
        limit: Option<usize>,
    },

    /// Simple paths of length `1..=max_hops` in non-decreasing length. Columns: `path`.
    Paths {
        from: NodePattern,
        to: NodePattern,
        rel: RelPattern,
        max_hops: usize,
        limit: Option<usize>,
    },

    /// At most one shortest path by hop count. Columns: `path`.
    ShortestPath {
        from: NodePattern,
        to: NodePattern,
        rel: RelPattern,
        max_hops: usize,
    },

    /// Single-call neighborhood: `max_depth` undirected levels, `limit` rows per level.
    /// One record with columns `nodes` and `relationships`. Requires the path-expansion
    /// procedure.
    SubgraphAll {
        start: NodePattern,
        max_depth: usize,
        limit: Option<usize>,
    },

    /// Relationships whose endpoints both match `nodes`, ascending by id. Columns: `rel`.
    Between { nodes: NodePattern, rel: RelPattern },

    /// Labels in use, sorted. Columns: `label`.
    Labels,

    /// Relationship types in use, sorted. Columns: `type`.
    RelationshipTypes,

    /// Distinct non-null values of `key` over matching nodes, in ascending node-id order of
    /// first occurrence. Columns: `value`.
    DistinctValues { pattern: NodePattern, key: Identifier },
}

/// A `SET target[key] = $param` item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetProperty {
    pub key: Identifier,
    pub param: String,
}

/// Write operations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeSpec {
    /// Merge on `label` + `key = $key_param`, then apply `set`. Columns: `node`.
    Node {
        label: Identifier,
        key: Identifier,
        key_param: String,
        set: Vec<SetProperty>,
    },

    /// Match both endpoints by id, merge `start -[rel_type]-> end`, then apply `set`.
    /// Yields no record when an endpoint is missing. Columns: `rel`.
    Relationship {
        rel_type: Identifier,
        start_param: String,
        end_param: String,
        set: Vec<SetProperty>,
    },

    /// Apply `set` to the node whose id is bound by `node_param`, leaving other properties
    /// alone. Yields no record when the node is missing. Columns: `node`.
    SetNodeProperties { node_param: String, set: Vec<SetProperty> },

    /// Delete the node whose id is bound by `node_param`. Fails while the node still has
    /// relationships. Yields no record when the node is missing. Columns: `node`, holding the
    /// deleted node.
    DeleteNode { node_param: String },
}

/// Turn validated `(key, value)` pairs into `SetProperty` items plus their bound values.
///
/// Parameter names are `{prefix}{index}` so keys never appear in parameter names.
pub fn bind_properties(
    properties: Vec<(Identifier, PropertyValue)>,
    prefix: &str,
    params: &mut Params,
) -> Vec<SetProperty> {
    properties
        .into_iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let param = format!("{prefix}{i}");
            params.bind(param.clone(), value);
            SetProperty { key, param }
        })
        .collect()
}

/// Resolve a set-list against bound params, for backends applying writes
pub fn resolve_set(set: &[SetProperty], params: &Params) -> Option<PropertyMap> {
    set.iter()
        .map(|item| {
            params
                .get(&item.param)
                .map(|value| (item.key.as_str().to_string(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::IdentifierKind;

    fn key(raw: &str) -> Identifier {
        Identifier::parse(raw, IdentifierKind::PropertyKey).unwrap()
    }

    #[test]
    fn test_node_id_params() {
        let params = Params::new()
            .with_node("start", NodeId::new(3))
            .with_nodes("frontier", [NodeId::new(1), NodeId::new(2)]);

        assert_eq!(params.get("start"), Some(&PropertyValue::Integer(3)));
        assert_eq!(params.get("frontier").and_then(|v| v.as_array()).map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_bind_properties_uses_positional_names() {
        let mut params = Params::new();
        let set = bind_properties(
            vec![(key("name"), "Tôn Quyền".into()), (key("faction"), "Đông Ngô".into())],
            "p",
            &mut params,
        );

        assert_eq!(set[0].param, "p0");
        assert_eq!(set[1].key.as_str(), "faction");
        assert_eq!(params.len(), 2);

        let resolved = resolve_set(&set, &params).unwrap();
        assert_eq!(resolved["name"].as_string(), Some("Tôn Quyền"));
        assert!(resolve_set(&set, &Params::new()).is_none());
    }

    #[test]
    fn test_scoped_pattern() {
        let label = Identifier::parse("Character", IdentifierKind::Label).unwrap();
        assert_eq!(NodePattern::scoped(Some(&label)).labels, vec![label]);
        assert!(NodePattern::scoped(None).labels.is_empty());
    }

    #[test]
    fn test_spec_serializes_with_kind_tag() {
        let spec = MatchSpec::Nodes {
            pattern: NodePattern::by_id("id"),
            limit: Some(1),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "nodes");
        assert_eq!(json["pattern"]["id_param"], "id");
    }
}
