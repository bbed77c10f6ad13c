//! Writes: merges on nodes by label + key and on relationships by endpoints + type, plus
//! property updates and deletes on an existing node

use super::{EngineError, EngineResult, GraphEngine, Phase, Selector};
use crate::backend::{columns, BackendError};
use crate::graph::{Node, NodeId, PropertyMap, PropertyValue, Relationship};
use crate::pattern::{bind_properties, MergeSpec, Params};
use crate::sanitize::Identifier;
use tracing::debug;

/// Validate every key up front; one bad key rejects the whole map
fn validated(properties: PropertyMap) -> EngineResult<Vec<(Identifier, PropertyValue)>> {
    properties
        .into_iter()
        .map(|(key, value)| Ok((Identifier::property_key(&key)?, value)))
        .collect()
}

impl GraphEngine {
    async fn run_merge(&self, spec: &MergeSpec, params: &Params) -> EngineResult<Option<crate::backend::Record>> {
        self.backend
            .create_or_merge(spec, params)
            .await
            .map_err(|e| EngineError::backend(Phase::Merge, e))
    }

    /// Create or update the node with `label` whose `key_property` equals
    /// `properties[key_property]`. Supplied properties overwrite, others are kept.
    pub async fn upsert_node(&self, label: &str, key_property: &str, properties: PropertyMap) -> EngineResult<Node> {
        let label = Identifier::label(label)?;
        let key = Identifier::property_key(key_property)?;
        let Some(key_value) = properties.get(key.as_str()).cloned() else {
            return Err(EngineError::InvalidArgument(format!(
                "key property {:?} missing from the supplied properties",
                key.as_str()
            )));
        };

        let mut params = Params::new().with("key_value", key_value);
        let set = bind_properties(validated(properties)?, "p", &mut params);
        let spec = MergeSpec::Node {
            label,
            key,
            key_param: "key_value".to_string(),
            set,
        };

        let record = self
            .run_merge(&spec, &params)
            .await?
            .ok_or_else(|| EngineError::backend(Phase::Merge, BackendError::MissingColumn(columns::NODE.to_string())))?;
        let node = record
            .node(columns::NODE)
            .cloned()
            .map_err(|e| EngineError::backend(Phase::Merge, e))?;
        debug!("upserted node {}", node.id);
        Ok(node)
    }

    /// Create or update `from -[rel_type]-> to`; `NotFound` when either endpoint is missing
    pub async fn upsert_relationship(
        &self,
        rel_type: &str,
        from: NodeId,
        to: NodeId,
        properties: PropertyMap,
    ) -> EngineResult<Relationship> {
        let rel_type = Identifier::relationship_type(rel_type)?;

        let mut params = Params::new().with_node("from", from).with_node("to", to);
        let set = bind_properties(validated(properties)?, "p", &mut params);
        let spec = MergeSpec::Relationship {
            rel_type: rel_type.clone(),
            start_param: "from".to_string(),
            end_param: "to".to_string(),
            set,
        };

        let Some(record) = self.run_merge(&spec, &params).await? else {
            return Err(EngineError::NotFound(format!(
                "cannot create {} relationship: node {} or {} does not exist",
                rel_type, from, to
            )));
        };
        let rel = record
            .relationship(columns::REL)
            .cloned()
            .map_err(|e| EngineError::backend(Phase::Merge, e))?;
        debug!("upserted relationship {} ({} -> {})", rel.id, from, to);
        Ok(rel)
    }

    /// Upsert both endpoint nodes by `key`, then the relationship between them.
    ///
    /// All identifiers are checked before anything is written.
    pub async fn connect_by_key(
        &self,
        label: &str,
        key: &str,
        from_value: impl Into<PropertyValue>,
        to_value: impl Into<PropertyValue>,
        rel_type: &str,
        properties: PropertyMap,
    ) -> EngineResult<Relationship> {
        Identifier::label(label)?;
        let key_id = Identifier::property_key(key)?;
        Identifier::relationship_type(rel_type)?;
        validated(properties.clone())?;

        let endpoint = |value: PropertyValue| PropertyMap::from([(key_id.as_str().to_string(), value)]);
        let from = self.upsert_node(label, key, endpoint(from_value.into())).await?;
        let to = self.upsert_node(label, key, endpoint(to_value.into())).await?;
        self.upsert_relationship(rel_type, from.id, to.id, properties).await
    }

    /// Merge `properties` into the node `selector` resolves to; other properties are kept.
    ///
    /// Keys are checked before the lookup. `NotFound` when nothing matches.
    pub async fn update_node(&self, selector: &Selector, properties: PropertyMap) -> EngineResult<Node> {
        let properties = validated(properties)?;
        let node = self.get_node(selector).await?;

        let mut params = Params::new().with_node("id", node.id);
        let set = bind_properties(properties, "p", &mut params);
        let spec = MergeSpec::SetNodeProperties {
            node_param: "id".to_string(),
            set,
        };

        // The node may have been deleted since it was resolved
        let Some(record) = self.run_merge(&spec, &params).await? else {
            return Err(EngineError::NotFound(format!("node {} no longer exists", node.id)));
        };
        let updated = record
            .node(columns::NODE)
            .cloned()
            .map_err(|e| EngineError::backend(Phase::Merge, e))?;
        debug!("updated node {}", updated.id);
        Ok(updated)
    }

    /// Delete the node `selector` resolves to, returning it.
    ///
    /// `NotFound` when nothing matches. A node that still has relationships is refused with a
    /// backend failure and left in place.
    pub async fn delete_node(&self, selector: &Selector) -> EngineResult<Node> {
        let node = self.get_node(selector).await?;

        let params = Params::new().with_node("id", node.id);
        let spec = MergeSpec::DeleteNode {
            node_param: "id".to_string(),
        };
        let Some(record) = self.run_merge(&spec, &params).await? else {
            return Err(EngineError::NotFound(format!("node {} no longer exists", node.id)));
        };
        let deleted = record
            .node(columns::NODE)
            .cloned()
            .map_err(|e| EngineError::backend(Phase::Merge, e))?;
        debug!("deleted node {}", deleted.id);
        Ok(deleted)
    }
}
