//! Result records returned by backends
//!
//! A record binds column names to values. The typed getters fail with
//! `BackendError::MissingColumn` / `BackendError::UnexpectedValue` so the engine can report a
//! malformed backend answer instead of panicking.

use super::{BackendError, BackendResult};
use crate::graph::{Node, Path, PropertyValue, Relationship};
use std::collections::HashMap;

/// A single result row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Column bindings (column name -> value)
    bindings: HashMap<String, Value>,
}

/// Values a backend can bind to a column
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Node(Node),
    Relationship(Relationship),
    Path(Path),
    Property(PropertyValue),
    List(Vec<Value>),
    Null,
}

impl Record {
    /// Create a new empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style bind
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.bind(column, value);
        self
    }

    /// Bind a column to a value
    pub fn bind(&mut self, column: impl Into<String>, value: Value) {
        self.bindings.insert(column.into(), value);
    }

    /// Get a bound value
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.bindings.get(column)
    }

    /// Check if a column is bound
    pub fn has(&self, column: &str) -> bool {
        self.bindings.contains_key(column)
    }

    fn require(&self, column: &str) -> BackendResult<&Value> {
        self.bindings
            .get(column)
            .ok_or_else(|| BackendError::MissingColumn(column.to_string()))
    }

    pub fn node(&self, column: &str) -> BackendResult<&Node> {
        let value = self.require(column)?;
        value.as_node().ok_or_else(|| value.unexpected(column, "node"))
    }

    pub fn relationship(&self, column: &str) -> BackendResult<&Relationship> {
        let value = self.require(column)?;
        value
            .as_relationship()
            .ok_or_else(|| value.unexpected(column, "relationship"))
    }

    pub fn path(&self, column: &str) -> BackendResult<&Path> {
        let value = self.require(column)?;
        value.as_path().ok_or_else(|| value.unexpected(column, "path"))
    }

    pub fn property(&self, column: &str) -> BackendResult<&PropertyValue> {
        let value = self.require(column)?;
        value.as_property().ok_or_else(|| value.unexpected(column, "property"))
    }

    pub fn list(&self, column: &str) -> BackendResult<&[Value]> {
        let value = self.require(column)?;
        value.as_list().ok_or_else(|| value.unexpected(column, "list"))
    }

    /// Column as a string property
    pub fn string(&self, column: &str) -> BackendResult<&str> {
        let value = self.require(column)?;
        value
            .as_property()
            .and_then(PropertyValue::as_string)
            .ok_or_else(|| value.unexpected(column, "string"))
    }

    /// Column as a numeric property, integers widened
    pub fn float(&self, column: &str) -> BackendResult<f64> {
        let value = self.require(column)?;
        value
            .as_property()
            .and_then(PropertyValue::as_float)
            .ok_or_else(|| value.unexpected(column, "number"))
    }

    pub fn integer(&self, column: &str) -> BackendResult<i64> {
        let value = self.require(column)?;
        value
            .as_property()
            .and_then(PropertyValue::as_integer)
            .ok_or_else(|| value.unexpected(column, "integer"))
    }
}

impl Value {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Value::Relationship(rel) => Some(rel),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyValue> {
        match self {
            Value::Property(prop) => Some(prop),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Node(_) => "node",
            Value::Relationship(_) => "relationship",
            Value::Path(_) => "path",
            Value::Property(_) => "property",
            Value::List(_) => "list",
            Value::Null => "null",
        }
    }

    fn unexpected(&self, column: &str, expected: &'static str) -> BackendError {
        BackendError::UnexpectedValue {
            column: column.to_string(),
            expected,
            found: self.type_name(),
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        Value::Property(value)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<Relationship> for Value {
    fn from(rel: Relationship) -> Self {
        Value::Relationship(rel)
    }
}

impl From<Path> for Value {
    fn from(path: Path) -> Self {
        Value::Path(path)
    }
}
