//! Identifier sanitizer
//!
//! Labels, relationship types and property keys that come from callers end up as query
//! structure, so they are never bound as parameters. Everything structural passes through
//! here first; an [`Identifier`] can only be obtained from a successful sanitize.

use crate::engine::{EngineError, EngineResult};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// What a structural token will be used as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Label,
    RelationshipType,
    PropertyKey,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentifierKind::Label => "label",
            IdentifierKind::RelationshipType => "relationship type",
            IdentifierKind::PropertyKey => "property key",
        };
        f.write_str(name)
    }
}

static PROPERTY_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

fn strip_to_word_chars(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Normalize `raw` for use as `kind`. An empty result means the input was rejected.
///
/// - relationship types keep `[A-Za-z0-9_]` and are upper-cased
/// - labels keep `[A-Za-z0-9_]` with case preserved
/// - property keys are kept verbatim when they match `^[A-Za-z_][A-Za-z0-9_]*$`
pub fn sanitize_identifier(raw: &str, kind: IdentifierKind) -> String {
    match kind {
        IdentifierKind::RelationshipType => strip_to_word_chars(raw).to_ascii_uppercase(),
        IdentifierKind::Label => strip_to_word_chars(raw),
        IdentifierKind::PropertyKey => {
            if PROPERTY_KEY_RE.is_match(raw) {
                raw.to_string()
            } else {
                String::new()
            }
        }
    }
}

/// A sanitized, non-empty structural token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Sanitize `raw` as `kind`, failing with `InvalidIdentifier` when nothing survives
    pub fn parse(raw: &str, kind: IdentifierKind) -> EngineResult<Self> {
        let clean = sanitize_identifier(raw, kind);
        if clean.is_empty() {
            return Err(EngineError::InvalidIdentifier {
                kind,
                input: raw.to_string(),
            });
        }
        Ok(Identifier(clean))
    }

    /// Lenient variant: `None` instead of an error
    pub fn try_parse(raw: &str, kind: IdentifierKind) -> Option<Self> {
        Self::parse(raw, kind).ok()
    }

    pub fn label(raw: &str) -> EngineResult<Self> {
        Self::parse(raw, IdentifierKind::Label)
    }

    pub fn relationship_type(raw: &str) -> EngineResult<Self> {
        Self::parse(raw, IdentifierKind::RelationshipType)
    }

    pub fn property_key(raw: &str) -> EngineResult<Self> {
        Self::parse(raw, IdentifierKind::PropertyKey)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
