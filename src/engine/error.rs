//! Engine error taxonomy

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::sanitize::IdentifierKind;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which adapter call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Match,
    Merge,
    Introspect,
    Projection,
    Algorithm,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Match => "match",
            Phase::Merge => "merge",
            Phase::Introspect => "introspect",
            Phase::Projection => "projection",
            Phase::Algorithm => "algorithm",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Coarse error category for callers mapping errors to responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    InvalidIdentifier,
    UnsupportedOperation,
    NotFound,
    BackendFailure,
}

impl ErrorKind {
    /// `InvalidIdentifier` is a refinement of `InvalidArgument`
    pub fn is_invalid_argument(self) -> bool {
        matches!(self, ErrorKind::InvalidArgument | ErrorKind::InvalidIdentifier)
    }
}

/// Errors returned by `GraphEngine` operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid {kind}: {input:?} is not a usable identifier")]
    InvalidIdentifier { kind: IdentifierKind, input: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend failure during {phase}: {source}")]
    BackendFailure {
        phase: Phase,
        #[source]
        source: BackendError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn backend(phase: Phase, source: BackendError) -> Self {
        EngineError::BackendFailure { phase, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidArgument(_) | EngineError::Config(_) => ErrorKind::InvalidArgument,
            EngineError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            EngineError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::BackendFailure { .. } => ErrorKind::BackendFailure,
        }
    }

    /// The failing phase, for backend failures
    pub fn phase(&self) -> Option<Phase> {
        match self {
            EngineError::BackendFailure { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
