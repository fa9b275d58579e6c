//! Error types for the quarry engine.

use crate::ClassName;
use thiserror::Error;

/// A literal could not be parsed into a [`Value`](crate::Value).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} literal '{input}': {reason}")]
pub struct ValueParseError {
    /// Value kind that was being parsed (e.g. "decimal")
    pub kind: &'static str,
    /// The rejected input
    pub input: String,
    /// Parser message
    pub reason: String,
}

impl ValueParseError {
    pub(crate) fn new(kind: &'static str, input: &str, reason: impl ToString) -> Self {
        Self {
            kind,
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// All possible errors from the quarry engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    // Value errors
    #[error(transparent)]
    ValueParse(#[from] ValueParseError),

    #[error("invalid geo shape: {0}")]
    InvalidGeoShape(String),

    #[error("invalid external value: {0}")]
    InvalidExternalValue(String),

    // Construction errors
    #[error("cannot apply keypath '{segment}' to {expression}")]
    NotAKeyPath { segment: String, expression: String },

    #[error("cannot apply @{aggregate} to '{key_path}': keypath does not traverse a collection")]
    AggregateWithoutCollection { aggregate: String, key_path: String },

    #[error("comparing two collection keypaths is not permitted: {lhs} {op} {rhs}")]
    CollectionComparison {
        lhs: String,
        op: String,
        rhs: String,
    },

    // Compile errors
    #[error("keypath cannot be used as a standalone predicate: {0}")]
    DanglingKeyPath(String),

    #[error("subqueries do not support map subscripts")]
    SubqueryMapSubscript,

    #[error("subqueries must contain a keypath starting with a collection")]
    SubqueryWithoutCollection,

    #[error("subquery iterates '{first}' but also references collection '{second}'")]
    SubqueryMultipleCollections { first: String, second: String },

    // Schema errors
    #[error("object type not found: {0}")]
    ClassNotFound(ClassName),

    #[error("property '{property}' not found on '{class}'")]
    PropertyNotFound { class: ClassName, property: String },

    #[error("property '{property}' on '{class}' is not a link and has no properties")]
    NotALink { class: ClassName, property: String },

    // Boundary errors
    #[error("invalid predicate document: {0}")]
    InvalidDocument(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
