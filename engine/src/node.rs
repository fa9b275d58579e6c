//! The predicate expression tree.
//!
//! A [`QueryNode`] is built once per predicate, handed to the compiler and
//! dropped. Nodes are never mutated after construction: every transformation
//! (appending a key path segment, inserting an aggregate) returns a new node.

use crate::{error::Result, Error, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Binary operators of a [`QueryNode::Comparison`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Or,
    And,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    In,
    Contains,
    BeginsWith,
    EndsWith,
    Like,
}

impl Operator {
    /// Literal token emitted into the filter string.
    pub const fn token(&self) -> &'static str {
        match self {
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::In => "IN",
            Operator::Contains => "CONTAINS",
            Operator::BeginsWith => "BEGINSWITH",
            Operator::EndsWith => "ENDSWITH",
            Operator::Like => "LIKE",
        }
    }

    pub const fn is_logical(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Flags carried by a key path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyPathOptions {
    /// The path passes through a to-many property
    pub is_collection: bool,
    /// The path must be rendered with an `ANY` quantifier
    pub requires_any: bool,
}

impl KeyPathOptions {
    pub const NONE: Self = Self {
        is_collection: false,
        requires_any: false,
    };

    /// Flags for a to-many property.
    pub const COLLECTION: Self = Self {
        is_collection: true,
        requires_any: false,
    };

    /// Flags for a path compared element-wise through a to-many property.
    pub const QUANTIFIED: Self = Self {
        is_collection: true,
        requires_any: true,
    };

    pub const fn union(self, other: Self) -> Self {
        Self {
            is_collection: self.is_collection || other.is_collection,
            requires_any: self.requires_any || other.requires_any,
        }
    }
}

/// String comparison modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StringOptions {
    pub case_insensitive: bool,
    pub diacritic_insensitive: bool,
}

impl StringOptions {
    pub const NONE: Self = Self {
        case_insensitive: false,
        diacritic_insensitive: false,
    };

    pub const CASE_INSENSITIVE: Self = Self {
        case_insensitive: true,
        diacritic_insensitive: false,
    };

    pub const DIACRITIC_INSENSITIVE: Self = Self {
        case_insensitive: false,
        diacritic_insensitive: true,
    };

    /// Bracketed modifier placed right after the operator token.
    pub const fn modifier(&self) -> &'static str {
        match (self.case_insensitive, self.diacritic_insensitive) {
            (false, false) => "",
            (true, false) => "[c]",
            (false, true) => "[d]",
            (true, true) => "[cd]",
        }
    }
}

impl BitOr for StringOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            case_insensitive: self.case_insensitive || rhs.case_insensitive,
            diacritic_insensitive: self.diacritic_insensitive || rhs.diacritic_insensitive,
        }
    }
}

/// Collection aggregates that can be spliced into a key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Min,
    Max,
    Avg,
    Sum,
    Count,
}

impl Aggregate {
    pub const fn token(&self) -> &'static str {
        match self {
            Aggregate::Min => "@min",
            Aggregate::Max => "@max",
            Aggregate::Avg => "@avg",
            Aggregate::Sum => "@sum",
            Aggregate::Count => "@count",
        }
    }
}

/// A node of an unevaluated predicate.
///
/// Equality is structural except for constants, which follow [`Value`]
/// equality: a tree holding a `Null` constant never equals another tree,
/// itself included. Compare such trees through their serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QueryNode {
    /// Path through object properties. Empty segments reference the element itself.
    KeyPath {
        segments: Vec<String>,
        #[serde(default)]
        options: KeyPathOptions,
    },
    Constant {
        value: Value,
    },
    Not {
        child: Box<QueryNode>,
    },
    Comparison {
        op: Operator,
        lhs: Box<QueryNode>,
        rhs: Box<QueryNode>,
        #[serde(default)]
        options: StringOptions,
    },
    /// Inclusive range test.
    Between {
        subject: Box<QueryNode>,
        lower: Box<QueryNode>,
        upper: Box<QueryNode>,
    },
    /// Number of collection elements matching `inner`.
    SubqueryCount {
        inner: Box<QueryNode>,
    },
    #[serde(rename_all = "camelCase")]
    MapSubscript {
        key_path: Box<QueryNode>,
        key: Value,
    },
    #[serde(rename_all = "camelCase")]
    GeoWithin {
        key_path: Box<QueryNode>,
        shape: Box<QueryNode>,
    },
}

impl QueryNode {
    /// Reference to the element being filtered.
    pub fn root() -> Self {
        QueryNode::KeyPath {
            segments: Vec::new(),
            options: KeyPathOptions::NONE,
        }
    }

    pub fn key_path<I, S>(segments: I, options: KeyPathOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryNode::KeyPath {
            segments: segments.into_iter().map(Into::into).collect(),
            options,
        }
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        QueryNode::Constant {
            value: value.into(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: QueryNode) -> Self {
        QueryNode::Not {
            child: Box::new(child),
        }
    }

    /// Build a comparison, rejecting two collection key paths as operands.
    pub fn comparison(
        op: Operator,
        lhs: QueryNode,
        rhs: QueryNode,
        options: StringOptions,
    ) -> Result<Self> {
        check_operands(op, &lhs, &rhs)?;
        Ok(QueryNode::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            options,
        })
    }

    pub fn between(subject: QueryNode, lower: QueryNode, upper: QueryNode) -> Self {
        QueryNode::Between {
            subject: Box::new(subject),
            lower: Box::new(lower),
            upper: Box::new(upper),
        }
    }

    pub fn subquery_count(inner: QueryNode) -> Self {
        QueryNode::SubqueryCount {
            inner: Box::new(inner),
        }
    }

    pub fn map_subscript(key_path: QueryNode, key: impl Into<Value>) -> Self {
        QueryNode::MapSubscript {
            key_path: Box::new(key_path),
            key: key.into(),
        }
    }

    pub fn geo_within(key_path: QueryNode, shape: QueryNode) -> Self {
        QueryNode::GeoWithin {
            key_path: Box::new(key_path),
            shape: Box::new(shape),
        }
    }

    /// This key path with the `ANY` quantifier set; other nodes are returned as is.
    pub fn quantified(&self) -> Self {
        match self {
            QueryNode::KeyPath { segments, options } => QueryNode::KeyPath {
                segments: segments.clone(),
                options: options.union(KeyPathOptions::QUANTIFIED),
            },
            other => other.clone(),
        }
    }

    /// True for a key path flagged as passing through a collection.
    pub fn is_collection_key_path(&self) -> bool {
        matches!(self, QueryNode::KeyPath { options, .. } if options.is_collection)
    }

    /// Extend this key path by one segment, merging `options` into its flags.
    pub fn append_key_path(&self, segment: &str, options: KeyPathOptions) -> Result<Self> {
        match self {
            QueryNode::KeyPath {
                segments,
                options: current,
            } => {
                let mut extended = segments.clone();
                extended.push(segment.to_string());
                Ok(QueryNode::KeyPath {
                    segments: extended,
                    options: current.union(options),
                })
            }
            other => Err(Error::NotAKeyPath {
                segment: segment.to_string(),
                expression: other.to_string(),
            }),
        }
    }

    /// Splice a collection aggregate into this key path.
    ///
    /// The token goes right after the collection segment (`dogs.@avg.age`) or
    /// at the end of a single-segment path (`scores.@max`). The aggregate
    /// settles quantification, so `requires_any` is dropped.
    pub fn append_aggregate(&self, aggregate: Aggregate) -> Result<Self> {
        match self {
            QueryNode::KeyPath { segments, options } if options.is_collection => {
                let mut spliced = segments.clone();
                if spliced.len() > 1 {
                    spliced.insert(1, aggregate.token().to_string());
                } else {
                    spliced.push(aggregate.token().to_string());
                }
                Ok(QueryNode::KeyPath {
                    segments: spliced,
                    options: KeyPathOptions {
                        is_collection: true,
                        requires_any: false,
                    },
                })
            }
            QueryNode::KeyPath { segments, .. } => Err(Error::AggregateWithoutCollection {
                aggregate: aggregate.token().trim_start_matches('@').to_string(),
                key_path: segments.join("."),
            }),
            other => Err(Error::NotAKeyPath {
                segment: aggregate.token().to_string(),
                expression: other.to_string(),
            }),
        }
    }
}

/// Reject a comparison whose operands are both collection key paths.
pub(crate) fn check_operands(op: Operator, lhs: &QueryNode, rhs: &QueryNode) -> Result<()> {
    match (lhs, rhs) {
        (
            QueryNode::KeyPath {
                segments: left,
                options: lo,
            },
            QueryNode::KeyPath {
                segments: right,
                options: ro,
            },
        ) if lo.is_collection && ro.is_collection => Err(Error::CollectionComparison {
            lhs: left.join("."),
            op: op.token().to_string(),
            rhs: right.join("."),
        }),
        _ => Ok(()),
    }
}
